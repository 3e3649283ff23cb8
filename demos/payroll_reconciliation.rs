//! Payroll reconciliation walkthrough: grid ingestion, matching and rule learning

use payroll_recon_core::utils::validate_rule;
use payroll_recon_core::{
    classify_by_account_prefix, tabular_to_entries, CellValue, ColumnHints, MappingRule,
    ReconcileConfig, ReconciliationEngine, Targets,
};
use bigdecimal::BigDecimal;
use tracing_subscriber::EnvFilter;

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("📒 Payroll Recon Core - Reconciliation Example\n");

    // 1. Normalize a general-ledger export
    let grid = vec![
        vec![text("Hovedbok januar 2024")],
        vec![text("Dato"), text("Konto"), text("Tekst"), text("Beløp")],
        vec![text("31.01.2024"), text("5000"), text("Fastlønn januar"), text("600 000,00")],
        vec![text("31.01.2024"), text("5010"), text("Timelønn januar"), text("349 998,00")],
        vec![text("31.01.2024"), text("5020"), text("Faste tillegg"), text("30 000,00")],
        vec![text("31.01.2024"), text("5020"), text("Helgetillegg"), text("20 001,50")],
        vec![],
        vec![text("31.01.2024"), text("2940"), text("Feriepenger avsatt"), text("(122 400,00)")],
        vec![text("31.01.2024"), text("5090"), text("Styrehonorar"), CellValue::Number(75000.0)],
    ];

    let outcome = tabular_to_entries(&grid, &ColumnHints::default(), 1)?;
    println!(
        "🧾 Read {} ledger lines ({} rows skipped)",
        outcome.entries.len(),
        outcome.skipped_rows
    );

    let buckets = classify_by_account_prefix(&outcome.entries);
    println!(
        "  ✓ {} payroll expense lines, {} accrual lines\n",
        buckets.expense.len(),
        buckets.accrual.len()
    );

    // 2. Reconcile against reported totals
    let mut targets = Targets::new();
    targets.insert("fastlon".to_string(), BigDecimal::from(600000));
    targets.insert("timelon".to_string(), BigDecimal::from(350000));
    targets.insert("fasttillegg".to_string(), BigDecimal::from(50000));
    targets.insert("bonus".to_string(), BigDecimal::from(40000));

    let rules = vec![
        MappingRule::new("fastlon".to_string(), "5000".to_string()).with_weight(5),
        MappingRule::new("timelon".to_string(), "5010".to_string()),
        MappingRule::keyword("fasttillegg".to_string(), vec!["tillegg".to_string()]),
        MappingRule::new("bonus".to_string(), "509".to_string()),
    ];

    let engine = ReconciliationEngine::new(ReconcileConfig::default());
    let report = engine.reconcile(&outcome.entries, &targets, &rules);

    println!("🔍 Reconciliation results:");
    for (code, result) in &report.matches {
        match &result.exact {
            Some(entries) => {
                println!(
                    "  ✓ {}: {} line(s), difference {}",
                    code,
                    entries.len(),
                    result.difference().unwrap_or_default()
                );
            }
            None => {
                println!("  ✗ {}: no match within tolerance", code);
                for alt in &result.alternatives {
                    println!(
                        "      alternative: {} line(s) summing to {} (off by {})",
                        alt.entries.len(),
                        alt.sum,
                        alt.difference
                    );
                }
            }
        }
    }
    println!();

    // 3. Learn exclusive rules; storing them is up to the caller
    let learned = engine.generate_exclusive_rules(&report.matches);

    println!("🧠 Learned {} exclusive rule(s):", learned.len());
    for rule in &learned {
        validate_rule(rule)?;
        println!(
            "  ✓ {} → {} (regex: {})",
            rule.account,
            rule.code,
            rule.regex.as_deref().unwrap_or("-")
        );
    }

    println!("\n💾 Rules as JSON:\n{}", serde_json::to_string_pretty(&learned)?);

    Ok(())
}
