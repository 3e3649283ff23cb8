//! Grid-to-ledger conversion with fuzzy header detection

use bigdecimal::Zero;
use serde::{Deserialize, Serialize};

use crate::ingest::amount::{normalize_amount, parse_date};
use crate::types::*;

/// Header substrings used to locate each ledger column.
///
/// Hints are tried in order; an exact (case-insensitive) header match wins
/// over a substring match. An empty `date` list means the ledger has no date
/// column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnHints {
    pub account: Vec<String>,
    pub description: Vec<String>,
    pub amount: Vec<String>,
    #[serde(default)]
    pub date: Vec<String>,
}

impl Default for ColumnHints {
    fn default() -> Self {
        Self {
            account: vec!["konto".to_string(), "account".to_string()],
            description: vec![
                "tekst".to_string(),
                "beskrivelse".to_string(),
                "description".to_string(),
            ],
            amount: vec![
                "beløp".to_string(),
                "belop".to_string(),
                "amount".to_string(),
                "sum".to_string(),
            ],
            date: vec!["dato".to_string(), "date".to_string()],
        }
    }
}

impl ColumnHints {
    /// Hints for the three required columns, without a date column
    pub fn new(account: Vec<String>, description: Vec<String>, amount: Vec<String>) -> Self {
        Self {
            account,
            description,
            amount,
            date: Vec::new(),
        }
    }

    pub fn with_date(mut self, date: Vec<String>) -> Self {
        self.date = date;
        self
    }
}

/// Resolved column positions within a grid row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnIndices {
    pub account: usize,
    pub description: usize,
    pub amount: usize,
    pub date: Option<usize>,
}

/// Entries read from a grid plus diagnostics about what was dropped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub entries: Vec<LedgerEntry>,
    /// Data rows dropped for an empty account or a zero amount
    pub skipped_rows: usize,
    /// Index of the header row that was used
    pub header_row: usize,
}

/// Locate every ledger column in a header row
pub fn locate_columns(header: &[CellValue], hints: &ColumnHints) -> IngestResult<ColumnIndices> {
    let headers: Vec<String> = header.iter().map(|c| c.as_text().to_lowercase()).collect();

    let required = |field: ColumnField, field_hints: &[String]| {
        find_column(&headers, field_hints).ok_or_else(|| IngestError::MissingColumn {
            field,
            hints: field_hints.to_vec(),
        })
    };

    Ok(ColumnIndices {
        account: required(ColumnField::Account, hints.account.as_slice())?,
        description: required(ColumnField::Description, hints.description.as_slice())?,
        amount: required(ColumnField::Amount, hints.amount.as_slice())?,
        date: find_column(&headers, &hints.date),
    })
}

fn find_column(headers: &[String], hints: &[String]) -> Option<usize> {
    let hints: Vec<String> = hints
        .iter()
        .map(|h| h.trim().to_lowercase())
        .filter(|h| !h.is_empty())
        .collect();

    hints
        .iter()
        .find_map(|hint| headers.iter().position(|h| h.trim() == hint))
        .or_else(|| {
            hints
                .iter()
                .find_map(|hint| headers.iter().position(|h| h.contains(hint.as_str())))
        })
}

/// Convert a raw grid into ledger entries.
///
/// `start_row` is the header row; data starts on the row after it. Rows with
/// an empty account or an amount that normalizes to zero are dropped and
/// counted, never reported as errors.
pub fn tabular_to_entries(
    grid: &[Vec<CellValue>],
    hints: &ColumnHints,
    start_row: usize,
) -> IngestResult<IngestOutcome> {
    if grid.is_empty() {
        return Err(IngestError::EmptyGrid);
    }

    let header = grid.get(start_row).ok_or(IngestError::HeaderRowOutOfRange {
        row: start_row,
        rows: grid.len(),
    })?;
    let columns = locate_columns(header, hints)?;

    let empty = CellValue::Empty;
    let mut entries = Vec::new();
    let mut skipped_rows = 0;

    for row in &grid[start_row + 1..] {
        let cell = |idx: usize| row.get(idx).unwrap_or(&empty);

        let account = cell(columns.account).as_text();
        let amount = normalize_amount(cell(columns.amount));
        if account.is_empty() || amount.is_zero() {
            skipped_rows += 1;
            continue;
        }

        let description = cell(columns.description).as_text();
        let date = columns.date.and_then(|idx| parse_date(cell(idx)));

        entries.push(LedgerEntry {
            account,
            description,
            amount,
            date,
        });
    }

    tracing::debug!(
        entries = entries.len(),
        skipped_rows,
        header_row = start_row,
        "ledger grid normalized"
    );

    Ok(IngestOutcome {
        entries,
        skipped_rows,
        header_row: start_row,
    })
}
