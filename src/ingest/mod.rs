//! Ingestion module turning raw tabular ledgers into normalized entries

pub mod amount;
pub mod prefix;
pub mod tabular;

pub use amount::*;
pub use prefix::*;
pub use tabular::*;
