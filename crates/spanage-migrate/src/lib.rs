//! spanage-migrate - Version ledger and migration driver
//!
//! The driver is written against the `spanage-db` boundary traits, so it runs
//! unchanged over the DuckDB backend or any other implementation.

pub mod driver;
pub mod error;
pub mod ledger;

#[cfg(test)]
pub(crate) mod test_support;

pub use driver::{MigrationOutcome, Migrator};
pub use error::{MigrateError, MigrateResult};
pub use ledger::{Ledger, LedgerEntry};
