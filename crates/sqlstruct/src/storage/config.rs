//! Storage configuration.

use crate::mapper::Mapper;
use crate::qb::PlaceholderFormat;
use crate::quote::Quoter;
use std::sync::Arc;

/// Configuration for [`Storage`](super::Storage).
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Mapper used for statement construction. Defaults to [`Mapper::global`].
    pub mapper: Arc<Mapper>,
    /// Placeholder format of built statements. Defaults to `$1`.
    pub format: PlaceholderFormat,
    /// Formatter of table and column names. `None` leaves them unquoted.
    pub quoter: Option<Quoter>,
    /// Emit debug events on transaction begin, commit and rollback.
    pub trace_tx: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mapper: Mapper::global(),
            format: PlaceholderFormat::Dollar,
            quoter: None,
            trace_tx: true,
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapper(mut self, mapper: Arc<Mapper>) -> Self {
        self.mapper = mapper;
        self
    }

    /// Set the placeholder format, e.g. [`PlaceholderFormat::Question`] for MySQL.
    pub fn with_format(mut self, format: PlaceholderFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_quoter(mut self, quoter: Quoter) -> Self {
        self.quoter = Some(quoter);
        self
    }

    pub fn with_trace_tx(mut self, enabled: bool) -> Self {
        self.trace_tx = enabled;
        self
    }
}
