//! Transaction context carrier.

use crate::error::{SqlError, SqlResult};
use std::fmt;
use std::sync::Arc;

/// Carries the transaction, if any, that storage calls should run in.
///
/// Cloning is cheap; clones share the same transaction handle.
pub struct Context<Tx> {
    tx: Option<Arc<Tx>>,
}

impl<Tx> Context<Tx> {
    /// A context without a transaction.
    pub fn background() -> Self {
        Self { tx: None }
    }

    /// A context carrying `tx`.
    pub fn with_tx(tx: Arc<Tx>) -> Self {
        Self { tx: Some(tx) }
    }

    /// The carried transaction.
    pub fn tx(&self) -> Option<&Arc<Tx>> {
        self.tx.as_ref()
    }

    pub fn in_tx(&self) -> bool {
        self.tx.is_some()
    }

    pub(crate) fn require_tx(&self) -> SqlResult<&Arc<Tx>> {
        self.tx.as_ref().ok_or(SqlError::NoRunningTx)
    }
}

impl<Tx> Clone for Context<Tx> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<Tx> Default for Context<Tx> {
    fn default() -> Self {
        Self::background()
    }
}

impl<Tx> fmt::Debug for Context<Tx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("in_tx", &self.in_tx())
            .finish()
    }
}
