/// Declared propagation policy for a transaction scope.
///
/// The policy decides how a scope behaves when the resource it is bound to is
/// already inside a transaction opened by an enclosing scope: join it, or
/// carve out an independent boundary with a savepoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionPolicy {
    /// Participate in the ambient transaction if one exists; otherwise start
    /// one.
    ///
    /// A nested `Required` scope joins the enclosing transaction and never
    /// creates an independent rollback boundary. Resolution belongs entirely
    /// to the scope that opened the transaction.
    #[default]
    Required,

    /// Always start an independent transactional boundary, using a savepoint
    /// when a transaction is already open.
    ///
    /// A failure inside a nested `RequiresNew` scope rolls back to its own
    /// savepoint only; work done by the enclosing transaction is untouched.
    RequiresNew,
}

impl TransactionPolicy {
    /// Whether a resource first used under this policy nests with savepoints.
    pub(crate) fn nests_with_savepoints(self) -> bool {
        matches!(self, TransactionPolicy::RequiresNew)
    }
}
