use std::future::Future;
use std::pin::Pin;

use log::debug;

use crate::error::{Error, Result};
use crate::policy::TransactionPolicy;

/// Boxed future returned by [`TransactionalConnection`] operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The narrow contract a connection must satisfy to be driven by a
/// [`TransactionalResource`].
///
/// Implementations translate each call into the driver's transaction
/// primitives and fail with a connection-level error when the store rejects
/// the operation. Savepoint names are generated by the resource adapter, one
/// per nesting level; implementations may interpolate them into raw SQL.
///
/// An implementation for [`sqlx::SqliteConnection`] ships with the crate (see
/// the [`sqlite`](crate::sqlite) module).
pub trait TransactionalConnection: Send {
    /// Opens a top-level transaction.
    fn begin_transaction(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Commits the open top-level transaction.
    fn commit_transaction(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Rolls back the open top-level transaction.
    fn rollback_transaction(&mut self) -> BoxFuture<'_, Result<()>>;

    /// Creates a named savepoint inside the open transaction.
    fn create_savepoint<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Releases a named savepoint, folding its work into the enclosing
    /// transaction.
    fn release_savepoint<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<()>>;

    /// Rolls back all work done since the named savepoint was created.
    fn rollback_to_savepoint<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<()>>;
}

/// State-tracking adapter binding one physical connection to a stack of
/// transactional boundaries.
///
/// The resource translates scope-level begin/commit/rollback requests into
/// the connection's primitives while maintaining the nesting depth. How a
/// nested `begin` materializes depends on the savepoint nesting mode, fixed
/// by the first [`TransactionScope`](crate::TransactionScope) constructed
/// against the resource while no transaction is open:
///
/// - savepoints enabled (`RequiresNew`): each nested begin creates a
///   savepoint, an independently resolvable boundary;
/// - savepoints disabled (`Required`): nested begins are absorbed into the
///   enclosing transaction: depth still increments for bookkeeping, but no
///   new boundary exists at the driver level.
///
/// A connection's transactional state is not safe for concurrent use, so the
/// resource takes the connection by value and hands out `&mut` access only;
/// scopes and their units of work borrow it sequentially.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::{Connection, SqliteConnection};
/// use sqlx_transaction_scope::TransactionalResource;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let conn = SqliteConnection::connect("sqlite:todo.db").await?;
/// let mut resource = TransactionalResource::new(conn);
///
/// resource.begin().await?;
/// sqlx::query("DELETE FROM todo")
///     .execute(resource.connection())
///     .await?;
/// resource.commit().await?;
/// # Ok(())
/// # }
/// ```
pub struct TransactionalResource<C> {
    conn: C,
    depth: usize,
    nest_with_savepoints: bool,
}

impl<C: TransactionalConnection> TransactionalResource<C> {
    /// Wraps a connection. No transaction is opened; depth starts at zero.
    pub fn new(conn: C) -> Self {
        Self {
            conn,
            depth: 0,
            nest_with_savepoints: false,
        }
    }

    /// Current nesting depth; zero means no transaction is open.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether any transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.depth > 0
    }

    /// Whether nested begins create savepoints.
    pub fn nests_with_savepoints(&self) -> bool {
        self.nest_with_savepoints
    }

    /// Sets the savepoint nesting mode.
    ///
    /// Scope construction normally does this for you from the declared
    /// policy; call it directly only when driving the resource by hand.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyInTransaction`] if a transaction is open. The
    /// mode is fixed for the lifetime of the transaction it governs; changing
    /// it midway is a programming error, not a recoverable condition.
    pub fn set_nest_with_savepoints(&mut self, enabled: bool) -> Result<()> {
        if self.in_transaction() {
            return Err(Error::AlreadyInTransaction);
        }
        self.nest_with_savepoints = enabled;
        Ok(())
    }

    /// Applies a scope's policy to the nesting mode, unless a transaction is
    /// already open; the scope is then joining or savepointing into a
    /// transaction whose mode was fixed by the scope that opened it.
    pub(crate) fn configure_for(&mut self, policy: TransactionPolicy) {
        if !self.in_transaction() {
            self.nest_with_savepoints = policy.nests_with_savepoints();
        }
    }

    /// Mutable access to the underlying connection, for executing statements
    /// inside (or outside) a transaction.
    pub fn connection(&mut self) -> &mut C {
        &mut self.conn
    }

    /// Consumes the resource and returns the underlying connection.
    ///
    /// Any still-open transaction is left to the driver; SQLite discards an
    /// open transaction when the connection closes.
    pub fn into_inner(self) -> C {
        self.conn
    }

    /// Requests a new transactional boundary.
    ///
    /// At depth zero this opens a top-level transaction. Inside a
    /// transaction it creates a savepoint when savepoint nesting is enabled,
    /// and is otherwise absorbed: depth increments, the driver is not
    /// touched. Absorption is what lets joined scopes nest without creating
    /// rollback-independent boundaries.
    pub async fn begin(&mut self) -> Result<()> {
        let level = self.depth + 1;
        if self.depth == 0 {
            self.conn.begin_transaction().await?;
            debug!("begin: opened top-level transaction (depth 0 -> 1)");
        } else if self.nest_with_savepoints {
            let name = Self::savepoint_name(level);
            self.conn.create_savepoint(&name).await?;
            debug!("begin: created savepoint {name} (depth {} -> {level})", self.depth);
        } else {
            debug!("begin: absorbed by enclosing transaction (depth {} -> {level})", self.depth);
        }
        self.depth = level;
        Ok(())
    }

    /// Resolves the most recently opened boundary as successful.
    ///
    /// Releases the innermost savepoint if one is active; otherwise commits
    /// the top-level transaction. Absorbed bookkeeping levels own no boundary
    /// of their own, so committing past them commits the transaction itself
    /// and depth returns to zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInTransaction`] at depth zero. A driver-level
    /// commit failure is propagated as-is; depth is left untouched and no
    /// further resolution is attempted.
    pub async fn commit(&mut self) -> Result<()> {
        match self.depth {
            0 => Err(Error::NotInTransaction),
            level if level > 1 && self.nest_with_savepoints => {
                let name = Self::savepoint_name(level);
                self.conn.release_savepoint(&name).await?;
                debug!("commit: released savepoint {name} (depth {level} -> {})", level - 1);
                self.depth = level - 1;
                Ok(())
            }
            level => {
                self.conn.commit_transaction().await?;
                debug!("commit: top-level transaction committed (depth {level} -> 0)");
                self.depth = 0;
                Ok(())
            }
        }
    }

    /// Resolves the most recently opened boundary as failed.
    ///
    /// Rolls back to the innermost savepoint if one is active; otherwise
    /// rolls back the entire top-level transaction and depth returns to
    /// zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInTransaction`] at depth zero; driver failures
    /// propagate as for [`commit`](Self::commit).
    pub async fn rollback(&mut self) -> Result<()> {
        match self.depth {
            0 => Err(Error::NotInTransaction),
            level if level > 1 && self.nest_with_savepoints => {
                let name = Self::savepoint_name(level);
                self.conn.rollback_to_savepoint(&name).await?;
                debug!("rollback: rolled back to savepoint {name} (depth {level} -> {})", level - 1);
                self.depth = level - 1;
                Ok(())
            }
            level => {
                self.conn.rollback_transaction().await?;
                debug!("rollback: top-level transaction rolled back (depth {level} -> 0)");
                self.depth = 0;
                Ok(())
            }
        }
    }

    fn savepoint_name(level: usize) -> String {
        format!("nested_tx_{level}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::{Connection, SqliteConnection};

    async fn todo_resource() -> TransactionalResource<SqliteConnection> {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
        sqlx::query("CREATE TABLE todo (id INTEGER PRIMARY KEY, todo TEXT NOT NULL)")
            .execute(&mut conn)
            .await
            .unwrap();
        TransactionalResource::new(conn)
    }

    async fn todo_text(
        res: &mut TransactionalResource<SqliteConnection>,
        id: i64,
    ) -> Option<String> {
        sqlx::query_scalar("SELECT todo FROM todo WHERE id = ?")
            .bind(id)
            .fetch_optional(res.connection())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn fresh_resource_is_outside_any_transaction() {
        let res = todo_resource().await;
        assert_eq!(res.depth(), 0);
        assert!(!res.in_transaction());
        assert!(!res.nests_with_savepoints());
    }

    #[tokio::test]
    async fn begin_and_commit_balance_depth() {
        let mut res = todo_resource().await;

        res.begin().await.unwrap();
        assert_eq!(res.depth(), 1);
        assert!(res.in_transaction());

        res.commit().await.unwrap();
        assert_eq!(res.depth(), 0);
        assert!(!res.in_transaction());
    }

    #[tokio::test]
    async fn depth_is_stable_across_repeated_reads() {
        let mut res = todo_resource().await;
        res.begin().await.unwrap();

        assert_eq!(res.depth(), 1);
        assert_eq!(res.depth(), 1);
        assert_eq!(res.depth(), 1);

        res.rollback().await.unwrap();
        assert_eq!(res.depth(), 0);
    }

    #[tokio::test]
    async fn resolving_without_a_transaction_is_an_error() {
        let mut res = todo_resource().await;

        assert!(matches!(res.commit().await, Err(Error::NotInTransaction)));
        assert!(matches!(res.rollback().await, Err(Error::NotInTransaction)));
        assert_eq!(res.depth(), 0);
    }

    #[tokio::test]
    async fn nesting_mode_is_locked_while_a_transaction_is_open() {
        let mut res = todo_resource().await;
        res.set_nest_with_savepoints(true).unwrap();
        res.begin().await.unwrap();

        assert!(matches!(
            res.set_nest_with_savepoints(false),
            Err(Error::AlreadyInTransaction)
        ));
        assert!(res.nests_with_savepoints());

        res.rollback().await.unwrap();
        res.set_nest_with_savepoints(false).unwrap();
    }

    #[tokio::test]
    async fn savepoint_rollback_keeps_enclosing_writes() {
        let mut res = todo_resource().await;
        res.set_nest_with_savepoints(true).unwrap();

        res.begin().await.unwrap();
        sqlx::query("INSERT INTO todo (id, todo) VALUES (1, 'outer')")
            .execute(res.connection())
            .await
            .unwrap();

        res.begin().await.unwrap();
        assert_eq!(res.depth(), 2);
        sqlx::query("INSERT INTO todo (id, todo) VALUES (2, 'inner')")
            .execute(res.connection())
            .await
            .unwrap();

        res.rollback().await.unwrap();
        assert_eq!(res.depth(), 1);
        assert_eq!(todo_text(&mut res, 1).await.as_deref(), Some("outer"));
        assert!(todo_text(&mut res, 2).await.is_none());

        res.commit().await.unwrap();
        assert_eq!(res.depth(), 0);
        assert_eq!(todo_text(&mut res, 1).await.as_deref(), Some("outer"));
    }

    #[tokio::test]
    async fn absorbed_levels_resolve_with_the_top_level_transaction() {
        let mut res = todo_resource().await;

        res.begin().await.unwrap();
        res.begin().await.unwrap();
        assert_eq!(res.depth(), 2);

        sqlx::query("INSERT INTO todo (id, todo) VALUES (1, 'joined')")
            .execute(res.connection())
            .await
            .unwrap();

        // The absorbed level owns no boundary: committing here commits the
        // transaction itself.
        res.commit().await.unwrap();
        assert_eq!(res.depth(), 0);

        res.begin().await.unwrap();
        res.rollback().await.unwrap();
        assert_eq!(todo_text(&mut res, 1).await.as_deref(), Some("joined"));
    }

    #[tokio::test]
    async fn absorbed_levels_roll_back_with_the_top_level_transaction() {
        let mut res = todo_resource().await;

        res.begin().await.unwrap();
        res.begin().await.unwrap();
        sqlx::query("INSERT INTO todo (id, todo) VALUES (1, 'joined')")
            .execute(res.connection())
            .await
            .unwrap();

        res.rollback().await.unwrap();
        assert_eq!(res.depth(), 0);
        assert!(todo_text(&mut res, 1).await.is_none());
    }
}
