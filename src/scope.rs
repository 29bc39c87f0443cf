use std::future::Future;
use std::pin::Pin;

use log::{debug, warn};

use crate::error::Error;
use crate::policy::TransactionPolicy;
use crate::resource::{TransactionalConnection, TransactionalResource};

/// One declared transactional boundary attempt.
///
/// A scope binds a [`TransactionalResource`] to a [`TransactionPolicy`] and
/// runs a single unit of work under it. Whether the scope *owns* the boundary
/// it enters (and must therefore commit or roll it back) is decided from the
/// nesting depth at run time, once, before the work starts:
///
/// - `RequiresNew` scopes always own a boundary (a top-level transaction at
///   depth zero, a savepoint inside an open transaction);
/// - `Required` scopes own a boundary only when no transaction is open;
///   otherwise they join the ambient transaction and resolve nothing,
///   delegating entirely to the scope that opened it.
///
/// A scope is consumed by [`run_into`](Self::run_into); construct a new one
/// for each unit of work. Nesting arbitrarily deep is done by constructing
/// further scopes against the resource handle passed into the work closure.
pub struct TransactionScope<'r, C: TransactionalConnection> {
    resource: &'r mut TransactionalResource<C>,
    policy: TransactionPolicy,
}

impl<'r, C: TransactionalConnection> TransactionScope<'r, C> {
    /// Binds a scope to `resource` under `policy`.
    ///
    /// When no transaction is open, this also fixes the resource's savepoint
    /// nesting mode from the policy: the first scope to touch an idle
    /// resource decides how everything nested under it will nest.
    pub fn new(resource: &'r mut TransactionalResource<C>, policy: TransactionPolicy) -> Self {
        resource.configure_for(policy);
        Self { resource, policy }
    }

    /// Runs `work` under this scope and resolves the boundary the scope
    /// itself opened.
    ///
    /// On normal return an owning scope commits; on failure it rolls back
    /// and re-propagates the failure unchanged. A joining scope performs no
    /// resolution on either path: the ambient transaction must remain open
    /// for the enclosing scope to resolve later. Either way the work's
    /// result passes through untouched.
    ///
    /// Note the consequence of join semantics: a failure inside a nested
    /// `Required` scope that is caught by caller code before it reaches the
    /// owning scope triggers **no rollback at all**, and the writes made
    /// before the failure commit together with the outer transaction. Use
    /// `RequiresNew` where a nested unit of work needs its own rollback
    /// boundary.
    ///
    /// # Errors
    ///
    /// Any failure of the work is propagated as-is after resolution. A
    /// failing commit is propagated as the call's failure; a rollback
    /// failure while unwinding a work error is logged and the original
    /// error is propagated.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use sqlx::{Connection, SqliteConnection};
    /// use sqlx_transaction_scope::{
    ///     Error, TransactionPolicy, TransactionScope, TransactionalResource,
    /// };
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let conn = SqliteConnection::connect("sqlite:todo.db").await?;
    /// let mut resource = TransactionalResource::new(conn);
    ///
    /// let scope = TransactionScope::new(&mut resource, TransactionPolicy::Required);
    /// scope
    ///     .run_into(|res| {
    ///         Box::pin(async move {
    ///             sqlx::query("INSERT INTO todo (id, todo) VALUES (?, ?)")
    ///                 .bind(999)
    ///                 .bind("water the plants")
    ///                 .execute(res.connection())
    ///                 .await?;
    ///             Ok::<_, Error>(())
    ///         })
    ///     })
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_into<F, T, E>(self, work: F) -> Result<T, E>
    where
        F: for<'a> FnOnce(
            &'a mut TransactionalResource<C>,
        ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>,
        T: Send,
        E: From<Error>,
    {
        let Self { resource, policy } = self;

        let depth_before = resource.depth();
        let owning = policy == TransactionPolicy::RequiresNew || depth_before == 0;
        debug!("scope({policy:?}): owning={owning}, depth_before={depth_before}");

        resource.begin().await.map_err(E::from)?;

        match work(&mut *resource).await {
            Ok(value) => {
                if owning {
                    resource.commit().await.map_err(E::from)?;
                }
                Ok(value)
            }
            Err(err) => {
                if owning {
                    if let Err(rollback_err) = resource.rollback().await {
                        warn!("rollback after failed work also failed: {rollback_err}");
                    }
                }
                Err(err)
            }
        }
    }
}

/// Runs `work` in a [`TransactionScope`] over `resource` with `policy`.
///
/// One-call convenience for the construct-then-run sequence; see
/// [`TransactionScope::run_into`] for the semantics.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::{Connection, SqliteConnection};
/// use sqlx_transaction_scope::{with_transaction, Error, TransactionPolicy, TransactionalResource};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let conn = SqliteConnection::connect("sqlite:todo.db").await?;
/// let mut resource = TransactionalResource::new(conn);
///
/// let count: i64 = with_transaction(&mut resource, TransactionPolicy::Required, |res| {
///     Box::pin(async move {
///         let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM todo")
///             .fetch_one(res.connection())
///             .await?;
///         Ok::<_, Error>(count)
///     })
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_transaction<C, F, T, E>(
    resource: &mut TransactionalResource<C>,
    policy: TransactionPolicy,
    work: F,
) -> Result<T, E>
where
    C: TransactionalConnection,
    F: for<'a> FnOnce(
        &'a mut TransactionalResource<C>,
    ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>,
    T: Send,
    E: From<Error>,
{
    TransactionScope::new(resource, policy).run_into(work).await
}
