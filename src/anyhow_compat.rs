use std::future::Future;
use std::pin::Pin;

use crate::policy::TransactionPolicy;
use crate::resource::{TransactionalConnection, TransactionalResource};
use crate::scope::TransactionScope;

/// Runs `work` in a transaction scope, using `anyhow::Error` for error
/// handling.
///
/// Convenience wrapper around [`with_transaction`](crate::with_transaction)
/// for closures that return `anyhow::Result<T>`: crate errors raised while
/// opening or resolving the boundary are converted into `anyhow::Error`, and
/// the work's own failures pass through unchanged.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::{Connection, SqliteConnection};
/// use sqlx_transaction_scope::{with_transaction_anyhow, TransactionPolicy, TransactionalResource};
///
/// # async fn example() -> anyhow::Result<()> {
/// let conn = SqliteConnection::connect("sqlite:todo.db").await?;
/// let mut resource = TransactionalResource::new(conn);
///
/// with_transaction_anyhow(&mut resource, TransactionPolicy::Required, |res| {
///     Box::pin(async move {
///         sqlx::query("INSERT INTO todo (id, todo) VALUES (?, ?)")
///             .bind(999)
///             .bind("call the bank")
///             .execute(res.connection())
///             .await?;
///         Ok(())
///     })
/// })
/// .await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_transaction_anyhow<C, F, T>(
    resource: &mut TransactionalResource<C>,
    policy: TransactionPolicy,
    work: F,
) -> anyhow::Result<T>
where
    C: TransactionalConnection,
    F: for<'a> FnOnce(
        &'a mut TransactionalResource<C>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>,
    T: Send,
{
    TransactionScope::new(resource, policy).run_into(work).await
}
