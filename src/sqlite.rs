//! [`TransactionalConnection`] implementation for SQLite.
//!
//! Transaction control is issued as raw statements so the resource adapter
//! stays the single authority over nesting depth. Savepoint identifiers are
//! generated by the adapter, never taken from user input.

use sqlx::SqliteConnection;

use crate::error::Result;
use crate::resource::{BoxFuture, TransactionalConnection};

impl TransactionalConnection for SqliteConnection {
    fn begin_transaction(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            sqlx::query("BEGIN").execute(&mut *self).await?;
            Ok(())
        })
    }

    fn commit_transaction(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            sqlx::query("COMMIT").execute(&mut *self).await?;
            Ok(())
        })
    }

    fn rollback_transaction(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            sqlx::query("ROLLBACK").execute(&mut *self).await?;
            Ok(())
        })
    }

    fn create_savepoint<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let sql = format!("SAVEPOINT {name}");
            sqlx::query(&sql).execute(&mut *self).await?;
            Ok(())
        })
    }

    fn release_savepoint<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let sql = format!("RELEASE SAVEPOINT {name}");
            sqlx::query(&sql).execute(&mut *self).await?;
            Ok(())
        })
    }

    fn rollback_to_savepoint<'a>(&'a mut self, name: &'a str) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let sql = format!("ROLLBACK TO SAVEPOINT {name}");
            sqlx::query(&sql).execute(&mut *self).await?;
            Ok(())
        })
    }
}
