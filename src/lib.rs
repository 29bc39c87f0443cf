//! # sqlx-transaction-scope
//!
//! Declarative, nestable transaction scoping for SQLx with `Required` /
//! `RequiresNew` propagation policies.
//!
//! ## Features
//!
//! - **Declarative Boundaries**: wrap a unit of work in a scope instead of
//!   hand-managing begin/commit/rollback
//! - **Propagation Policies**: `Required` joins an ambient transaction,
//!   `RequiresNew` always gets an independent boundary via savepoints
//! - **Arbitrary Nesting**: scopes nest to any depth against one resource,
//!   and depth always returns to its pre-scope value on the owning path
//! - **Transparent Failures**: the work's error is never wrapped, swallowed,
//!   or reinterpreted; the scope only picks commit or rollback
//! - **Runtime-Agnostic**: no async runtime dependency in the library itself
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sqlx = { version = "0.8", features = ["sqlite", "runtime-tokio"] }
//! sqlx-transaction-scope = "0.2"
//! ```
//!
//! ## Examples
//!
//! ### Basic Scope
//!
//! ```rust,no_run
//! use sqlx::{Connection, SqliteConnection};
//! use sqlx_transaction_scope::{with_transaction, Error, TransactionPolicy, TransactionalResource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let conn = SqliteConnection::connect("sqlite:todo.db").await?;
//! let mut resource = TransactionalResource::new(conn);
//!
//! with_transaction(&mut resource, TransactionPolicy::Required, |res| {
//!     Box::pin(async move {
//!         sqlx::query("INSERT INTO todo (id, todo) VALUES (?, ?)")
//!             .bind(999)
//!             .bind("write the report")
//!             .execute(res.connection())
//!             .await?;
//!         Ok::<_, Error>(())
//!     })
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```
//!
//! The scope commits when the closure returns `Ok` and rolls back when it
//! returns `Err`, propagating the error unchanged.
//!
//! ### Independent Nested Boundaries
//!
//! A `RequiresNew` scope nested inside an open transaction runs under a
//! savepoint. Its failure rolls back only its own writes:
//!
//! ```rust,no_run
//! use sqlx::{Connection, SqliteConnection};
//! use sqlx_transaction_scope::{Error, TransactionPolicy, TransactionScope, TransactionalResource};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let conn = SqliteConnection::connect("sqlite:todo.db").await?;
//! let mut resource = TransactionalResource::new(conn);
//!
//! TransactionScope::new(&mut resource, TransactionPolicy::RequiresNew)
//!     .run_into(|res| {
//!         Box::pin(async move {
//!             sqlx::query("INSERT INTO todo (id, todo) VALUES (999, 'kept')")
//!                 .execute(res.connection())
//!                 .await?;
//!
//!             let audit = TransactionScope::new(res, TransactionPolicy::RequiresNew)
//!                 .run_into(|res| {
//!                     Box::pin(async move {
//!                         sqlx::query("INSERT INTO audit (entry) VALUES ('todo 999 added')")
//!                             .execute(res.connection())
//!                             .await?;
//!                         Ok::<_, Error>(())
//!                     })
//!                 })
//!                 .await;
//!
//!             // If the audit insert failed, only the savepoint was rolled
//!             // back; row 999 still commits with this outer scope.
//!             if audit.is_err() {
//!                 println!("audit entry lost, todo kept");
//!             }
//!
//!             Ok::<_, Error>(())
//!         })
//!     })
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Joining an Ambient Transaction
//!
//! A nested `Required` scope joins the transaction its ancestor opened. It
//! owns no boundary and therefore resolves nothing: commit and rollback
//! belong to the owning scope alone. The flip side is worth reading twice: if
//! a joined scope's work fails and some caller catches that failure before it
//! reaches the owning scope, **nothing is rolled back** and the joined
//! scope's writes commit together with the outer transaction. `Required`
//! gives you join semantics, not partial rollback; reach for `RequiresNew`
//! when a nested unit of work needs its own boundary.
//!
//! ### Manual Resource Control
//!
//! The resource adapter can be driven directly when a scope is too coarse:
//!
//! ```rust,no_run
//! use sqlx::{Connection, SqliteConnection};
//! use sqlx_transaction_scope::TransactionalResource;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let conn = SqliteConnection::connect("sqlite:todo.db").await?;
//! let mut resource = TransactionalResource::new(conn);
//!
//! resource.begin().await?;
//! sqlx::query("DELETE FROM todo WHERE done = 1")
//!     .execute(resource.connection())
//!     .await?;
//! resource.commit().await?;
//! assert_eq!(resource.depth(), 0);
//! # Ok(())
//! # }
//! ```
//!
//! ## How It Works
//!
//! 1. **TransactionalResource** wraps one connection and tracks nesting
//!    depth. Its savepoint mode is fixed by the first scope that touches it
//!    while idle: `RequiresNew` turns nested begins into savepoints,
//!    `Required` absorbs them into the enclosing transaction.
//! 2. **TransactionScope** decides ownership once, from the policy and the
//!    depth at entry, then begins, runs the work, and resolves exactly the
//!    boundary it opened (or none, when it merely joined).
//! 3. **Connection contract**: any type implementing
//!    [`TransactionalConnection`] can sit under a resource; an
//!    implementation for `sqlx::SqliteConnection` is included.
//!
//! ## Limitations
//!
//! - Currently only ships a SQLite binding (other SQLx backends can be added
//!   by implementing [`TransactionalConnection`])
//! - Nested boundaries use savepoints; there are no distributed or two-phase
//!   transactions, no isolation-level configuration, and no retries
//! - One resource per connection, used from one logical thread of control at
//!   a time; `&mut` threading enforces this at compile time
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at your option.

pub mod error;
pub mod policy;
pub mod resource;
pub mod scope;
pub mod sqlite;

#[cfg(feature = "anyhow")]
pub mod anyhow_compat;

pub use error::{Error, Result};
pub use policy::TransactionPolicy;
pub use resource::{BoxFuture, TransactionalConnection, TransactionalResource};
pub use scope::{with_transaction, TransactionScope};

#[cfg(feature = "anyhow")]
pub use anyhow_compat::with_transaction_anyhow;

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::policy::TransactionPolicy;
    pub use crate::resource::{TransactionalConnection, TransactionalResource};
    pub use crate::scope::{with_transaction, TransactionScope};
}
