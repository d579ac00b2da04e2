//! The statement executor seam.
//!
//! [`Executor`] is the only I/O primitive the persister uses: run one
//! parameterized statement and report how many rows it touched. Connections,
//! transactions and pools all sit behind it, supplied by the caller's unit of
//! work.

use crate::error::Error;
use crate::value::Value;
use asupersync::{Cx, Outcome};
use std::sync::Arc;

/// Executes parameterized statements against the active transaction.
///
/// Implementations must not retry or swallow failures; whatever storage error
/// the backend raises is the error callers observe. Cancellation and timeouts
/// are handled here (via `Cx`), never above.
///
/// # Example
///
/// ```rust,ignore
/// let affected = executor
///     .execute(&cx, "DELETE FROM \"hero_powers\" WHERE \"hero_id\" = $1", &[Value::BigInt(1)])
///     .await;
/// ```
pub trait Executor: Send + Sync {
    /// Execute a statement (INSERT, UPDATE, DELETE) and return rows affected.
    fn execute(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send;
}

impl<E: Executor> Executor for &E {
    fn execute(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        (**self).execute(cx, sql, params)
    }
}

impl<E: Executor> Executor for Arc<E> {
    fn execute(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        (**self).execute(cx, sql, params)
    }
}

impl<E: Executor> Executor for Box<E> {
    fn execute(
        &self,
        cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        (**self).execute(cx, sql, params)
    }
}
