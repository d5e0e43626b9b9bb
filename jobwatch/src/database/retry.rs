//! Retry for writes that lose the SQLite write lock.
//!
//! The busy timeout covers most contention. When a second process holds the
//! lock longer than that, the write is retried a few times with a jittered
//! doubling delay before the error is surfaced as a storage fault.

use rand::random;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

use crate::{Error, Result};

const MAX_RETRIES: u32 = 4;
const BASE_DELAY_MS: u64 = 25;

/// Primary result codes `SQLITE_BUSY` and `SQLITE_LOCKED`.
const SQLITE_BUSY: i64 = 5;
const SQLITE_LOCKED: i64 = 6;

/// Whether `err` is SQLite reporting lock contention.
///
/// Extended codes (`SQLITE_BUSY_SNAPSHOT` and friends) carry the primary code
/// in their low byte.
fn is_lock_contention(err: &Error) -> bool {
    let Error::DatabaseSqlx(sqlx_err) = err else {
        return false;
    };
    sqlx_err
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .and_then(|code| code.parse::<i64>().ok())
        .is_some_and(|code| matches!(code & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
}

fn backoff(attempt: u32) -> Duration {
    let jitter_ms = random::<u64>() % BASE_DELAY_MS;
    Duration::from_millis((BASE_DELAY_MS << attempt) + jitter_ms)
}

/// Run `op`, retrying it while SQLite reports lock contention.
pub async fn retry_on_sqlite_busy<T, F, Fut>(op_name: &'static str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(err) if attempt < MAX_RETRIES && is_lock_contention(&err) => {
                let delay = backoff(attempt);
                attempt += 1;
                debug!(op = op_name, attempt, ?delay, "SQLite locked, retrying");
                tokio::time::sleep(delay).await;
            }
            result => return result,
        }
    }
}
