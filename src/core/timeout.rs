//! Request-scoped timeouts around storage and hashing calls

use std::future::Future;
use std::time::Duration;

use crate::error::{Result, RustySessionsError};

/// Run a fallible future with an upper bound, mapping expiry to `Timeout`
pub async fn with_timeout<T, F>(limit: Duration, operation: &str, future: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            log::warn!("{} timed out after {:?}", operation, limit);
            Err(RustySessionsError::Timeout(operation.to_string()))
        }
    }
}
