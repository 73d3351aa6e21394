use std::future::Future;
use std::time::Duration;

use pollcheck_client::ApiError;

/// Upper bound on any single Registry call made by the core.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(20);

/// Run `call`, mapping an elapsed deadline onto the network-error path.
pub(crate) async fn within<T, F>(limit: Duration, call: F) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ApiError::Network(format!(
            "no response within {}s",
            limit.as_secs_f32()
        ))),
    }
}
