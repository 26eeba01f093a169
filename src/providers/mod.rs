pub mod google_finance;
pub mod yahoo_finance;

use std::time::Duration;

/// Shared request timeout; network calls must never block a run
/// indefinitely.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent("foliotrack/1.0")
        .connect_timeout(REQUEST_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
}
