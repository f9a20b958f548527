// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use reqwest::redirect::Policy;

use crate::error::Result;
use crate::models::HttpConfig;

/// Create a configured asynchronous HTTP client.
///
/// Redirects are never followed automatically; the resolver walks every hop itself.
pub fn create_client(config: &HttpConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .redirect(Policy::none())
        .build()?;
    Ok(client)
}

/// Politeness throttle between successive remote calls.
#[derive(Debug, Clone, Copy)]
pub struct Throttle {
    delay: Duration,
    armed: bool,
}

impl Throttle {
    pub fn new(config: &HttpConfig) -> Self {
        Self::from_millis(config.request_delay_ms)
    }

    pub fn from_millis(millis: u64) -> Self {
        Self {
            delay: Duration::from_millis(millis),
            armed: false,
        }
    }

    /// Wait before a call; the first call of a run goes out immediately.
    pub async fn wait(&mut self) {
        if self.armed && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.armed = true;
    }
}
