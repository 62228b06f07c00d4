// src/checker/online.rs
// =============================================================================
// Answers one question before any link is checked: is the network reachable?
//
// A handful of well-known hosts are asked at the same time with a short
// timeout. Any HTTP answer at all (even an error status) means we are online.
// =============================================================================

use std::time::Duration;

use async_trait::async_trait;
use futures::future::select_ok;
use reqwest::Client;
use tracing::debug;

use super::ConnectivityProbe;
use crate::error::CheckError;

const DEFAULT_TARGETS: &[&str] = &[
    "https://www.google.com/",
    "https://www.cloudflare.com/",
    "https://www.wikipedia.org/",
];

#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    targets: Vec<String>,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new() -> Result<Self, CheckError> {
        let client = Client::builder()
            .build()
            .map_err(|e| CheckError::Client(e.to_string()))?;

        Ok(HttpProbe {
            client,
            targets: DEFAULT_TARGETS.iter().map(|target| target.to_string()).collect(),
            timeout: Duration::from_secs(3),
        })
    }

    pub fn with_targets(mut self, targets: Vec<String>) -> Self {
        self.targets = targets;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn is_online(&self) -> bool {
        if self.targets.is_empty() {
            return false;
        }

        let requests = self.targets.iter().map(|target| {
            Box::pin(self.client.head(target.as_str()).timeout(self.timeout).send())
        });

        match select_ok(requests).await {
            Ok((response, _pending)) => {
                debug!(url = %response.url(), "connectivity probe answered");
                true
            }
            Err(error) => {
                debug!(%error, "no connectivity probe target answered");
                false
            }
        }
    }
}
