// Test doubles for the checker and the connectivity probe.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{CheckerOptions, ConnectivityProbe, Outcome, UrlChecker};
use crate::error::CheckError;

/// Answers from a fixed table and counts how often each URL was asked for.
///
/// URLs missing from the table are alive at their own address.
#[derive(Debug, Default)]
pub struct FakeChecker {
    answers: HashMap<String, Result<Outcome, CheckError>>,
    delay: Duration,
    calls: Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl FakeChecker {
    pub fn new() -> Self {
        FakeChecker::default()
    }

    pub fn answer(mut self, url: &str, outcome: Outcome) -> Self {
        self.answers.insert(url.to_string(), Ok(outcome));
        self
    }

    pub fn fail(mut self, url: &str) -> Self {
        let error = CheckError::Request {
            url: url.to_string(),
            reason: "connection reset".to_string(),
        };
        self.answers.insert(url.to_string(), Err(error));
        self
    }

    /// Every check sleeps this long, so concurrent requests overlap.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UrlChecker for FakeChecker {
    async fn check(&self, url: &str, _options: &CheckerOptions) -> Result<Outcome, CheckError> {
        *self.calls.lock().unwrap().entry(url.to_string()).or_default() += 1;
        self.total.fetch_add(1, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.answers
            .get(url)
            .cloned()
            .unwrap_or_else(|| Ok(Outcome::alive(url)))
    }
}

#[derive(Debug)]
pub struct FakeProbe {
    pub online: bool,
    pub asked: AtomicUsize,
}

impl FakeProbe {
    pub fn new(online: bool) -> Self {
        FakeProbe {
            online,
            asked: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ConnectivityProbe for FakeProbe {
    async fn is_online(&self) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        self.online
    }
}
