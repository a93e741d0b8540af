use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::sleep;

use super::{CompletionBackend, CompletionRequest};
use crate::error::RemoteServiceError;

const NAME: &str = "replay";

/// Answers every request with a fixed reply or a fixed failure.
///
/// Used to re-parse a saved model reply offline, and as the backend in tests.
#[derive(Debug)]
pub struct ReplayBackend {
    outcome: Result<String, RemoteServiceError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ReplayBackend {
    pub fn reply(text: impl Into<String>) -> Self {
        Self::with_outcome(Ok(text.into()))
    }

    pub fn failing(error: RemoteServiceError) -> Self {
        Self::with_outcome(Err(error))
    }

    fn with_outcome(outcome: Result<String, RemoteServiceError>) -> Self {
        Self {
            outcome,
            delay: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Wait this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of requests received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().ok().and_then(|last| last.clone())
    }
}

#[async_trait]
impl CompletionBackend for ReplayBackend {
    fn name(&self) -> &str {
        NAME
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, RemoteServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        self.outcome.clone()
    }
}
