//! Scripted [`LanguageModel`] for tests.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::llm::openai::{LanguageModel, LlmRequest};
use crate::{Error, Result};

#[derive(Debug, Clone)]
pub(crate) enum MockResponse {
    /// Return this text.
    Text(String),
    /// Fail as if the remote returned 429.
    RateLimited,
    /// Fail with an arbitrary upstream error.
    Fail(String),
}

type Responder = dyn Fn(&LlmRequest) -> Result<String> + Send + Sync;

/// Queue-driven mock: each call pops the next scripted response; when the
/// queue runs dry the fallback response (if any) repeats forever. A
/// responder closure, when set, takes precedence over the queue so tests
/// can answer based on the request itself.
#[derive(Default)]
pub(crate) struct MockModel {
    responses: Mutex<VecDeque<MockResponse>>,
    fallback: Mutex<Option<MockResponse>>,
    responder: Option<Box<Responder>>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
    /// Simulated latency per call; lets paused-clock tests overlap work.
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    high_water: AtomicUsize,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&LlmRequest) -> Result<String> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    pub fn push(&self, response: MockResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push(MockResponse::Text(text.into()));
    }

    pub fn set_fallback(&self, response: MockResponse) {
        *self.fallback.lock().unwrap() = Some(response);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next_response(&self) -> MockResponse {
        if let Some(response) = self.responses.lock().unwrap().pop_front() {
            return response;
        }
        self.fallback
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(MockResponse::Fail("mock: no scripted response".into()))
    }
}

impl LanguageModel for MockModel {
    fn generate<'a>(
        &'a self,
        request: &'a LlmRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(request.prompt.clone());

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.high_water.fetch_max(now, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if let Some(responder) = &self.responder {
                return responder(request);
            }

            match self.next_response() {
                MockResponse::Text(text) => Ok(text),
                MockResponse::RateLimited => {
                    Err(Error::RateLimited("HTTP 429: mock rate limit".into()))
                }
                MockResponse::Fail(message) => Err(Error::Upstream(message)),
            }
        })
    }
}
