//! Deterministic stand-in provider.
//!
//! Simulated completions live behind the same [`CompletionProvider`] trait
//! as the real adapters, so tests can script replies (or outages) without a
//! network.

use std::collections::VecDeque;
use std::sync::Mutex;

use mn_domain::error::{Error, Result};

use crate::traits::{CompletionProvider, CompletionRequest, CompletionResponse};

const PROVIDER_ID: &str = "scripted";

/// A provider that replays canned replies and records every prompt it sees.
///
/// When the reply queue runs dry it echoes a fixed acknowledgement, so tests
/// that don't care about the text never run out. `ScriptedProvider::unavailable()`
/// builds one that fails every call the way a dead upstream would.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    fail: bool,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Queue replies to hand out in order.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Self::new();
        {
            let mut q = provider.replies.lock().expect("replies lock");
            q.extend(replies.into_iter().map(Into::into));
        }
        provider
    }

    /// A provider whose every call fails with `Error::Upstream`.
    pub fn unavailable() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Every prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, req: CompletionRequest) -> Result<CompletionResponse> {
        if self.fail {
            return Err(Error::Upstream {
                provider: PROVIDER_ID.into(),
                message: "scripted outage".into(),
            });
        }

        self.prompts.lock().expect("prompts lock").push(req.prompt);

        let text = self
            .replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| "Understood.".to_owned());

        Ok(CompletionResponse {
            text,
            model: PROVIDER_ID.into(),
        })
    }

    fn provider_id(&self) -> &str {
        PROVIDER_ID
    }
}
