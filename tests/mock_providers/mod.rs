//! In-process speech adapters with scripted behavior.
//!
//! A [`ScriptedAdapter`] answers from a queue of [`Reply`] values first and
//! from its fallback responder once the queue is empty. Every call is counted
//! and recorded so tests can assert on what the orchestrator sent.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;

use voicecast::core::tts::{
    BoxedAdapter, ProviderError, ProviderKind, ProviderResult, RawAudioClip, SpeechAdapter,
    VoiceCapabilities, VoiceConfig,
};

use crate::fixtures::{SAMPLE_RATE, constant, pcm_clip};

/// What one scripted call does.
#[derive(Debug, Clone)]
pub enum Reply {
    Audio(RawAudioClip),
    Fail(ProviderError),
    /// Never completes; only a timeout or cancellation ends the call
    Hang,
}

type Responder = Box<dyn Fn(&str) -> Reply + Send + Sync>;
type DelayFn = Box<dyn Fn(&str) -> Duration + Send + Sync>;

fn accept_any_voice(voice: &str) -> Option<String> {
    Some(voice.to_string())
}

pub struct ScriptedAdapter {
    kind: ProviderKind,
    max_voices: usize,
    queue: Mutex<VecDeque<Reply>>,
    fallback: Responder,
    delay: Option<DelayFn>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, VoiceConfig)>>,
}

impl ScriptedAdapter {
    /// Single-voice adapter that returns 100 samples of silence at 24 kHz.
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            max_voices: 1,
            queue: Mutex::new(VecDeque::new()),
            fallback: Box::new(|_| Reply::Audio(pcm_clip(&constant(100, 0), SAMPLE_RATE))),
            delay: None,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn multi_voice(mut self) -> Self {
        self.max_voices = 2;
        self
    }

    /// Queue a reply for the next unanswered call.
    pub fn then(self, reply: Reply) -> Self {
        self.queue.lock().push_back(reply);
        self
    }

    pub fn otherwise(mut self, responder: impl Fn(&str) -> Reply + Send + Sync + 'static) -> Self {
        self.fallback = Box::new(responder);
        self
    }

    pub fn with_delay(mut self, delay: impl Fn(&str) -> Duration + Send + Sync + 'static) -> Self {
        self.delay = Some(Box::new(delay));
        self
    }

    pub fn always_failing(kind: ProviderKind, error: ProviderError) -> Self {
        Self::new(kind).otherwise(move |_| Reply::Fail(error.clone()))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(String, VoiceConfig)> {
        self.requests.lock().clone()
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

/// Coerce a shared scripted adapter into the orchestrator's handle type.
pub fn boxed(adapter: &Arc<ScriptedAdapter>) -> BoxedAdapter {
    adapter.clone()
}

#[async_trait]
impl SpeechAdapter for ScriptedAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn voice_capabilities(&self) -> VoiceCapabilities {
        VoiceCapabilities {
            max_voices: self.max_voices,
            default_voice: "default",
            resolve: accept_any_voice,
        }
    }

    async fn synthesize(&self, text: &str, voice: &VoiceConfig) -> ProviderResult<RawAudioClip> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push((text.to_string(), voice.clone()));

        let reply = self
            .queue
            .lock()
            .pop_front()
            .unwrap_or_else(|| (self.fallback)(text));

        if let Some(delay) = &self.delay {
            tokio::time::sleep(delay(text)).await;
        }

        match reply {
            Reply::Audio(clip) => Ok(clip),
            Reply::Fail(error) => Err(error),
            Reply::Hang => std::future::pending::<ProviderResult<RawAudioClip>>().await,
        }
    }

    fn get_provider_info(&self) -> serde_json::Value {
        json!({
            "provider": self.kind.as_str(),
            "scripted": true,
            "max_voices_per_call": self.max_voices,
        })
    }
}
