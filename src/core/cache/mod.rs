//! Content-keyed memoization of finished artifacts.
//!
//! Backed by a `moka` future cache: `try_get_with` runs one initializer per key
//! and parks concurrent callers for the same key on its result, which is what
//! coalesces duplicate in-flight requests. Failed initializations are not cached.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use xxhash_rust::xxh3::Xxh3;

use crate::core::orchestrator::AudioArtifact;
use crate::core::tts::ProviderKind;
use crate::core::voice::{SpeakerSegment, SpeakerVoiceMapping};
use crate::errors::SynthesisError;

pub const DEFAULT_CACHE_CAPACITY: u64 = 256;

/// Digest of everything that determines the produced audio.
///
/// Fields are length-prefixed so `("ab", "c")` and `("a", "bc")` differ.
pub fn cache_key(
    text: &str,
    segments: &[SpeakerSegment],
    voices: &SpeakerVoiceMapping,
    chain: &[ProviderKind],
) -> String {
    fn field(hasher: &mut Xxh3, bytes: &[u8]) {
        hasher.update(&(bytes.len() as u64).to_le_bytes());
        hasher.update(bytes);
    }

    let mut hasher = Xxh3::new();
    field(&mut hasher, text.as_bytes());

    hasher.update(&(segments.len() as u64).to_le_bytes());
    for segment in segments {
        field(&mut hasher, segment.speaker.as_bytes());
        field(&mut hasher, segment.text.as_bytes());
    }

    hasher.update(&(voices.len() as u64).to_le_bytes());
    for (speaker, voice) in voices.iter() {
        field(&mut hasher, speaker.as_bytes());
        field(&mut hasher, voice.as_bytes());
    }

    hasher.update(&(chain.len() as u64).to_le_bytes());
    for kind in chain {
        field(&mut hasher, kind.as_str().as_bytes());
    }

    let hash = hasher.digest128();
    format!("{hash:032x}")
}

/// Bounded artifact cache shared by all requests of one orchestrator.
#[derive(Clone)]
pub struct SessionCache {
    inner: Cache<String, AudioArtifact>,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, None)
    }
}

impl SessionCache {
    pub fn new(max_entries: u64, ttl: Option<Duration>) -> Self {
        let mut builder = Cache::builder().max_capacity(max_entries);
        if let Some(ttl) = ttl {
            builder = builder.time_to_live(ttl);
        }
        Self {
            inner: builder.build(),
        }
    }

    pub async fn get(&self, key: &str) -> Option<AudioArtifact> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: String, artifact: AudioArtifact) {
        self.inner.insert(key, artifact).await;
    }

    /// Return the cached artifact or run `init` once for all concurrent callers.
    pub async fn get_or_try_insert_with<F>(
        &self,
        key: String,
        init: F,
    ) -> Result<AudioArtifact, SynthesisError>
    where
        F: Future<Output = Result<AudioArtifact, SynthesisError>>,
    {
        self.inner
            .try_get_with(key, init)
            .await
            .map_err(Arc::unwrap_or_clone)
    }

    /// Entry count after pending maintenance has run.
    pub async fn len(&self) -> u64 {
        self.inner.run_pending_tasks().await;
        self.inner.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}
