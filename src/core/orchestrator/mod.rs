//! Fallback orchestration across speech providers.
//!
//! [`FallbackOrchestrator::synthesize`] walks the provider chain in order:
//! quota-exhausted providers are skipped, calls are spaced by the per-provider
//! [`RateLimiter`], transient failures get one retry, and the first success is
//! encoded (or stitched) into a WAV [`AudioArtifact`] and memoized in the
//! [`SessionCache`].

mod quota;
mod rate_limit;
mod request;

pub use quota::{DEFAULT_QUOTA_RESET, ProviderQuotaState, QuotaTracker};
pub use rate_limit::RateLimiter;
pub(crate) use request::Script;
pub use request::{AudioArtifact, ProviderPreference, SegmentDispatch, SpeechRequest, WAV_MIME_TYPE};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures::future::try_join_all;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::SynthesisConfig;
use crate::core::audio::{AudioError, AudioStitcher};
use crate::core::cache::{DEFAULT_CACHE_CAPACITY, SessionCache, cache_key};
use crate::core::tts::{
    BoxedAdapter, ProviderError, ProviderKind, ProviderResult, RawAudioClip, VoiceCapabilities,
    VoiceConfig, create_adapter,
};
use crate::core::voice::{SpeakerSegment, SpeakerVoiceMapping, VoiceResolver, distinct_speakers};
use crate::errors::{ProviderFailure, SynthesisError, SynthesisResult};

/// Default bound on a single adapter call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcome of trying one provider.
enum AttemptError {
    /// Provider-level failure; the chain moves on
    Provider(ProviderError),
    /// Stops the whole request
    Terminal(SynthesisError),
}

impl From<ProviderError> for AttemptError {
    fn from(error: ProviderError) -> Self {
        Self::Provider(error)
    }
}

impl From<AudioError> for AttemptError {
    /// Mixed clip formats and a failed stitching worker are terminal; an
    /// undecodable payload is the provider's fault and the next provider gets
    /// a chance.
    fn from(error: AudioError) -> Self {
        match error {
            AudioError::MixedFormat { .. } => Self::Terminal(SynthesisError::MixedFormat(error)),
            AudioError::Worker(reason) => {
                Self::Terminal(SynthesisError::Internal(format!("stitching worker failed: {reason}")))
            }
            other => Self::Provider(ProviderError::Unsupported(format!(
                "unusable audio payload: {other}"
            ))),
        }
    }
}

/// Drives an ordered chain of speech adapters for each request.
pub struct FallbackOrchestrator {
    adapters: HashMap<ProviderKind, BoxedAdapter>,
    chain: Vec<ProviderKind>,
    quota: QuotaTracker,
    rate_limiter: RateLimiter,
    cache: SessionCache,
    stitcher: AudioStitcher,
    call_timeout: Duration,
    dispatch: SegmentDispatch,
}

impl FallbackOrchestrator {
    pub fn builder() -> FallbackOrchestratorBuilder {
        FallbackOrchestratorBuilder::default()
    }

    /// Build adapters for every provider in the configured chain.
    ///
    /// Providers without a credential are still registered; they fail with
    /// `ConfigError` at call time and the chain moves past them.
    pub fn from_config(config: &SynthesisConfig) -> SynthesisResult<Self> {
        let mut builder = Self::builder()
            .chain(config.provider_chain.clone())
            .call_timeout(config.request_timeout)
            .quota_reset(config.quota_reset)
            .cache(config.cache_max_entries, config.cache_ttl)
            .segment_dispatch(config.segment_dispatch);

        for (&kind, &interval) in &config.min_intervals {
            builder = builder.min_interval(kind, interval);
        }
        for &kind in &config.provider_chain {
            let adapter = create_adapter(kind, config.tts_config_for(kind))
                .map_err(|e| SynthesisError::Internal(format!("failed to create {kind} adapter: {e}")))?;
            builder = builder.adapter(adapter);
        }

        info!(chain = ?config.provider_chain, "Orchestrator configured");
        Ok(builder.build())
    }

    pub fn chain(&self) -> &[ProviderKind] {
        &self.chain
    }

    pub fn adapter(&self, kind: ProviderKind) -> Option<&BoxedAdapter> {
        self.adapters.get(&kind)
    }

    pub fn quota(&self) -> &QuotaTracker {
        &self.quota
    }

    pub fn cache(&self) -> &SessionCache {
        &self.cache
    }

    /// Produce one WAV artifact for `request`.
    ///
    /// Identical concurrent requests share a single provider traversal.
    /// Dropping the returned future aborts outstanding provider calls.
    pub async fn synthesize(&self, request: &SpeechRequest) -> SynthesisResult<AudioArtifact> {
        let request_id = Uuid::new_v4();
        let script = Script::from_request(request)?;
        let chain = self.chain_for(request.provider);
        let key = cache_key(script.text(), script.segments(), &request.voices, &chain);

        info!(
            %request_id,
            chars = script.char_count(),
            segments = script.segments().len(),
            chain = ?chain,
            "Synthesis requested"
        );

        if let Some(hit) = self.cache.get(&key).await {
            info!(%request_id, provider = %hit.provider_used, "Session cache hit");
            return Ok(hit);
        }

        self.cache
            .get_or_try_insert_with(
                key,
                self.run_chain(request_id, &script, &request.voices, &chain),
            )
            .await
    }

    /// [`synthesize`](Self::synthesize), aborted when `token` is cancelled.
    ///
    /// Partial clips are discarded; a cancelled request never yields audio.
    pub async fn synthesize_with_cancel(
        &self,
        request: &SpeechRequest,
        token: &CancellationToken,
    ) -> SynthesisResult<AudioArtifact> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                info!("Synthesis cancelled");
                Err(SynthesisError::Cancelled)
            }
            result = self.synthesize(request) => result,
        }
    }

    fn chain_for(&self, preference: ProviderPreference) -> Vec<ProviderKind> {
        match preference {
            ProviderPreference::DefaultChain => self.chain.clone(),
            ProviderPreference::Pinned(kind) => vec![kind],
        }
    }

    async fn run_chain(
        &self,
        request_id: Uuid,
        script: &Script,
        voices: &SpeakerVoiceMapping,
        chain: &[ProviderKind],
    ) -> SynthesisResult<AudioArtifact> {
        let mut failures = Vec::with_capacity(chain.len());

        for &kind in chain {
            let Some(adapter) = self.adapters.get(&kind) else {
                warn!(%request_id, provider = %kind, "No adapter registered, skipping");
                failures.push(ProviderFailure::skipped(
                    kind,
                    ProviderError::ConfigError("no adapter registered".into()),
                ));
                continue;
            };

            if !self.quota.is_available(kind) {
                info!(%request_id, provider = %kind, "Quota window active, skipping");
                failures.push(ProviderFailure::skipped(
                    kind,
                    ProviderError::QuotaExhausted("quota window still active".into()),
                ));
                continue;
            }

            let attempts = AtomicU32::new(0);
            match self.attempt(request_id, adapter, script, voices, &attempts).await {
                Ok(bytes) => {
                    info!(
                        %request_id,
                        provider = %kind,
                        bytes = bytes.len(),
                        calls = attempts.load(Ordering::Relaxed),
                        "Synthesis succeeded"
                    );
                    return Ok(AudioArtifact::wav(bytes, kind));
                }
                Err(AttemptError::Terminal(e)) => {
                    error!(%request_id, provider = %kind, error = %e, "Synthesis aborted");
                    return Err(e);
                }
                Err(AttemptError::Provider(e)) => {
                    if matches!(e, ProviderError::QuotaExhausted(_)) {
                        self.quota.mark_exhausted(kind);
                    }
                    warn!(
                        %request_id,
                        provider = %kind,
                        error = %e,
                        error_kind = e.label(),
                        "Provider failed, falling back"
                    );
                    failures.push(ProviderFailure {
                        provider: kind,
                        error: e,
                        attempts: attempts.load(Ordering::Relaxed),
                    });
                }
            }
        }

        error!(%request_id, attempted = failures.len(), "All providers failed");
        Err(SynthesisError::SynthesisFailed { failures })
    }

    /// Produce the finished WAV through one adapter.
    async fn attempt(
        &self,
        request_id: Uuid,
        adapter: &BoxedAdapter,
        script: &Script,
        voices: &SpeakerVoiceMapping,
        attempts: &AtomicU32,
    ) -> Result<Bytes, AttemptError> {
        let capabilities = adapter.voice_capabilities();

        let segments = match script {
            Script::Text(text) => {
                let speakers: Vec<&str> = voices.speakers().take(1).collect();
                let voice = VoiceResolver::resolve(&speakers, voices, &capabilities);
                let clip = self.call(request_id, adapter, text, &voice, attempts).await?;
                return Ok(self.stitcher.encode_single(&clip)?);
            }
            Script::Dialogue(segments) => segments,
        };

        let speakers = distinct_speakers(segments);
        if capabilities.supports_multi_voice() && speakers.len() >= 2 {
            let voice = VoiceResolver::resolve(&speakers, voices, &capabilities);
            if matches!(voice, VoiceConfig::Multi { .. }) {
                debug!(%request_id, provider = %adapter.kind(), "Rendering dialogue in one call");
                let prompt = adapter.render_dialogue(segments);
                let clip = self.call(request_id, adapter, &prompt, &voice, attempts).await?;
                return Ok(self.stitcher.encode_single(&clip)?);
            }
        }

        let clips = self
            .call_segments(request_id, adapter, segments, voices, capabilities, attempts)
            .await?;
        Ok(self.stitcher.stitch_async(clips).await?)
    }

    /// One call per segment, clips returned in script order.
    async fn call_segments(
        &self,
        request_id: Uuid,
        adapter: &BoxedAdapter,
        segments: &[SpeakerSegment],
        voices: &SpeakerVoiceMapping,
        capabilities: VoiceCapabilities,
        attempts: &AtomicU32,
    ) -> ProviderResult<Vec<RawAudioClip>> {
        let jobs = segments.iter().map(move |segment| {
            let voice = VoiceResolver::resolve(&[segment.speaker.as_str()], voices, &capabilities);
            async move {
                self.call(request_id, adapter, &segment.text, &voice, attempts)
                    .await
            }
        });

        match self.dispatch {
            SegmentDispatch::Sequential => {
                let mut clips = Vec::with_capacity(segments.len());
                for job in jobs {
                    clips.push(job.await?);
                }
                Ok(clips)
            }
            SegmentDispatch::Concurrent => try_join_all(jobs).await,
        }
    }

    /// Rate-limited, time-bounded adapter call with one retry on transient failure.
    async fn call(
        &self,
        request_id: Uuid,
        adapter: &BoxedAdapter,
        text: &str,
        voice: &VoiceConfig,
        attempts: &AtomicU32,
    ) -> ProviderResult<RawAudioClip> {
        let kind = adapter.kind();
        let mut retried = false;

        loop {
            self.rate_limiter.acquire(kind).await;
            let attempt = attempts.fetch_add(1, Ordering::Relaxed) + 1;
            debug!(%request_id, provider = %kind, attempt, text_len = text.len(), "Calling provider");

            let error = match timeout(self.call_timeout, adapter.synthesize(text, voice)).await {
                Ok(Ok(clip)) if !clip.data.is_empty() => return Ok(clip),
                Ok(Ok(_)) => ProviderError::NoAudioReturned,
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Transient(format!(
                    "call timed out after {} ms",
                    self.call_timeout.as_millis()
                )),
            };

            if error.is_transient() && !retried {
                retried = true;
                warn!(%request_id, provider = %kind, error = %error, "Transient failure, retrying once");
                continue;
            }
            return Err(error);
        }
    }
}

/// Builder for [`FallbackOrchestrator`].
pub struct FallbackOrchestratorBuilder {
    adapters: HashMap<ProviderKind, BoxedAdapter>,
    chain: Vec<ProviderKind>,
    quota_reset: Duration,
    min_intervals: HashMap<ProviderKind, Duration>,
    call_timeout: Duration,
    cache_capacity: u64,
    cache_ttl: Option<Duration>,
    stitcher: AudioStitcher,
    dispatch: SegmentDispatch,
}

impl Default for FallbackOrchestratorBuilder {
    fn default() -> Self {
        Self {
            adapters: HashMap::new(),
            chain: ProviderKind::DEFAULT_CHAIN.to_vec(),
            quota_reset: DEFAULT_QUOTA_RESET,
            min_intervals: HashMap::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            cache_ttl: None,
            stitcher: AudioStitcher::default(),
            dispatch: SegmentDispatch::default(),
        }
    }
}

impl FallbackOrchestratorBuilder {
    /// Register an adapter under its own [`ProviderKind`], replacing any previous one.
    pub fn adapter(mut self, adapter: BoxedAdapter) -> Self {
        self.adapters.insert(adapter.kind(), adapter);
        self
    }

    pub fn chain(mut self, chain: Vec<ProviderKind>) -> Self {
        self.chain = chain;
        self
    }

    pub fn quota_reset(mut self, reset_after: Duration) -> Self {
        self.quota_reset = reset_after;
        self
    }

    pub fn min_interval(mut self, kind: ProviderKind, interval: Duration) -> Self {
        self.min_intervals.insert(kind, interval);
        self
    }

    pub fn call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn cache(mut self, max_entries: u64, ttl: Option<Duration>) -> Self {
        self.cache_capacity = max_entries;
        self.cache_ttl = ttl;
        self
    }

    pub fn stitcher(mut self, stitcher: AudioStitcher) -> Self {
        self.stitcher = stitcher;
        self
    }

    pub fn segment_dispatch(mut self, dispatch: SegmentDispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    pub fn build(self) -> FallbackOrchestrator {
        FallbackOrchestrator {
            adapters: self.adapters,
            chain: self.chain,
            quota: QuotaTracker::new(self.quota_reset),
            rate_limiter: RateLimiter::new(self.min_intervals),
            cache: SessionCache::new(self.cache_capacity, self.cache_ttl),
            stitcher: self.stitcher,
            call_timeout: self.call_timeout,
            dispatch: self.dispatch,
        }
    }
}
