//! Fallback Orchestrator Tests
//!
//! Drives the orchestrator against scripted in-process adapters:
//! - Chain order, skips and fall-through
//! - Quota windows and transient retries (paused clock)
//! - Request coalescing, caching and cancellation
//! - Multi-voice single calls versus per-segment stitching

mod fixtures;
mod mock_providers;

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use fixtures::{SAMPLE_RATE, constant, init_tracing, pcm_clip};
use mock_providers::{Reply, ScriptedAdapter, boxed};
use voicecast::config::SynthesisConfig;
use voicecast::core::audio::{parse_wav_header, pcm_bytes_to_samples};
use voicecast::core::orchestrator::{
    AudioArtifact, FallbackOrchestrator, SegmentDispatch, SpeechRequest, WAV_MIME_TYPE,
};
use voicecast::core::tts::{ProviderError, ProviderKind, SpeakerVoice, VoiceConfig};
use voicecast::core::voice::SpeakerSegment;
use voicecast::errors::SynthesisError;

use ProviderKind::{ElevenLabs, Gemini, OpenAI};

fn artifact_samples(artifact: &AudioArtifact) -> Vec<i16> {
    let header = parse_wav_header(&artifact.bytes).unwrap();
    assert!(header.is_pcm16());
    pcm_bytes_to_samples(header.data(&artifact.bytes)).unwrap()
}

fn tone_for(text: &str) -> Reply {
    let value = match text {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        _ => 0,
    };
    Reply::Audio(pcm_clip(&constant(10, value), SAMPLE_RATE))
}

fn counting_script() -> SpeechRequest {
    SpeechRequest::dialogue(vec![
        SpeakerSegment::new("A", "one"),
        SpeakerSegment::new("B", "two"),
        SpeakerSegment::new("C", "three"),
    ])
}

// =============================================================================
// Chain traversal
// =============================================================================

#[tokio::test]
async fn test_falls_through_to_next_provider() {
    init_tracing();
    let gemini = ScriptedAdapter::always_failing(Gemini, ProviderError::QuotaExhausted("daily".into())).shared();
    let elevenlabs = ScriptedAdapter::new(ElevenLabs).shared();
    let openai = ScriptedAdapter::new(OpenAI).shared();

    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&gemini))
        .adapter(boxed(&elevenlabs))
        .adapter(boxed(&openai))
        .build();

    let artifact = orchestrator
        .synthesize(&SpeechRequest::text("Hello there"))
        .await
        .unwrap();

    assert_eq!(artifact.provider_used, ElevenLabs);
    assert_eq!(artifact.mime_type, WAV_MIME_TYPE);
    assert_eq!(gemini.calls(), 1);
    assert_eq!(elevenlabs.calls(), 1);
    assert_eq!(openai.calls(), 0);
    assert!(!orchestrator.quota().is_available(Gemini));
}

#[tokio::test]
async fn test_all_providers_fail() {
    init_tracing();
    let gemini = ScriptedAdapter::always_failing(Gemini, ProviderError::Unauthorized("bad key".into())).shared();
    let elevenlabs = ScriptedAdapter::always_failing(ElevenLabs, ProviderError::Unsupported("voice".into())).shared();
    let openai = ScriptedAdapter::always_failing(OpenAI, ProviderError::Transient("503".into())).shared();

    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&gemini))
        .adapter(boxed(&elevenlabs))
        .adapter(boxed(&openai))
        .build();

    let err = orchestrator
        .synthesize(&SpeechRequest::text("Hello"))
        .await
        .unwrap_err();

    let failures = err.failures();
    assert_eq!(failures.len(), 3);
    assert_eq!(failures[0].provider, Gemini);
    assert_eq!(failures[0].error.label(), "unauthorized");
    assert_eq!(failures[0].attempts, 1);
    assert_eq!(failures[1].error.label(), "unsupported");
    assert_eq!(failures[2].provider, OpenAI);
    assert_eq!(failures[2].attempts, 2);
    assert!(err.to_string().starts_with("All providers failed"));
}

#[tokio::test]
async fn test_unregistered_provider_is_skipped() {
    let openai = ScriptedAdapter::new(OpenAI).shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&openai))
        .chain(vec![Gemini, OpenAI])
        .build();

    let artifact = orchestrator
        .synthesize(&SpeechRequest::text("Hello"))
        .await
        .unwrap();
    assert_eq!(artifact.provider_used, OpenAI);
}

#[tokio::test]
async fn test_pinned_provider_bypasses_chain() {
    let gemini = ScriptedAdapter::new(Gemini).shared();
    let openai = ScriptedAdapter::new(OpenAI).shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&gemini))
        .adapter(boxed(&openai))
        .build();

    let artifact = orchestrator
        .synthesize(&SpeechRequest::text("Hello").pinned(OpenAI))
        .await
        .unwrap();

    assert_eq!(artifact.provider_used, OpenAI);
    assert_eq!(gemini.calls(), 0);
}

#[tokio::test]
async fn test_invalid_request_makes_no_calls() {
    let openai = ScriptedAdapter::new(OpenAI).shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&openai))
        .chain(vec![OpenAI])
        .build();

    let blank = orchestrator.synthesize(&SpeechRequest::text("   ")).await;
    assert!(matches!(blank, Err(SynthesisError::InvalidRequest(_))));

    let empty_segments = SpeechRequest::dialogue(vec![SpeakerSegment::new("A", " ")]);
    let result = orchestrator.synthesize(&empty_segments).await;
    assert!(matches!(result, Err(SynthesisError::InvalidRequest(_))));

    assert_eq!(openai.calls(), 0);
}

// =============================================================================
// Retry, timeout and quota windows
// =============================================================================

#[tokio::test]
async fn test_transient_failure_retried_once() {
    let gemini = ScriptedAdapter::new(Gemini)
        .then(Reply::Fail(ProviderError::Transient("connection reset".into())))
        .shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&gemini))
        .chain(vec![Gemini])
        .build();

    let artifact = orchestrator
        .synthesize(&SpeechRequest::text("Hello"))
        .await
        .unwrap();
    assert_eq!(artifact.provider_used, Gemini);
    assert_eq!(gemini.calls(), 2);
}

#[tokio::test]
async fn test_rate_limited_then_fall_through() {
    let gemini = ScriptedAdapter::always_failing(Gemini, ProviderError::RateLimited("429".into())).shared();
    let openai = ScriptedAdapter::new(OpenAI).shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&gemini))
        .adapter(boxed(&openai))
        .chain(vec![Gemini, OpenAI])
        .build();

    let artifact = orchestrator
        .synthesize(&SpeechRequest::text("Hello"))
        .await
        .unwrap();
    assert_eq!(artifact.provider_used, OpenAI);
    assert_eq!(gemini.calls(), 2);
    // throttling is not quota exhaustion
    assert!(orchestrator.quota().is_available(Gemini));
}

#[tokio::test(start_paused = true)]
async fn test_hung_call_times_out() {
    init_tracing();
    let gemini = ScriptedAdapter::new(Gemini).otherwise(|_| Reply::Hang).shared();
    let openai = ScriptedAdapter::new(OpenAI).shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&gemini))
        .adapter(boxed(&openai))
        .chain(vec![Gemini, OpenAI])
        .call_timeout(Duration::from_secs(5))
        .build();

    let start = Instant::now();
    let artifact = orchestrator
        .synthesize(&SpeechRequest::text("Hello"))
        .await
        .unwrap();

    assert_eq!(artifact.provider_used, OpenAI);
    assert_eq!(gemini.calls(), 2);
    assert!(start.elapsed() >= Duration::from_secs(10));
}

#[tokio::test(start_paused = true)]
async fn test_quota_window_expires() {
    init_tracing();
    let gemini = ScriptedAdapter::new(Gemini)
        .then(Reply::Fail(ProviderError::QuotaExhausted("resource exhausted".into())))
        .shared();
    let openai = ScriptedAdapter::new(OpenAI).shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&gemini))
        .adapter(boxed(&openai))
        .chain(vec![Gemini, OpenAI])
        .quota_reset(Duration::from_secs(60))
        .build();

    let first = orchestrator.synthesize(&SpeechRequest::text("first")).await.unwrap();
    assert_eq!(first.provider_used, OpenAI);
    assert_eq!(gemini.calls(), 1);

    tokio::time::advance(Duration::from_millis(59_999)).await;
    let second = orchestrator.synthesize(&SpeechRequest::text("second")).await.unwrap();
    assert_eq!(second.provider_used, OpenAI);
    assert_eq!(gemini.calls(), 1);

    tokio::time::advance(Duration::from_millis(2)).await;
    let third = orchestrator.synthesize(&SpeechRequest::text("third")).await.unwrap();
    assert_eq!(third.provider_used, Gemini);
    assert_eq!(gemini.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_min_interval_spaces_calls() {
    let openai = ScriptedAdapter::new(OpenAI).shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&openai))
        .chain(vec![OpenAI])
        .min_interval(OpenAI, Duration::from_millis(250))
        .build();

    let start = Instant::now();
    orchestrator.synthesize(&counting_script()).await.unwrap();

    assert_eq!(openai.calls(), 3);
    assert!(start.elapsed() >= Duration::from_millis(500));
}

// =============================================================================
// Coalescing, caching, cancellation
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_identical_requests_coalesce() {
    let gemini = ScriptedAdapter::new(Gemini)
        .with_delay(|_| Duration::from_millis(100))
        .shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&gemini))
        .chain(vec![Gemini])
        .build();

    let request = SpeechRequest::text("Same words");
    let (a, b) = tokio::join!(orchestrator.synthesize(&request), orchestrator.synthesize(&request));

    assert_eq!(a.unwrap(), b.unwrap());
    assert_eq!(gemini.calls(), 1);
}

#[tokio::test]
async fn test_cache_hit_skips_providers() {
    let gemini = ScriptedAdapter::new(Gemini).shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&gemini))
        .chain(vec![Gemini])
        .build();

    let request = SpeechRequest::text("Cache me").with_voice("narrator", "Kore");
    let first = orchestrator.synthesize(&request).await.unwrap();
    let second = orchestrator.synthesize(&request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(gemini.calls(), 1);
    assert_eq!(orchestrator.cache().len().await, 1);

    // a different voice is a different artifact
    let other = SpeechRequest::text("Cache me").with_voice("narrator", "Puck");
    orchestrator.synthesize(&other).await.unwrap();
    assert_eq!(gemini.calls(), 2);
}

#[tokio::test]
async fn test_failures_are_not_cached() {
    let gemini = ScriptedAdapter::new(Gemini)
        .then(Reply::Fail(ProviderError::Unsupported("nope".into())))
        .shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&gemini))
        .chain(vec![Gemini])
        .build();

    let request = SpeechRequest::text("Try again");
    assert!(orchestrator.synthesize(&request).await.is_err());
    assert!(orchestrator.synthesize(&request).await.is_ok());
    assert_eq!(gemini.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_yields_no_audio() {
    init_tracing();
    let gemini = ScriptedAdapter::new(Gemini).otherwise(|_| Reply::Hang).shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&gemini))
        .chain(vec![Gemini])
        .call_timeout(Duration::from_secs(60))
        .build();

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        canceller.cancel();
    });

    let result = orchestrator
        .synthesize_with_cancel(&SpeechRequest::text("Never finished"), &token)
        .await;

    assert!(matches!(result, Err(SynthesisError::Cancelled)));
    assert_eq!(gemini.calls(), 1);
    assert!(orchestrator.cache().is_empty().await);
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_wait_frees_rate_limit_slot() {
    let openai = ScriptedAdapter::new(OpenAI).shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&openai))
        .chain(vec![OpenAI])
        .min_interval(OpenAI, Duration::from_secs(10))
        .build();

    let start = Instant::now();
    orchestrator.synthesize(&SpeechRequest::text("First")).await.unwrap();

    // cancelled while waiting for the next slot, so no call is made
    tokio::time::advance(Duration::from_secs(1)).await;
    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        canceller.cancel();
    });
    let cancelled = orchestrator
        .synthesize_with_cancel(&SpeechRequest::text("Second"), &token)
        .await;
    assert!(matches!(cancelled, Err(SynthesisError::Cancelled)));
    assert_eq!(openai.calls(), 1);

    // spacing is measured from the first call only
    tokio::time::sleep_until(start + Duration::from_secs(10)).await;
    let third_start = Instant::now();
    orchestrator.synthesize(&SpeechRequest::text("Third")).await.unwrap();

    assert_eq!(third_start.elapsed(), Duration::ZERO);
    assert_eq!(openai.calls(), 2);
}

// =============================================================================
// Voices, segments and stitching
// =============================================================================

#[tokio::test]
async fn test_multi_voice_provider_renders_dialogue_in_one_call() {
    let gemini = ScriptedAdapter::new(Gemini).multi_voice().shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&gemini))
        .chain(vec![Gemini])
        .build();

    let request = SpeechRequest::dialogue(vec![
        SpeakerSegment::new("Alice", "Hi there"),
        SpeakerSegment::new("Bob", "Hello"),
    ])
    .with_voice("Alice", "Kore")
    .with_voice("Bob", "Puck");

    orchestrator.synthesize(&request).await.unwrap();

    let requests = gemini.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].0, "Alice: Hi there\nBob: Hello");
    assert_eq!(
        requests[0].1,
        VoiceConfig::Multi {
            speakers: vec![
                SpeakerVoice {
                    speaker: "Alice".into(),
                    voice_id: "Kore".into()
                },
                SpeakerVoice {
                    speaker: "Bob".into(),
                    voice_id: "Puck".into()
                },
            ]
        }
    );
}

#[tokio::test]
async fn test_single_voice_provider_calls_per_segment() {
    let openai = ScriptedAdapter::new(OpenAI).shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&openai))
        .chain(vec![OpenAI])
        .build();

    let request = SpeechRequest::dialogue(vec![
        SpeakerSegment::new("Alice", "Hi there"),
        SpeakerSegment::new("Bob", "   "),
        SpeakerSegment::new("Bob", "Hello"),
    ])
    .with_voice("Alice", "nova")
    .with_voice("Bob", "onyx");

    let artifact = orchestrator.synthesize(&request).await.unwrap();

    let requests = openai.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], ("Hi there".to_string(), VoiceConfig::single("nova")));
    assert_eq!(requests[1], ("Hello".to_string(), VoiceConfig::single("onyx")));
    assert_eq!(artifact_samples(&artifact).len(), 200);
}

#[tokio::test]
async fn test_text_request_uses_first_mapped_voice() {
    let openai = ScriptedAdapter::new(OpenAI).shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&openai))
        .chain(vec![OpenAI])
        .build();

    orchestrator
        .synthesize(&SpeechRequest::text("Narration").with_voice("narrator", "shimmer"))
        .await
        .unwrap();
    orchestrator
        .synthesize(&SpeechRequest::text("No voice"))
        .await
        .unwrap();

    let requests = openai.requests();
    assert_eq!(requests[0].1, VoiceConfig::single("shimmer"));
    assert_eq!(requests[1].1, VoiceConfig::Default);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_dispatch_keeps_script_order() {
    let openai = ScriptedAdapter::new(OpenAI)
        .otherwise(tone_for)
        .with_delay(|text| match text {
            "one" => Duration::from_millis(30),
            "two" => Duration::from_millis(20),
            _ => Duration::from_millis(10),
        })
        .shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&openai))
        .chain(vec![OpenAI])
        .segment_dispatch(SegmentDispatch::Concurrent)
        .build();

    let start = Instant::now();
    let artifact = orchestrator.synthesize(&counting_script()).await.unwrap();
    let elapsed = start.elapsed();

    let mut expected = constant(10, 1);
    expected.extend(constant(10, 2));
    expected.extend(constant(10, 3));
    assert_eq!(artifact_samples(&artifact), expected);
    assert!(elapsed < Duration::from_millis(60), "segments ran serially: {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn test_sequential_dispatch_waits_for_each_segment() {
    let openai = ScriptedAdapter::new(OpenAI)
        .otherwise(tone_for)
        .with_delay(|_| Duration::from_millis(20))
        .shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&openai))
        .chain(vec![OpenAI])
        .build();

    let start = Instant::now();
    let artifact = orchestrator.synthesize(&counting_script()).await.unwrap();

    assert_eq!(artifact_samples(&artifact)[..10], constant(10, 1)[..]);
    assert!(start.elapsed() >= Duration::from_millis(60));
}

#[tokio::test]
async fn test_mixed_formats_stop_the_chain() {
    let openai = ScriptedAdapter::new(OpenAI)
        .otherwise(|text| {
            let rate = if text == "one" { 24_000 } else { 16_000 };
            Reply::Audio(pcm_clip(&constant(10, 1), rate))
        })
        .shared();
    let elevenlabs = ScriptedAdapter::new(ElevenLabs).shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&openai))
        .adapter(boxed(&elevenlabs))
        .chain(vec![OpenAI, ElevenLabs])
        .build();

    let err = orchestrator
        .synthesize(&counting_script())
        .await
        .unwrap_err();

    assert!(matches!(err, SynthesisError::MixedFormat(_)));
    assert_eq!(elevenlabs.calls(), 0);
}

#[tokio::test]
async fn test_empty_clip_counts_as_no_audio() {
    let gemini = ScriptedAdapter::new(Gemini)
        .otherwise(|_| Reply::Audio(pcm_clip(&[], SAMPLE_RATE)))
        .shared();
    let openai = ScriptedAdapter::new(OpenAI).shared();
    let orchestrator = FallbackOrchestrator::builder()
        .adapter(boxed(&gemini))
        .adapter(boxed(&openai))
        .chain(vec![Gemini, OpenAI])
        .build();

    let artifact = orchestrator.synthesize(&SpeechRequest::text("Hi")).await.unwrap();
    assert_eq!(artifact.provider_used, OpenAI);
    // empty audio is retried like any transient fault
    assert_eq!(gemini.calls(), 2);
}

// =============================================================================
// Construction from configuration
// =============================================================================

#[test]
fn test_from_config_registers_chain() {
    let mut config = SynthesisConfig::default();
    config.provider_chain = vec![OpenAI, Gemini];
    config.openai_api_key = Some("sk-test".to_string());

    let orchestrator = FallbackOrchestrator::from_config(&config).unwrap();
    assert_eq!(orchestrator.chain(), &[OpenAI, Gemini]);
    assert!(orchestrator.adapter(OpenAI).is_some());
    assert!(orchestrator.adapter(Gemini).is_some());
    assert!(orchestrator.adapter(ElevenLabs).is_none());
}
