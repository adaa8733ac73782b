//! Speaker segments and speaker-to-voice mapping.
//!
//! The dialogue parser hands over already split [`SpeakerSegment`]s; the
//! caller supplies a [`SpeakerVoiceMapping`]. [`VoiceResolver`] turns both into
//! the [`VoiceConfig`](crate::core::tts::VoiceConfig) a given adapter can honor.

mod resolver;

pub use resolver::VoiceResolver;

use serde::{Deserialize, Serialize};

/// One line of dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeakerSegment {
    pub speaker: String,
    pub text: String,
}

impl SpeakerSegment {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

/// Distinct speaker labels in first-appearance order.
pub fn distinct_speakers(segments: &[SpeakerSegment]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for segment in segments {
        if !seen.contains(&segment.speaker.as_str()) {
            seen.push(&segment.speaker);
        }
    }
    seen
}

/// Insertion-ordered speaker label to voice id map.
///
/// Re-inserting a speaker replaces its voice but keeps its original position,
/// so the order that decides which speakers get dedicated voices is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeakerVoiceMapping {
    entries: Vec<(String, String)>,
}

impl SpeakerVoiceMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, speaker: impl Into<String>, voice_id: impl Into<String>) {
        let speaker = speaker.into();
        let voice_id = voice_id.into();
        match self.entries.iter_mut().find(|(s, _)| *s == speaker) {
            Some(entry) => entry.1 = voice_id,
            None => self.entries.push((speaker, voice_id)),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, speaker: impl Into<String>, voice_id: impl Into<String>) -> Self {
        self.insert(speaker, voice_id);
        self
    }

    pub fn get(&self, speaker: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(s, _)| s == speaker)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(s, v)| (s.as_str(), v.as_str()))
    }

    pub fn speakers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(s, _)| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>, V: Into<String>> FromIterator<(S, V)> for SpeakerVoiceMapping {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut mapping = Self::new();
        for (speaker, voice) in iter {
            mapping.insert(speaker, voice);
        }
        mapping
    }
}
