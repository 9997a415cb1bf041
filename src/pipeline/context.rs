//! Rolling transcription context for prompt building.
//!
//! The transcription API accepts a text prompt that biases recognition.
//! Feeding it the preceding transcript improves continuity across chunk
//! boundaries; a one-time topic hint seeds the very first request.

use crate::defaults;
use std::collections::VecDeque;

/// Locale of the sentence templates wrapped around the context text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptLocale {
    #[default]
    En,
    Ja,
    Zh,
    Ko,
}

impl PromptLocale {
    /// Parse a locale code; unknown codes fall back to English.
    pub fn from_code(code: &str) -> Self {
        match code {
            "ja" => PromptLocale::Ja,
            "zh" => PromptLocale::Zh,
            "ko" => PromptLocale::Ko,
            _ => PromptLocale::En,
        }
    }

    fn topic_sentence(&self, topic: &str) -> String {
        match self {
            PromptLocale::Ja => format!(
                "以下の音声は「{}」というキーワードに関連しています。このキーワードを念頭に置いて、正確に文字起こししてください。",
                topic
            ),
            PromptLocale::En => format!(
                "The following audio is related to the keyword '{}'. \
                 Please transcribe accurately while keeping this keyword in mind.",
                topic
            ),
            PromptLocale::Zh => format!("以下音频与关键词{}相关。请在记住此关键词的同时准确转录。", topic),
            PromptLocale::Ko => format!(
                "다음 오디오는 '{}' 키워드와 관련이 있습니다. 이 키워드를 염두에 두고 정확하게 전사해 주세요.",
                topic
            ),
        }
    }

    fn continuation_sentence(&self, context: &str) -> String {
        match self {
            PromptLocale::Ja => format!("これは音声の続きです。前の文脈：{}", context),
            PromptLocale::En => format!(
                "This is a continuation of audio. Previous context: {}",
                context
            ),
            PromptLocale::Zh => format!("这是音频的延续。之前的上下文：{}", context),
            PromptLocale::Ko => format!("이것은 오디오의 연속입니다. 이전 컨텍스트: {}", context),
        }
    }
}

/// Bounded FIFO of recent transcriptions plus a one-shot topic hint.
///
/// Owned by the dispatcher worker; it is the only writer and reader during
/// a session, so no locking is needed.
#[derive(Debug)]
pub struct ContextTracker {
    history: VecDeque<String>,
    capacity: usize,
    topic_hint: Option<String>,
    hint_consumed: bool,
    locale: PromptLocale,
}

impl ContextTracker {
    /// Creates a tracker holding up to `capacity` past transcriptions.
    pub fn new(capacity: usize, locale: PromptLocale) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            topic_hint: None,
            hint_consumed: false,
            locale,
        }
    }

    /// Set the operator-supplied topic hint for this session.
    ///
    /// Blank hints are ignored; the hint is embedded in exactly the first
    /// prompt built afterwards and never reused.
    pub fn set_topic_hint(&mut self, hint: &str) {
        let hint = hint.trim();
        if !hint.is_empty() {
            self.topic_hint = Some(hint.to_string());
            self.hint_consumed = false;
        }
    }

    /// Build the prompt for the next transcription request.
    ///
    /// First call of a session with a topic hint set returns the hint
    /// sentence and consumes the hint. Later calls join the history oldest
    /// first inside the continuation template. Empty history yields an
    /// empty prompt.
    pub fn build_prompt(&mut self) -> String {
        if !self.hint_consumed
            && let Some(topic) = self.topic_hint.as_deref()
        {
            self.hint_consumed = true;
            return self.locale.topic_sentence(topic);
        }

        if self.history.is_empty() {
            return String::new();
        }

        let joined = self
            .history
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        self.locale.continuation_sentence(&joined)
    }

    /// Record a successful transcription, evicting the oldest entry once
    /// capacity is exceeded.
    pub fn record(&mut self, text: &str) {
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(text.to_string());
    }

    /// Number of entries currently held.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Returns true when no history has been recorded.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl Default for ContextTracker {
    fn default() -> Self {
        Self::new(defaults::CONTEXT_HISTORY, PromptLocale::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tracker_builds_empty_prompt() {
        let mut tracker = ContextTracker::default();
        assert_eq!(tracker.build_prompt(), "");
    }

    #[test]
    fn topic_hint_used_exactly_once() {
        let mut tracker = ContextTracker::new(4, PromptLocale::En);
        tracker.set_topic_hint("quarterly earnings");

        let first = tracker.build_prompt();
        assert!(first.contains("quarterly earnings"));

        // Second prompt has no history yet and must not repeat the hint
        assert_eq!(tracker.build_prompt(), "");

        tracker.record("revenue grew");
        let third = tracker.build_prompt();
        assert!(third.contains("revenue grew"));
        assert!(!third.contains("quarterly earnings"));
    }

    #[test]
    fn blank_topic_hint_is_ignored() {
        let mut tracker = ContextTracker::new(4, PromptLocale::En);
        tracker.set_topic_hint("   ");
        assert_eq!(tracker.build_prompt(), "");
    }

    #[test]
    fn history_joined_oldest_first() {
        let mut tracker = ContextTracker::new(4, PromptLocale::En);
        tracker.record("one");
        tracker.record("two");
        tracker.record("three");

        let prompt = tracker.build_prompt();
        assert!(prompt.contains("one two three"));
    }

    #[test]
    fn history_evicts_oldest_past_capacity() {
        let mut tracker = ContextTracker::new(4, PromptLocale::En);
        for text in ["a", "b", "c", "d", "e"] {
            tracker.record(text);
        }

        assert_eq!(tracker.len(), 4);
        let prompt = tracker.build_prompt();
        assert!(!prompt.contains('a'));
        assert!(prompt.contains("b c d e"));
    }

    #[test]
    fn capacity_is_at_least_one() {
        let mut tracker = ContextTracker::new(0, PromptLocale::En);
        tracker.record("only");
        tracker.record("latest");
        assert_eq!(tracker.len(), 1);
        assert!(tracker.build_prompt().contains("latest"));
    }

    #[test]
    fn localized_templates() {
        let mut tracker = ContextTracker::new(4, PromptLocale::Ja);
        tracker.record("こんにちは");
        assert!(tracker.build_prompt().contains("これは音声の続きです"));

        let mut tracker = ContextTracker::new(4, PromptLocale::Ko);
        tracker.set_topic_hint("회의");
        assert!(tracker.build_prompt().contains("회의"));
    }

    #[test]
    fn locale_from_code_falls_back_to_english() {
        assert_eq!(PromptLocale::from_code("ja"), PromptLocale::Ja);
        assert_eq!(PromptLocale::from_code("zh"), PromptLocale::Zh);
        assert_eq!(PromptLocale::from_code("ko"), PromptLocale::Ko);
        assert_eq!(PromptLocale::from_code("en"), PromptLocale::En);
        assert_eq!(PromptLocale::from_code("fr"), PromptLocale::En);
    }
}
