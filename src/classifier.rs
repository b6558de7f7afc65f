//! Keyword classifier for raw device error text
//!
//! Raw messages pushed by the backend carry no structure, so the source and
//! severity are guessed from keywords. Each rule table is checked in order
//! and the first rule with a matching keyword wins, never the most specific
//! one. Matching is case-insensitive.

use crate::context::{ErrorContext, ErrorSource, Severity};

/// An ordered classification rule: any keyword match yields `result`
pub struct KeywordRule<T> {
    pub keywords: &'static [&'static str],
    pub result: T,
}

impl<T: Copy> KeywordRule<T> {
    /// `lowered` must already be lowercase
    fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

pub const SOURCE_RULES: &[KeywordRule<ErrorSource>] = &[
    KeywordRule {
        keywords: &["barcode", "scanner"],
        result: ErrorSource::Barcode,
    },
    KeywordRule {
        keywords: &["magtek", "swipe"],
        result: ErrorSource::Magstripe,
    },
    KeywordRule {
        keywords: &["keypad", "button"],
        result: ErrorSource::Keypad,
    },
    KeywordRule {
        keywords: &["network", "http"],
        result: ErrorSource::Network,
    },
];

// critical/fatal sits ahead of failed/error so "fatal error" is critical.
pub const SEVERITY_RULES: &[KeywordRule<Severity>] = &[
    KeywordRule {
        keywords: &["timeout", "retry"],
        result: Severity::Low,
    },
    KeywordRule {
        keywords: &["not found", "disconnected"],
        result: Severity::Medium,
    },
    KeywordRule {
        keywords: &["critical", "fatal"],
        result: Severity::Critical,
    },
    KeywordRule {
        keywords: &["failed", "error"],
        result: Severity::High,
    },
];

pub const DEFAULT_SOURCE: ErrorSource = ErrorSource::System;
pub const DEFAULT_SEVERITY: Severity = Severity::Medium;

fn first_match<T: Copy>(rules: &[KeywordRule<T>], lowered: &str, default: T) -> T {
    rules
        .iter()
        .find(|rule| rule.matches(lowered))
        .map(|rule| rule.result)
        .unwrap_or(default)
}

pub fn classify_source(message: &str) -> ErrorSource {
    first_match(SOURCE_RULES, &message.to_lowercase(), DEFAULT_SOURCE)
}

pub fn classify_severity(message: &str) -> Severity {
    first_match(SEVERITY_RULES, &message.to_lowercase(), DEFAULT_SEVERITY)
}

/// Classify a raw message. Never fails; unknown text falls back to
/// `system` / `medium`.
pub fn classify(message: &str) -> (ErrorSource, Severity) {
    let lowered = message.to_lowercase();
    (
        first_match(SOURCE_RULES, &lowered, DEFAULT_SOURCE),
        first_match(SEVERITY_RULES, &lowered, DEFAULT_SEVERITY),
    )
}

/// Build the context for a device-originated error
pub fn context_from_raw(message: &str) -> ErrorContext {
    let (source, severity) = classify(message);
    ErrorContext::new(source, severity, message, false)
}
