//! Lexicon and pattern scoring for generated text.
//!
//! These functions are pure domain logic: no I/O and no hidden state. They
//! attach a sentiment and a confidence estimate to every persisted message.
//!
//! | Function | Range | Signal |
//! |----------|-------|--------|
//! | [`sentiment_score`] | `[-1, 1]` | positive vs. negative word hits |
//! | [`confidence_score`] | `[0, 1]` | self-reported `Confidence: x` blended with hedging |

use regex::Regex;
use std::sync::LazyLock;

const POSITIVE_WORDS: &[&str] = &[
    "great",
    "good",
    "excellent",
    "positive",
    "promising",
    "excited",
    "glad",
    "happy",
    "optimistic",
];

const NEGATIVE_WORDS: &[&str] = &[
    "bad",
    "concern",
    "worried",
    "negative",
    "risky",
    "uncertain",
    "problem",
    "issue",
    "doubt",
    "frustrated",
    "blocked",
];

const HEDGE_WORDS: &[&str] = &[
    "maybe", "perhaps", "possibly", "unsure", "might", "could", "guess", "uncertain", "probably",
];

/// Penalty per distinct hedge word found
const HEDGE_PENALTY: f64 = 0.15;
/// Weight of the self-reported value when one is present
const EXPLICIT_WEIGHT: f64 = 0.6;

static CONFIDENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)confidence[:\s]+([01](?:\.\d+)?)").expect("confidence pattern is valid")
});

/// Number of distinct lexicon words contained in `text_lower`.
fn distinct_hits(text_lower: &str, lexicon: &[&str]) -> usize {
    lexicon.iter().filter(|word| text_lower.contains(*word)).count()
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Sentiment in `[-1, 1]` from case-insensitive word containment.
///
/// `(pos - neg) / max(pos + neg, 1)`; exactly `0.0` when neither lexicon
/// matches.
///
/// ```
/// use crewtalk_domain::scoring::sentiment_score;
///
/// assert_eq!(sentiment_score("great, excellent"), 1.0);
/// assert_eq!(sentiment_score("good but risky"), 0.0);
/// assert_eq!(sentiment_score("the sky is blue"), 0.0);
/// ```
pub fn sentiment_score(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let pos = distinct_hits(&lower, POSITIVE_WORDS);
    let neg = distinct_hits(&lower, NEGATIVE_WORDS);
    if pos == 0 && neg == 0 {
        return 0.0;
    }
    let score = (pos as f64 - neg as f64) / (pos + neg).max(1) as f64;
    score.clamp(-1.0, 1.0)
}

/// The first self-reported `confidence` value, if any.
pub fn explicit_confidence(text: &str) -> Option<f64> {
    CONFIDENCE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|value| value.clamp(0.0, 1.0))
}

/// Confidence in `[0, 1]`, rounded to three decimals.
///
/// The baseline is `max(0, 1 - 0.15 × distinct hedge words)`. When the text
/// reports its own confidence the result is `0.6 × reported + 0.4 × baseline`.
///
/// ```
/// use crewtalk_domain::scoring::confidence_score;
///
/// assert_eq!(confidence_score("Confidence: 0.9"), 0.94);
/// assert_eq!(confidence_score("maybe, perhaps"), 0.7);
/// ```
pub fn confidence_score(text: &str) -> f64 {
    let lower = text.to_lowercase();
    let hedges = distinct_hits(&lower, HEDGE_WORDS);
    let baseline = (1.0 - HEDGE_PENALTY * hedges as f64).clamp(0.0, 1.0);

    match explicit_confidence(text) {
        Some(reported) => round3(EXPLICIT_WEIGHT * reported + (1.0 - EXPLICIT_WEIGHT) * baseline),
        None => round3(baseline),
    }
}
