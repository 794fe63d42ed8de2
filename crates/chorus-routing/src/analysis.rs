//! Heuristic request classification
//!
//! Counts hits against curated term sets and falls back to sentence
//! structure when nothing matches. No ML pipeline, no I/O. Both over- and
//! under-classification are expected; the selector stays safe either way.

use std::sync::LazyLock;

use chorus_core::Signal;
use regex::Regex;

/// Sentence count at or above which unmatched text is treated as analysis-heavy
const COMPLEX_SENTENCE_COUNT: usize = 6;

/// Average words per sentence at or above which unmatched text is analysis-heavy
const COMPLEX_AVG_WORDS: f64 = 25.0;

// -- Term sets compiled once via LazyLock --

static LEGAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:legal(?:ly)?|law(?:suit)?s?|contracts?|contractual|clauses?|liabilit(?:y|ies)|liable|indemni\w*|statutes?|statutory|regulat\w*|complian\w*|jurisdictions?|plaintiffs?|defendants?|litigat\w*|torts?|negligen\w*|precedents?|courts?|counsel|attorneys?|breach\w*|warrant(?:y|ies)|subpoenas?|depositions?|probate|custody|leases?|tenanc\w*|intellectual property|non-compete|arbitration|damages)\b",
    )
    .expect("valid legal term regex")
});

static GENERATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:draft\w*|write|writing|rewrite|compose|composing|generate|create|prepare|author|outline)\b")
        .expect("valid generation verb regex")
});

static BREVITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:summari[sz]e\w*|summary|quick(?:ly)?|brief(?:ly)?|short|concise(?:ly)?|gist|recap|overview|in a nutshell|key points|tl;?dr)\b",
    )
    .expect("valid brevity cue regex")
});

static SENTENCE_END_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[.!?]+|\n{2,}").expect("valid sentence regex"));

/// Hit counts per curated term set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TermHits {
    pub legal: usize,
    pub generation: usize,
    pub brevity: usize,
}

/// Everything the classifier observed about a request
#[derive(Debug, Clone, PartialEq)]
pub struct QueryProfile {
    pub signal: Signal,
    pub term_hits: TermHits,
    pub sentence_count: usize,
    pub word_count: usize,
    pub avg_sentence_words: f64,
}

/// Classify request text into a routing signal
pub fn classify(text: &str) -> Signal {
    analyze(text).signal
}

/// Analyze request text, keeping the intermediate observations for logging
pub fn analyze(text: &str) -> QueryProfile {
    let term_hits = TermHits {
        legal: LEGAL_RE.find_iter(text).count(),
        generation: GENERATION_RE.find_iter(text).count(),
        brevity: BREVITY_RE.find_iter(text).count(),
    };

    let sentence_count = SENTENCE_END_RE
        .split(text)
        .filter(|s| !s.trim().is_empty())
        .count();
    let word_count = text.split_whitespace().count();

    #[allow(clippy::cast_precision_loss)]
    let avg_sentence_words = if sentence_count == 0 {
        0.0
    } else {
        word_count as f64 / sentence_count as f64
    };

    let signal = keyword_signal(term_hits)
        .unwrap_or_else(|| structural_signal(sentence_count, avg_sentence_words));

    QueryProfile {
        signal,
        term_hits,
        sentence_count,
        word_count,
        avg_sentence_words,
    }
}

/// Pick the term set with the most hits
///
/// Returns `None` when no set matched. A tie between leading sets is `General`.
fn keyword_signal(hits: TermHits) -> Option<Signal> {
    let counts = [
        (Signal::LegalComplex, hits.legal),
        (Signal::Generation, hits.generation),
        (Signal::FastSummary, hits.brevity),
    ];

    let best = counts.iter().map(|(_, n)| *n).max().unwrap_or(0);
    if best == 0 {
        return None;
    }

    let mut leaders = counts.iter().filter(|(_, n)| *n == best);
    match (leaders.next(), leaders.next()) {
        (Some((signal, _)), None) => Some(*signal),
        _ => Some(Signal::General),
    }
}

/// Tie-break for text that matched no term set
fn structural_signal(sentence_count: usize, avg_sentence_words: f64) -> Signal {
    if sentence_count >= COMPLEX_SENTENCE_COUNT || avg_sentence_words >= COMPLEX_AVG_WORDS {
        Signal::LegalComplex
    } else {
        Signal::General
    }
}
