//! Merge provider outcomes into one attributed answer
//!
//! Pure and infallible: any mix of outcomes, including none, produces
//! exactly one [`SynthesisResult`].

use std::fmt::Write as _;

use chorus_core::{ErrorKind, Mode, ProviderFailure, ProviderOutcome, ProviderSuccess, Request, SynthesisResult};

/// Combine the outcomes of one dispatch
pub fn combine(outcomes: &[ProviderOutcome], request: &Request) -> SynthesisResult {
    // a blank answer contributes nothing and is reported as malformed
    let blanks: Vec<ProviderFailure> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            ProviderOutcome::Success(s) if s.content.trim().is_empty() => Some(ProviderFailure {
                provider_id: s.provider_id.clone(),
                reason: ErrorKind::Malformed,
                message: "provider returned empty content".to_owned(),
                latency: s.latency,
                tokens_used: 0,
            }),
            _ => None,
        })
        .collect();

    let mut successes: Vec<&ProviderSuccess> = Vec::new();
    let mut failures: Vec<&ProviderFailure> = Vec::new();

    for outcome in outcomes {
        match outcome {
            ProviderOutcome::Success(s) if !s.content.trim().is_empty() => successes.push(s),
            ProviderOutcome::Success(_) => {}
            ProviderOutcome::Failure(f) => failures.push(f),
        }
    }
    failures.extend(blanks.iter());

    let mode = request.mode();
    let partial_failure_count = failures.len();

    if successes.is_empty() {
        return SynthesisResult {
            content: failure_report(&failures),
            contributing_providers: Vec::new(),
            total_tokens: 0,
            confidence: 0,
            mode,
            partial_failure_count,
        };
    }

    // stable: equal confidence and latency keep dispatch order
    successes.sort_by(|a, b| b.confidence.cmp(&a.confidence).then(a.latency.cmp(&b.latency)));

    let total_tokens = successes.iter().map(|s| s.tokens_used).fold(0, u64::saturating_add);
    let confidence = mean_confidence(&successes);

    let content = match mode {
        Mode::Deep => deep_report(&successes, confidence, total_tokens),
        Mode::Normal => normal_report(&successes),
    };

    SynthesisResult {
        content,
        contributing_providers: successes.iter().map(|s| s.provider_id.clone()).collect(),
        total_tokens,
        confidence,
        mode,
        partial_failure_count,
    }
}

/// Rounded mean, half away from zero
fn mean_confidence(successes: &[&ProviderSuccess]) -> u8 {
    let n = successes.len() as u64;
    if n == 0 {
        return 0;
    }
    let sum: u64 = successes.iter().map(|s| u64::from(s.confidence.min(100))).sum();
    u8::try_from((sum * 2 + n) / (2 * n)).unwrap_or(100)
}

fn failure_report(failures: &[&ProviderFailure]) -> String {
    if failures.is_empty() {
        return "All providers failed: no providers were invoked.".to_owned();
    }

    let mut out = String::from("All providers failed:\n");
    for f in failures {
        let _ = writeln!(out, "- {}: {} ({})", f.provider_id, f.reason, f.message);
    }
    out.truncate(out.trim_end().len());
    out
}

fn deep_report(successes: &[&ProviderSuccess], confidence: u8, total_tokens: u64) -> String {
    let mut out = String::new();

    for s in successes {
        let _ = write!(
            out,
            "## {} (confidence {})\n\n{}\n\n",
            s.provider_id,
            s.confidence,
            s.content.trim()
        );
    }

    let noun = if successes.len() == 1 { "provider" } else { "providers" };
    let _ = write!(
        out,
        "---\nSynthesized from {} {noun}, average confidence {confidence}, {total_tokens} tokens total.",
        successes.len()
    );

    out
}

fn normal_report(successes: &[&ProviderSuccess]) -> String {
    let mut out = successes[0].content.trim().to_owned();

    if let Some(second) = successes.get(1) {
        let _ = write!(
            out,
            "\n\n### Supporting perspective ({})\n\n{}",
            second.provider_id,
            second.content.trim()
        );
    }

    out
}
