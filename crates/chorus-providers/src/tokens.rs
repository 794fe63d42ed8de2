//! Token estimation for providers that omit usage

use std::sync::LazyLock;

use tiktoken_rs::{CoreBPE, o200k_base};

static BPE: LazyLock<Option<CoreBPE>> = LazyLock::new(|| o200k_base().ok());

/// Estimate the token count of `text`
///
/// Uses the o200k encoding, falling back to four bytes per token when the
/// encoder is unavailable.
pub fn estimate_tokens(text: &str) -> u64 {
    let count = BPE
        .as_ref()
        .map_or_else(|| text.len().div_ceil(4), |bpe| bpe.encode_with_special_tokens(text).len());
    u64::try_from(count).unwrap_or(u64::MAX)
}

/// Estimate prompt plus reply usage for one exchange
pub fn estimate_exchange(prompt: &str, reply: &str) -> u64 {
    estimate_tokens(prompt).saturating_add(estimate_tokens(reply))
}
