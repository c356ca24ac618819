//! Bounded retry with a fixed delay, and the generate-or-placeholder policy
//! built on it.

use std::time::Duration;

use crate::generator::{self, ContentGenerator, GenerationError, GenerationRequest};

/// How many times to try and how long to wait between tries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Pause between attempts.
    pub delay: Duration,
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        return Self {
            delay: Duration::from_millis(1000),
            max_attempts: 3,
        };
    }
}

/// Outcome of one attempt, as judged by the operation itself.
#[derive(Debug)]
pub enum Attempt<T, E> {
    /// Permanent failure; stop now.
    Fatal(E),
    /// Success.
    Ok(T),
    /// Transient failure; try again if attempts remain.
    Retryable(E),
}

/// Run `op` until it succeeds, fails fatally, or attempts run out.
/// `op` receives the one-based attempt number.
///
/// # Errors
///
/// Returns the last error when the operation fails fatally or every attempt
/// was retryable.
pub fn retry<T, E>(policy: RetryPolicy, mut op: impl FnMut(u32) -> Attempt<T, E>) -> Result<T, E> {
    let max = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match op(attempt) {
            Attempt::Ok(value) => return Ok(value),
            Attempt::Fatal(e) => return Err(e),
            Attempt::Retryable(e) if attempt >= max => return Err(e),
            Attempt::Retryable(_) => {
                attempt = attempt.saturating_add(1);
                if !policy.delay.is_zero() {
                    std::thread::sleep(policy.delay);
                }
            },
        }
    }
}

/// Where a block's new content came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentSource {
    /// The content generator answered.
    Generated,
    /// Generation failed; the deterministic placeholder was used.
    Placeholder,
}

/// Content ready for injection.
#[derive(Debug, Clone)]
pub struct Generated {
    /// Block content, trailing newlines removed.
    pub content: String,
    /// The generation error that forced a placeholder, if any.
    pub error: Option<GenerationError>,
    /// Generator or placeholder.
    pub source: ContentSource,
}

/// Ask `generator` for content, retrying transient failures under `policy`.
/// Fatal errors and exhausted retries fall back to the placeholder, so this
/// always produces something to inject.
pub fn generate_with_fallback(
    generator: &dyn ContentGenerator,
    request: &GenerationRequest,
    policy: RetryPolicy,
) -> Generated {
    let result = retry(policy, |attempt| {
        return match generator.generate(request) {
            Ok(content) => Attempt::Ok(content),
            Err(e) if e.kind.is_retryable() => {
                tracing::debug!(symbol = %request.symbol_name, attempt, error = %e, "generation attempt failed");
                Attempt::Retryable(e)
            },
            Err(e) => Attempt::Fatal(e),
        };
    });

    return match result {
        Ok(content) => Generated {
            content: content.trim_end_matches('\n').to_string(),
            error: None,
            source: ContentSource::Generated,
        },
        Err(e) => {
            tracing::warn!(symbol = %request.symbol_name, error = %e, "generation failed, using placeholder");
            Generated {
                content: generator::placeholder(request),
                error: Some(e),
                source: ContentSource::Placeholder,
            }
        },
    };
}
