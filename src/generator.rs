//! Content generation: turns a changed signature into fresh documentation prose.
//!
//! [`ContentGenerator`] is the seam the orchestrator calls. Two implementations
//! ship: [`CommandGenerator`] pipes the request to an external program, and
//! [`PlaceholderGenerator`] returns the deterministic stub used when
//! generation is disabled or keeps failing.

use std::fmt;
use std::io::{Read as _, Write as _};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::context::FileContext;
use crate::grammar;
use crate::types::CodeSignature;

/// Exit status a generator command uses to signal throttling (`EX_TEMPFAIL`).
pub const EXIT_RATE_LIMIT: i32 = 75;

/// Exit status a generator command uses to signal an unreachable backend (`EX_UNAVAILABLE`).
pub const EXIT_NETWORK: i32 = 69;

/// How often a running command is polled for completion.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Everything a generator needs to rewrite one block.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Qualified symbol name.
    pub symbol_name: String,
    /// Signature the existing docs were written against, when known.
    pub old_signature: Option<CodeSignature>,
    /// Signature the docs must now describe.
    pub new_signature: CodeSignature,
    /// Current block content; empty when the block doesn't exist yet.
    pub old_doc_text: String,
    /// Code file declaring the symbol.
    pub file_path: Option<PathBuf>,
    /// Import neighbours and package metadata for `file_path`, when gathered.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<FileContext>,
}

/// Failure category, deciding whether a retry can help.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationErrorKind {
    /// Unrecoverable for this request.
    Fatal,
    /// Backend unreachable.
    Network,
    /// Backend throttled the request.
    RateLimit,
    /// No answer within the deadline.
    Timeout,
}

impl GenerationErrorKind {
    /// Timeouts, rate limits, and network failures are worth another attempt.
    pub const fn is_retryable(self) -> bool {
        return !matches!(self, GenerationErrorKind::Fatal);
    }
}

impl fmt::Display for GenerationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GenerationErrorKind::Fatal => "fatal",
            GenerationErrorKind::Network => "network",
            GenerationErrorKind::RateLimit => "rate limit",
            GenerationErrorKind::Timeout => "timeout",
        };
        return f.write_str(name);
    }
}

/// A failed generation attempt.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct GenerationError {
    /// Failure category.
    pub kind: GenerationErrorKind,
    /// Human-readable detail.
    pub message: String,
}

impl GenerationError {
    /// Build an error of `kind`.
    pub fn new(kind: GenerationErrorKind, message: impl Into<String>) -> Self {
        return Self { kind, message: message.into() };
    }
}

/// Produces documentation prose for a changed symbol.
pub trait ContentGenerator: Sync {
    /// Generate new block content for `request`.
    ///
    /// # Errors
    ///
    /// Returns a [`GenerationError`] whose kind tells the caller whether a retry may succeed.
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Deterministic stub content: a notice plus the new signature in a code fence.
pub fn placeholder(request: &GenerationRequest) -> String {
    let fence = request.file_path.as_deref().map_or("", grammar::fence_language);
    return format!(
        "> Documentation for `{}` is pending regeneration.\n\n```{fence}\n{}\n```",
        request.symbol_name, request.new_signature.signature_text
    );
}

/// Always answers with [`placeholder`] content.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderGenerator;

impl ContentGenerator for PlaceholderGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        return Ok(placeholder(request));
    }
}

/// Runs an external program per request: JSON on stdin, prose on stdout.
#[derive(Debug, Clone)]
pub struct CommandGenerator {
    /// Program followed by its arguments.
    argv: Vec<String>,
    /// Working directory for the child.
    cwd: PathBuf,
    /// Deadline per invocation.
    timeout: Duration,
}

impl CommandGenerator {
    /// A generator running `argv` in `cwd`, killed after `timeout`.
    pub fn new(argv: Vec<String>, cwd: &Path, timeout: Duration) -> Self {
        return Self {
            argv,
            cwd: cwd.to_path_buf(),
            timeout,
        };
    }

    /// Map a finished child's exit code to content or an error kind.
    fn classify_exit(code: Option<i32>, stdout: String, stderr: &str) -> Result<String, GenerationError> {
        let detail = stderr.trim();
        return match code {
            Some(0) if stdout.trim().is_empty() => {
                Err(GenerationError::new(GenerationErrorKind::Fatal, "generator produced no output"))
            },
            Some(0) => Ok(stdout.trim_end().to_string()),
            Some(EXIT_RATE_LIMIT) => Err(GenerationError::new(GenerationErrorKind::RateLimit, detail)),
            Some(EXIT_NETWORK) => Err(GenerationError::new(GenerationErrorKind::Network, detail)),
            Some(other) => Err(GenerationError::new(
                GenerationErrorKind::Fatal,
                format!("generator exited with status {other}: {detail}"),
            )),
            None => Err(GenerationError::new(GenerationErrorKind::Fatal, "generator killed by signal")),
        };
    }
}

impl ContentGenerator for CommandGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let fatal = |message: String| return GenerationError::new(GenerationErrorKind::Fatal, message);

        let Some((program, args)) = self.argv.split_first() else {
            return Err(fatal("generator command is empty".to_string()));
        };
        let payload = serde_json::to_vec(request).map_err(|e| return fatal(e.to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .current_dir(&self.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| return fatal(format!("failed to start `{program}`: {e}")))?;

        // Drain both pipes on helper threads so a chatty child can't block on a full pipe.
        let stdout_reader = child.stdout.take().map(|mut out| {
            return std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = out.read_to_string(&mut buf);
                return buf;
            });
        });
        let stderr_reader = child.stderr.take().map(|mut err| {
            return std::thread::spawn(move || {
                let mut buf = String::new();
                let _ = err.read_to_string(&mut buf);
                return buf;
            });
        });

        // The request can exceed the pipe buffer, and a hung child may never read it.
        // Writing off-thread keeps the deadline below in force either way.
        if let Some(mut stdin) = child.stdin.take() {
            std::thread::spawn(move || {
                let _ = stdin.write_all(&payload);
            });
        }

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    let _ = child.kill();
                    let _ = child.wait();
                    tracing::warn!(symbol = %request.symbol_name, "generator timed out");
                    return Err(GenerationError::new(
                        GenerationErrorKind::Timeout,
                        format!("no answer within {}s", self.timeout.as_secs()),
                    ));
                },
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(fatal(e.to_string())),
            }
        };

        let stdout = stdout_reader.and_then(|h| return h.join().ok()).unwrap_or_default();
        let stderr = stderr_reader.and_then(|h| return h.join().ok()).unwrap_or_default();
        return Self::classify_exit(status.code(), stdout, &stderr);
    }
}
