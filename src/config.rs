use std::env;

pub const DEFAULT_MAX_TOKENS: usize = 8000;
pub const DEFAULT_MAX_DIFF_BYTES: usize = 10 * 1024;
pub const DEFAULT_MAX_QUOTE_DEPTH: usize = 3;
pub const DEFAULT_REVIEW_SUMMARY_CHARS: usize = 1000;

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

/// Runtime configuration for content segmentation.
///
/// Passed by value into every component that needs it; nothing reads the
/// environment after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestConfig {
    /// Token budget per chunk
    pub max_tokens: usize,
    /// Aggregate diff size above which a message is segmented
    pub max_diff_bytes: usize,
    /// Quote nesting depth above which a message is segmented
    pub max_quote_depth: usize,
    /// Character cap for review summary chunks
    pub review_summary_chars: usize,
    /// Size of the chunking worker pool
    pub worker_threads: usize,
}

impl DigestConfig {
    /// Built-in defaults, ignoring the environment.
    pub fn standard() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            max_diff_bytes: DEFAULT_MAX_DIFF_BYTES,
            max_quote_depth: DEFAULT_MAX_QUOTE_DEPTH,
            review_summary_chars: DEFAULT_REVIEW_SUMMARY_CHARS,
            worker_threads: num_cpus::get(),
        }
    }

    pub fn from_env() -> Self {
        Self {
            max_tokens: env_usize("DIGEST_MAX_TOKENS", DEFAULT_MAX_TOKENS).max(1),
            max_diff_bytes: env_usize("DIGEST_MAX_DIFF_BYTES", DEFAULT_MAX_DIFF_BYTES),
            max_quote_depth: env_usize("DIGEST_MAX_QUOTE_DEPTH", DEFAULT_MAX_QUOTE_DEPTH),
            review_summary_chars: env_usize(
                "DIGEST_REVIEW_SUMMARY_CHARS",
                DEFAULT_REVIEW_SUMMARY_CHARS,
            ),
            worker_threads: env_usize("DIGEST_WORKER_THREADS", num_cpus::get()).max(1),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    pub fn with_worker_threads(mut self, worker_threads: usize) -> Self {
        self.worker_threads = worker_threads.max(1);
        self
    }
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
