//! Structured logging schema and subscriber setup for cairn.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events, operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (candidates, chunks) |

use tracing_subscriber::EnvFilter;

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "store", "inference", "extract", "pipeline", "search"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "embedding_chain", "huggingface", "pg_store", "hybrid"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "process", "embed", "search", "try_claim"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// File UUID being operated on.
pub const FILE_ID: &str = "file_id";

/// Owner UUID scoping a search.
pub const OWNER_ID: &str = "owner_id";

/// Search query text.
pub const QUERY: &str = "query";

/// Provider name inside a fallback chain.
pub const PROVIDER: &str = "provider";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a search or query.
pub const RESULT_COUNT: &str = "result_count";

/// Number of semantic candidates scanned.
pub const CANDIDATE_COUNT: &str = "candidate_count";

/// Retry attempt number inside a provider call.
pub const ATTEMPT: &str = "attempt";

/// Initialize the global tracing subscriber.
///
/// Reads `RUST_LOG` for filtering (default `info`). Safe to call more than
/// once; later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
