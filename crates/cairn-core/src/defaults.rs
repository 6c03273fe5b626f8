//! Central defaults and environment variable names.
//!
//! Every tunable in cairn reads from one of these constants so the
//! effective configuration is auditable in a single place.

// ─── Extraction ────────────────────────────────────────────────────────────

/// Hard cap on stored extracted text, in characters.
pub const EXTRACTED_TEXT_CAP: usize = 50_000;

/// Marker appended when extracted text is truncated at the cap.
pub const TRUNCATION_MARKER: &str = "…";

/// Per-command timeout for external extraction tools (pdftotext).
pub const EXTRACTION_CMD_TIMEOUT_SECS: u64 = 120;

// ─── Embedding ─────────────────────────────────────────────────────────────

/// Embedding dimension (all-MiniLM-L6-v2 family).
pub const EMBED_DIMENSION: usize = 384;

/// Character budget applied to text before it is sent to an embedding
/// provider. Anything longer is truncated at a char boundary.
pub const EMBED_CHAR_BUDGET: usize = 8_000;

/// Bounded retries for transient (model-loading) provider responses.
pub const EMBED_MAX_RETRIES: u32 = 3;

/// Base wait for the linear retry backoff, in milliseconds. Attempt `n`
/// waits `n * EMBED_RETRY_BASE_MS`.
pub const EMBED_RETRY_BASE_MS: u64 = 2_000;

/// Timeout for a single embedding request.
pub const EMBED_TIMEOUT_SECS: u64 = 30;

// ─── Other provider timeouts ───────────────────────────────────────────────

/// Timeout for vision/description requests.
pub const VISION_TIMEOUT_SECS: u64 = 120;

/// Timeout for audio transcription requests (long audio).
pub const TRANSCRIBE_TIMEOUT_SECS: u64 = 300;

/// Timeout for summarization requests.
pub const SUMMARY_TIMEOUT_SECS: u64 = 60;

// ─── Summarization ─────────────────────────────────────────────────────────

/// Target maximum summary length, in characters. Text at or below this
/// length is its own summary.
pub const SUMMARY_MAX_LEN: usize = 150;

/// Minimum summary length requested from providers.
pub const SUMMARY_MIN_LEN: usize = 30;

// ─── Search ────────────────────────────────────────────────────────────────

/// Default result limit for search queries.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Default minimum semantic similarity. Semantic ranking always returns
/// top-K candidates regardless of actual similarity; below this floor the
/// results are noise, not marginal matches.
pub const DEFAULT_MIN_SCORE: f32 = 0.3;

/// Hard cap on semantic candidates fetched per query.
pub const SEMANTIC_CANDIDATE_CAP: usize = 500;

/// Semantic candidates scored per chunk before yielding to the runtime.
pub const SEMANTIC_CHUNK_SIZE: usize = 50;

/// Base score for any lexical match.
pub const LEXICAL_BASE_SCORE: f32 = 0.8;

/// Bonus when the file name contains the query.
pub const LEXICAL_NAME_BONUS: f32 = 0.1;

/// Bonus when the extracted text contains the query.
pub const LEXICAL_CONTENT_BONUS: f32 = 0.05;

/// Fixed score for content-only search hits.
pub const CONTENT_SEARCH_SCORE: f32 = 0.8;

/// Fixed score for filename-only search hits.
pub const FILENAME_SEARCH_SCORE: f32 = 0.9;

/// Fixed score for tag search hits.
pub const TAG_SEARCH_SCORE: f32 = 0.95;

// ─── Orchestrator ──────────────────────────────────────────────────────────

/// Poll interval while waiting for a concurrent claim winner to finish.
pub const CLAIM_WAIT_POLL_MS: u64 = 100;

/// Maximum polls while waiting for a claim winner (bounds the wait to
/// CLAIM_WAIT_MAX_POLLS * CLAIM_WAIT_POLL_MS).
pub const CLAIM_WAIT_MAX_POLLS: u32 = 600;

// ─── Provider endpoints and models ─────────────────────────────────────────

/// Default Hugging Face Inference API base URL.
pub const HF_API_BASE: &str = "https://api-inference.huggingface.co";

/// Default primary embedding model.
pub const HF_EMBED_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Alternate embedding model tried when the primary is permanently gone.
pub const HF_EMBED_ALT_MODEL: &str = "BAAI/bge-small-en-v1.5";

/// Default summarization model.
pub const HF_SUMMARY_MODEL: &str = "facebook/bart-large-cnn";

/// Default image-captioning model (secondary vision provider).
pub const HF_CAPTION_MODEL: &str = "Salesforce/blip-image-captioning-large";

/// Default Ollama endpoint (secondary embedding, primary vision).
pub const OLLAMA_URL: &str = "http://localhost:11434";

/// Default Ollama embedding model.
pub const OLLAMA_EMBED_MODEL: &str = "nomic-embed-text";

/// Alternate Ollama embedding model.
pub const OLLAMA_EMBED_ALT_MODEL: &str = "all-minilm";

// ─── Environment variable names ────────────────────────────────────────────

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_HF_API_TOKEN: &str = "HF_API_TOKEN";
pub const ENV_HF_API_BASE: &str = "HF_API_BASE";
pub const ENV_HF_EMBED_MODEL: &str = "HF_EMBED_MODEL";
pub const ENV_HF_SUMMARY_MODEL: &str = "HF_SUMMARY_MODEL";
pub const ENV_HF_CAPTION_MODEL: &str = "HF_CAPTION_MODEL";
pub const ENV_OLLAMA_URL: &str = "OLLAMA_URL";
pub const ENV_OLLAMA_EMBED_MODEL: &str = "OLLAMA_EMBED_MODEL";
pub const ENV_OLLAMA_VISION_MODEL: &str = "OLLAMA_VISION_MODEL";
pub const ENV_WHISPER_BASE_URL: &str = "WHISPER_BASE_URL";
pub const ENV_WHISPER_MODEL: &str = "WHISPER_MODEL";

/// Default Whisper model served by OpenAI-compatible transcription hosts.
pub const DEFAULT_WHISPER_MODEL: &str = "Systran/faster-whisper-base";
