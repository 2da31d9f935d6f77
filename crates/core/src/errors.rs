use thiserror::Error;

/// Unified error type for the entire paper-etf-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Market data ─────────────────────────────────────────────────
    #[error("Market data unavailable: {0}")]
    DataUnavailable(String),

    #[error("API error ({provider}): {message}")]
    Api { provider: String, message: String },

    #[error("Network error: {0}")]
    Network(String),

    // ── Trade validation ────────────────────────────────────────────
    #[error("Not enough cash: trade requires {required:.2} but only {available:.2} is available")]
    InsufficientCash { required: f64, available: f64 },

    #[error("Not enough shares of {ticker}: tried to sell {requested:.4} but only {held:.4} held")]
    InsufficientShares {
        ticker: String,
        requested: f64,
        held: f64,
    },

    #[error("Unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("Invalid trade input: {0}")]
    InvalidTradeInput(String),

    // ── Session start ───────────────────────────────────────────────
    #[error("No ticker produced a valid previous close — cannot build the basket")]
    InsufficientData,

    // ── Storage ─────────────────────────────────────────────────────
    #[error("Local history cache is corrupt: {0}")]
    StorageCorrupt(String),

    #[error("Remote history store unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("File I/O error: {0}")]
    FileIO(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Sanitize error message: strip query parameters from URLs so
        // upstream tokens never end up in logs or user-visible errors.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
