use thiserror::Error;

/// Failure while asking a remote endpoint for a transaction's calldata
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, timeout or body decoding failure
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// HTTP 429 or a "rate limit" message from the endpoint
    #[error("rate limit exceeded")]
    RateLimited,

    /// Any other non-2xx status
    #[error("endpoint returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// Error reported inside the response envelope
    #[error("endpoint error: {0}")]
    Api(String),

    /// Failure reported by the JSON-RPC provider
    #[error("provider error: {0}")]
    Provider(String),

    /// Base URL that does not parse
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// Not 32 bytes of hex
    #[error("invalid transaction hash {0:?}")]
    InvalidHash(String),

    /// Response that is neither a transaction nor an error
    #[error("unexpected response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::RateLimited => true,
            FetchError::Status(status) => status.is_server_error(),
            FetchError::Provider(msg) => is_retryable_message(msg),
            FetchError::Api(_)
            | FetchError::InvalidUrl(_)
            | FetchError::InvalidHash(_)
            | FetchError::Malformed(_) => false,
        }
    }
}

fn is_retryable_message(msg: &str) -> bool {
    let msg = msg.to_lowercase();
    msg.contains("connection")
        || msg.contains("timeout")
        || msg.contains("timed out")
        || msg.contains("rate limit")
        || msg.contains("too many requests")
        || msg.contains("429")
        || msg.contains("502")
        || msg.contains("503")
        || msg.contains("504")
}

/// Failure while decoding calldata against a known function
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The transaction could not be fetched
    #[error("no calldata to decode")]
    MissingCalldata,

    /// Calldata that is not hex
    #[error("calldata is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    /// Fewer than four bytes
    #[error("calldata is {0} bytes, shorter than a function selector")]
    TooShort(usize),

    /// The calldata belongs to another function
    #[error("selector mismatch: expected 0x{expected}, found 0x{found}")]
    SelectorMismatch {
        /// Selector of the method's function, hex
        expected: String,
        /// First four bytes of the calldata, hex
        found: String,
    },

    /// Arguments do not decode as the function's inputs
    #[error("abi decoding failed: {0}")]
    Abi(#[from] ethabi::Error),
}

/// Invalid method table
#[derive(Debug, Error)]
pub enum MethodTableError {
    /// The table file could not be read
    #[error("failed to read method table: {0}")]
    Io(#[from] std::io::Error),

    /// The table is not a JSON array of entries
    #[error("failed to parse method table: {0}")]
    Json(#[from] serde_json::Error),

    #[error("method {method:?}: invalid type {kind:?} for parameter {param:?}: {reason}")]
    /// A parameter type that is not a canonical Solidity type
    InvalidParamType {
        /// Label of the entry
        method: String,
        /// Parameter name
        param: String,
        /// Type as written in the table
        kind: String,
        /// Why it was rejected
        reason: String,
    },

    /// Two entries share a label
    #[error("method {0:?} is listed more than once")]
    DuplicateMethod(String),
}
