//! Error types for the SafetyCulture provider

use bridge_traits::error::BridgeError;
use thiserror::Error;

/// SafetyCulture provider errors
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The export creation call itself failed (non-2xx)
    #[error("Export request failed (status {status}) at {url}")]
    RemoteRequest { status: u16, url: String },

    /// Any other API call returned a non-2xx status
    #[error("API error (status {status}) at {url}")]
    Api { status: u16, url: String },

    /// Failed to parse an API response body
    #[error("Failed to parse API response: {0}")]
    Parse(String),

    /// Transport-level failure
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

impl From<ProviderError> for BridgeError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::RemoteRequest { status, url } => BridgeError::OperationFailed(format!(
                "Export request failed (status {}) at {}",
                status, url
            )),
            ProviderError::Api { status, url } => {
                BridgeError::OperationFailed(format!("API error (status {}) at {}", status, url))
            }
            ProviderError::Parse(msg) => {
                BridgeError::OperationFailed(format!("Parse error: {}", msg))
            }
            ProviderError::Bridge(e) => e,
        }
    }
}
