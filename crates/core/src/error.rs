/// Error taxonomy shared by the gateway and the store.
///
/// Every failure surfaced to a caller is one of three kinds: the remote
/// API answered with a non-success status ([`Remote`](SoraError::Remote)),
/// the request never produced a usable response
/// ([`Transport`](SoraError::Transport)), or the operation was attempted
/// without a credential ([`NotConfigured`](SoraError::NotConfigured)).
#[derive(Debug, thiserror::Error)]
pub enum SoraError {
    /// The remote API returned a non-success status code. `message` and
    /// `code` are extracted from the JSON error body when present.
    #[error("API error ({status}): {message}")]
    Remote {
        status: u16,
        message: String,
        code: Option<String>,
    },

    /// A network-level failure before a usable response was obtained.
    /// Also covers non-success responses whose body is not the expected
    /// JSON error shape (e.g. a gateway timeout returning HTML).
    #[error("transport error: {0}")]
    Transport(String),

    /// An operation requiring a credential was attempted without one.
    #[error("no API key configured")]
    NotConfigured,
}

impl SoraError {
    /// Construct a [`Remote`](SoraError::Remote) error, substituting a
    /// generic message when the body carried none.
    pub fn remote(status: u16, message: Option<String>, code: Option<String>) -> Self {
        Self::Remote {
            status,
            message: message.unwrap_or_else(|| "request failed".to_string()),
            code,
        }
    }

    /// True when the remote API reported the resource as unknown.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote { status: 404, .. })
    }

    /// One-word classification used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Remote { .. } => "remote",
            Self::Transport(_) => "transport",
            Self::NotConfigured => "not_configured",
        }
    }
}
