//! Cloud provider error types

use thiserror::Error;

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Error reported by the remote API, kept verbatim for diagnostics.
    #[error("API error [{code}]: {message}{}", request_suffix(.request_id))]
    Api {
        code: String,
        message: String,
        request_id: Option<String>,
    },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Command execution failed: {0}")]
    CommandFailed(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid resource id {id:?}: expected {expected} parts separated by ':'")]
    InvalidId { id: String, expected: usize },

    #[error("Unexpected state: {0}")]
    UnexpectedState(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    /// A failed lifecycle step, tagged with the resource type and remote action.
    #[error("[{resource}] {operation} failed: {source}")]
    Operation {
        resource: String,
        operation: String,
        #[source]
        source: Box<CloudError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CloudError {
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        CloudError::Api {
            code: code.into(),
            message: message.into(),
            request_id: None,
        }
    }

    /// Wrap with the resource type and the remote action that failed.
    pub fn wrap(self, resource: impl Into<String>, operation: impl Into<String>) -> Self {
        CloudError::Operation {
            resource: resource.into(),
            operation: operation.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with `Operation` wrappers removed.
    pub fn root(&self) -> &CloudError {
        match self {
            CloudError::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    /// Remote error code, if this error came from the API.
    pub fn code(&self) -> Option<&str> {
        match self.root() {
            CloudError::Api { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether the error matches any of `codes`, either as the exact error
    /// code or as a substring of the remote message.
    pub fn matches_any(&self, codes: &[&str]) -> bool {
        match self.root() {
            CloudError::Api { code, message, .. } => codes
                .iter()
                .any(|c| code == c || message.contains(c)),
            _ => false,
        }
    }

    /// Whether the object itself is known to be gone.
    ///
    /// Only [`CloudError::ResourceNotFound`] qualifies. API codes that mean a
    /// missing object differ per call, so callers translate them with
    /// [`CloudError::not_found_on`] first.
    pub fn is_not_found(&self) -> bool {
        matches!(self.root(), CloudError::ResourceNotFound(_))
    }

    /// Turn an API error matching one of `codes` into
    /// [`CloudError::ResourceNotFound`]. Anything else is returned unchanged.
    pub fn not_found_on(self, codes: &[&str]) -> Self {
        if !self.is_not_found() && self.matches_any(codes) {
            CloudError::ResourceNotFound(self.to_string())
        } else {
            self
        }
    }
}

fn request_suffix(request_id: &Option<String>) -> String {
    request_id
        .as_ref()
        .map(|id| format!(" (RequestId: {id})"))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, CloudError>;
