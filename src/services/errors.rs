use serde::Serialize;

/// Error taxonomy surfaced to API callers. Internal detail (DB text, paths, IPs) is logged
/// but never placed in `message`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    AuthenticationError,
    AuthorizationError,
    NotFound,
    Conflict,
    InsufficientCredits,
    RateLimitExceeded,
    InternalError,
}

#[derive(Debug, thiserror::Error, Serialize)]
#[error("{message}")]
pub struct EnrichmentError {
    pub code: ErrorCode,
    pub message: String,
}

impl EnrichmentError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn insufficient_credits(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InsufficientCredits, message)
    }

    /// Collapses any internal detail into a generic message; the detail itself should already
    /// have been logged by the caller before this is constructed.
    pub fn internal(_detail: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, "An internal error occurred")
    }
}

impl From<EnrichmentError> for loco_rs::Error {
    fn from(err: EnrichmentError) -> Self {
        loco_rs::Error::string(&err.message)
    }
}

impl axum::response::IntoResponse for EnrichmentError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        use axum::Json;

        let status = match self.code {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::AuthenticationError => StatusCode::UNAUTHORIZED,
            ErrorCode::AuthorizationError => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
            ErrorCode::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("master key must be exactly 32 bytes")]
    InvalidMasterKeyLength,
    #[error("write-verify mismatch: ciphertext did not decrypt back to plaintext")]
    WriteVerifyFailed,
    #[error("decryption failed: authentication tag mismatch")]
    DecryptionFailed,
    #[error("credential not found")]
    NotFound,
    #[error("malformed packed ciphertext")]
    MalformedCiphertext,
}

impl From<VaultError> for loco_rs::Error {
    fn from(err: VaultError) -> Self {
        loco_rs::Error::string(&err.to_string())
    }
}

impl From<VaultError> for EnrichmentError {
    fn from(err: VaultError) -> Self {
        match err {
            VaultError::NotFound => EnrichmentError::not_found(err.to_string()),
            VaultError::InvalidMasterKeyLength => EnrichmentError::internal(err),
            _ => EnrichmentError::internal(err),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient credits")]
    InsufficientCredits,
    #[error("billing record not found for workspace")]
    NotFound,
    #[error("amount must be positive")]
    NonPositiveAmount,
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl From<LedgerError> for loco_rs::Error {
    fn from(err: LedgerError) -> Self {
        loco_rs::Error::string(&err.to_string())
    }
}

impl From<LedgerError> for EnrichmentError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientCredits => {
                EnrichmentError::insufficient_credits("Insufficient credits")
            }
            LedgerError::NotFound => EnrichmentError::not_found(err.to_string()),
            LedgerError::NonPositiveAmount => EnrichmentError::validation(err.to_string()),
            LedgerError::Database(_) => EnrichmentError::internal(err),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate provider slug: {0}")]
    DuplicateSlug(String),
    #[error("non-positive credit cost for provider: {0}")]
    NonPositiveCost(String),
    #[error("unknown provider slug(s): {0}")]
    UnknownSlugs(String),
}

impl From<RegistryError> for EnrichmentError {
    fn from(err: RegistryError) -> Self {
        EnrichmentError::validation(err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("callback URL must use HTTPS")]
    NotHttps,
    #[error("callback URL resolves to a private or loopback address")]
    PrivateAddress,
    #[error("invalid callback URL: {0}")]
    InvalidUrl(String),
}

impl From<WebhookError> for EnrichmentError {
    fn from(err: WebhookError) -> Self {
        EnrichmentError::validation(err.to_string())
    }
}

impl From<WebhookError> for loco_rs::Error {
    fn from(err: WebhookError) -> Self {
        loco_rs::Error::string(&err.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ActivityError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("circuit breaker open for provider: {0}")]
    BreakerOpen(String),
    #[error("insufficient credits")]
    InsufficientCredits,
    #[error("missing credentials for provider: {0}")]
    MissingCredentials(String),
    #[error("credential decryption failed: {0}")]
    CredentialDecryptionFailed(String),
    #[error("provider adapter error: {0}")]
    AdapterError(String),
    #[error("output schema validation failed: {0}")]
    OutputValidationFailed(String),
    #[error("transient failure: {0}")]
    Transient(String),
}

impl ActivityError {
    /// Non-retryable failures are final for the attempt; the workflow engine's retry policy
    /// must not re-dispatch the activity for these.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ActivityError::Transient(_))
    }
}
