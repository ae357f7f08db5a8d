//! Conversions from external infrastructure errors into domain errors.

use graphkit_common::auth::{OAuthClientError, OAuthServiceError, TokenManagerError};
use graphkit_common::StorageError;
use graphkit_domain::GraphError;
use keyring::Error as KeyringError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub GraphError);

impl From<InfraError> for GraphError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<GraphError> for InfraError {
    fn from(value: GraphError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoGraphError {
    fn into_graph(self) -> GraphError;
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → GraphError */
/* -------------------------------------------------------------------------- */

impl IntoGraphError for KeyringError {
    fn into_graph(self) -> GraphError {
        use KeyringError::{Ambiguous, BadEncoding, Invalid, NoEntry, NoStorageAccess, PlatformFailure, TooLong};

        let description = self.to_string();

        match self {
            NoEntry => GraphError::NotFound("keychain entry not found".into()),
            BadEncoding(_) => GraphError::Security("credential in keychain is not valid UTF-8".into()),
            TooLong(name, limit) => GraphError::Security(format!(
                "keychain attribute '{name}' exceeds platform limit ({limit})"
            )),
            Invalid(attr, reason) => {
                GraphError::Security(format!("keychain attribute '{attr}' is invalid: {reason}"))
            }
            Ambiguous(entries) => GraphError::Security(format!(
                "multiple keychain entries matched request ({} results)",
                entries.len()
            )),
            PlatformFailure(err) => GraphError::Security(format!("keychain platform error: {err}")),
            NoStorageAccess(err) => {
                GraphError::Security(format!("unable to access secure storage: {err}"))
            }
            _ => GraphError::Security(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_graph())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → GraphError */
/* -------------------------------------------------------------------------- */

impl IntoGraphError for HttpError {
    fn into_graph(self) -> GraphError {
        if self.is_timeout() {
            return GraphError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return GraphError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));

            return match code {
                401 | 403 => GraphError::Auth(message),
                404 => GraphError::NotFound(message),
                429 => GraphError::RateLimited(message),
                _ => GraphError::Api { status: code, message },
            };
        }

        if self.is_decode() {
            return GraphError::Internal(format!("failed to decode response body: {self}"));
        }

        GraphError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_graph())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io::Error / serde_json::Error → GraphError */
/* -------------------------------------------------------------------------- */

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        let error = match value.kind() {
            std::io::ErrorKind::NotFound => GraphError::NotFound(value.to_string()),
            std::io::ErrorKind::PermissionDenied => GraphError::Security(value.to_string()),
            _ => GraphError::Storage(value.to_string()),
        };
        InfraError(error)
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(GraphError::Internal(format!("JSON error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* graphkit-common errors → GraphError */
/* -------------------------------------------------------------------------- */

impl From<StorageError> for InfraError {
    fn from(value: StorageError) -> Self {
        let error = match value {
            StorageError::NotFound(account) => {
                GraphError::NotFound(format!("no tokens stored for account '{account}'"))
            }
            StorageError::Io(err) => return err.into(),
            other => GraphError::Storage(other.to_string()),
        };
        InfraError(error)
    }
}

impl From<OAuthClientError> for InfraError {
    fn from(value: OAuthClientError) -> Self {
        let error = match value {
            OAuthClientError::RequestFailed(err) => return err.into(),
            OAuthClientError::StateMismatch { .. } => {
                GraphError::Security("authorization state mismatch".into())
            }
            OAuthClientError::ConfigError(msg) => GraphError::Config(msg),
            other => GraphError::Auth(other.to_string()),
        };
        InfraError(error)
    }
}

impl From<TokenManagerError> for InfraError {
    fn from(value: TokenManagerError) -> Self {
        match value {
            TokenManagerError::StorageError(err) => err.into(),
            TokenManagerError::OAuthError(err) => err.into(),
            other => InfraError(GraphError::Auth(other.to_string())),
        }
    }
}

impl From<OAuthServiceError> for InfraError {
    fn from(value: OAuthServiceError) -> Self {
        match value {
            OAuthServiceError::TokenManager(err) => err.into(),
            OAuthServiceError::OAuthClient(err) => err.into(),
            OAuthServiceError::ConfigError(msg) => InfraError(GraphError::Auth(msg)),
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
