//! Conversions from external infrastructure errors into domain errors.

use keyring::Error as KeyringError;
use reqwest::Error as HttpError;
use streamgate_common::security::KeychainError;
use streamgate_domain::StreamGateError;
use tokio_tungstenite::tungstenite::Error as WsError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub StreamGateError);

impl From<InfraError> for StreamGateError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<StreamGateError> for InfraError {
    fn from(value: StreamGateError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoStreamGateError {
    fn into_streamgate(self) -> StreamGateError;
}

/// Map an HTTP status (with optional body excerpt) to a domain error.
pub fn status_error(code: u16, context: &str) -> StreamGateError {
    let message = if context.is_empty() {
        format!("HTTP {code}")
    } else {
        format!("HTTP {code}: {context}")
    };

    match code {
        401 | 403 => StreamGateError::Auth(message),
        404 => StreamGateError::NotFound(message),
        429 => StreamGateError::Network(message),
        400..=499 => StreamGateError::InvalidInput(message),
        _ => StreamGateError::Network(message),
    }
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → StreamGateError */
/* -------------------------------------------------------------------------- */

impl IntoStreamGateError for KeyringError {
    fn into_streamgate(self) -> StreamGateError {
        use KeyringError::*;

        let description = self.to_string();

        match self {
            NoEntry => StreamGateError::NotFound("keychain entry not found".into()),
            BadEncoding(_) => {
                StreamGateError::Security("credential in keychain is not valid UTF-8".into())
            }
            PlatformFailure(err) => {
                StreamGateError::Security(format!("keychain platform error: {err}"))
            }
            NoStorageAccess(err) => {
                StreamGateError::Security(format!("unable to access secure storage: {err}"))
            }
            _ => StreamGateError::Security(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_streamgate())
    }
}

impl From<KeychainError> for InfraError {
    fn from(value: KeychainError) -> Self {
        InfraError(match value {
            KeychainError::NotFound => StreamGateError::NotFound("keychain entry not found".into()),
            other => StreamGateError::Security(other.to_string()),
        })
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → StreamGateError */
/* -------------------------------------------------------------------------- */

impl IntoStreamGateError for HttpError {
    fn into_streamgate(self) -> StreamGateError {
        if self.is_timeout() {
            return StreamGateError::Network("HTTP request timed out".into());
        }

        if self.is_connect() {
            return StreamGateError::Network("HTTP connection failure".into());
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            return status_error(code, status.canonical_reason().unwrap_or("unknown status"));
        }

        if self.is_decode() {
            return StreamGateError::Protocol(format!("invalid HTTP response body: {self}"));
        }

        StreamGateError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_streamgate())
    }
}

/* -------------------------------------------------------------------------- */
/* tungstenite::Error → StreamGateError */
/* -------------------------------------------------------------------------- */

impl IntoStreamGateError for WsError {
    fn into_streamgate(self) -> StreamGateError {
        match self {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                StreamGateError::Network("websocket closed".into())
            }
            WsError::Io(err) => StreamGateError::Network(format!("websocket I/O error: {err}")),
            WsError::Http(response) => status_error(response.status().as_u16(), "websocket upgrade"),
            WsError::Url(err) => StreamGateError::Config(format!("invalid websocket URL: {err}")),
            WsError::Protocol(err) => {
                StreamGateError::Protocol(format!("websocket protocol error: {err}"))
            }
            other => StreamGateError::Network(format!("websocket error: {other}")),
        }
    }
}

impl From<WsError> for InfraError {
    fn from(value: WsError) -> Self {
        InfraError(value.into_streamgate())
    }
}

/* -------------------------------------------------------------------------- */
/* std::io / serde_json → StreamGateError */
/* -------------------------------------------------------------------------- */

impl From<std::io::Error> for InfraError {
    fn from(value: std::io::Error) -> Self {
        InfraError(match value.kind() {
            std::io::ErrorKind::NotFound => StreamGateError::NotFound(value.to_string()),
            std::io::ErrorKind::AddrInUse => {
                StreamGateError::Config(format!("address already in use: {value}"))
            }
            _ => StreamGateError::Storage(value.to_string()),
        })
    }
}

impl From<serde_json::Error> for InfraError {
    fn from(value: serde_json::Error) -> Self {
        InfraError(StreamGateError::Storage(format!("invalid JSON document: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
