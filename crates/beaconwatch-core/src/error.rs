//! Unified error types for the beaconwatch core library.
//!
//! Each module defines its own error enum (`AdapterError`, `ScanError`,
//! `ConfigError`) for internal use; [`BeaconwatchError`] flattens them
//! into one type for callers that do not care which boundary failed,
//! with stable machine-readable codes and HTTP status mappings for the
//! server crate.

use std::path::PathBuf;

use thiserror::Error;

use crate::adapter::{AdapterError, AdapterState};
use crate::config::ConfigError;
use crate::scanner::ScanError;

/// The unified error type for all beaconwatch operations.
#[derive(Debug, Error)]
pub enum BeaconwatchError {
    // =========================================================================
    // ADAPTER & SCAN ERRORS
    // =========================================================================
    /// No Bluetooth adapter was found on this system.
    #[error("no Bluetooth adapter found; ensure hardware is present and drivers are loaded")]
    AdapterNotFound,

    /// The adapter settled in a non-ready state while readiness was awaited.
    #[error("Bluetooth adapter is not ready: entered state '{0}'")]
    AdapterNotReady(AdapterState),

    /// A readiness wait was already in flight.
    #[error("an adapter readiness wait is already in flight")]
    ReadinessWaitInFlight,

    /// The adapter rejected the scan-start command.
    #[error("failed to start scanning: {0}")]
    ScanStartFailed(String),

    /// The adapter backend reported a failure outside the scan lifecycle.
    #[error("adapter backend error: {0}")]
    AdapterBackend(String),

    /// A scan session is already active.
    #[error("a scan session is already active")]
    AlreadyScanning,

    // =========================================================================
    // CONFIGURATION ERRORS
    // =========================================================================
    /// The configuration file was not found at the expected path.
    #[error("configuration file not found at: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// The configuration file exists but could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),

    /// The configuration was parsed but contains invalid values.
    #[error("configuration validation failed: {0}")]
    ConfigValidation(String),

    // =========================================================================
    // I/O ERRORS
    // =========================================================================
    /// A low-level I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized [`Result`] type for beaconwatch operations.
pub type Result<T> = std::result::Result<T, BeaconwatchError>;

impl BeaconwatchError {
    /// Returns `true` if this error originated at the radio boundary.
    #[inline]
    #[must_use]
    pub fn is_adapter_error(&self) -> bool {
        matches!(
            self,
            Self::AdapterNotFound
                | Self::AdapterNotReady(_)
                | Self::ReadinessWaitInFlight
                | Self::ScanStartFailed(_)
                | Self::AdapterBackend(_)
        )
    }

    /// Returns `true` if this error is related to configuration.
    #[inline]
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound(_) | Self::ConfigParse(_) | Self::ConfigValidation(_)
        )
    }

    /// Returns an HTTP-appropriate status code for this error.
    #[inline]
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 409 Conflict - valid request, wrong lifecycle moment
            Self::AlreadyScanning | Self::ReadinessWaitInFlight => 409,

            // 404 Not Found
            Self::ConfigNotFound(_) => 404,

            // 422 Unprocessable Entity - semantic errors
            Self::ConfigParse(_) | Self::ConfigValidation(_) => 422,

            // 500 Internal Server Error
            Self::Io(_) => 500,

            // 503 Service Unavailable - Bluetooth hardware issues
            Self::AdapterNotFound
            | Self::AdapterNotReady(_)
            | Self::ScanStartFailed(_)
            | Self::AdapterBackend(_) => 503,
        }
    }

    /// Returns a machine-readable error code for API responses.
    #[inline]
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AdapterNotFound => "adapter_not_found",
            Self::AdapterNotReady(_) => "adapter_not_ready",
            Self::ReadinessWaitInFlight => "readiness_wait_in_flight",
            Self::ScanStartFailed(_) => "scan_start_failed",
            Self::AdapterBackend(_) => "adapter_backend_error",
            Self::AlreadyScanning => "already_scanning",
            Self::ConfigNotFound(_) => "config_not_found",
            Self::ConfigParse(_) => "config_parse_error",
            Self::ConfigValidation(_) => "config_validation_error",
            Self::Io(_) => "io_error",
        }
    }
}

// =============================================================================
// CONVERSIONS FROM MODULE-SPECIFIC ERRORS
// =============================================================================

impl From<AdapterError> for BeaconwatchError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::NotFound => Self::AdapterNotFound,
            AdapterError::NotReady(state) => Self::AdapterNotReady(state),
            AdapterError::ReadinessWaitInFlight => Self::ReadinessWaitInFlight,
            AdapterError::ScanStart(message) => Self::ScanStartFailed(message),
            AdapterError::Backend(message) => Self::AdapterBackend(message),
        }
    }
}

impl From<ScanError> for BeaconwatchError {
    fn from(err: ScanError) -> Self {
        match err {
            ScanError::Adapter(adapter_err) => adapter_err.into(),
            ScanError::AlreadyScanning => Self::AlreadyScanning,
        }
    }
}

impl From<ConfigError> for BeaconwatchError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound(path) => Self::ConfigNotFound(path),
            ConfigError::Read { path, source } | ConfigError::Write { path, source } => {
                Self::Io(std::io::Error::new(
                    source.kind(),
                    format!("{}: {source}", path.display()),
                ))
            }
            ConfigError::Parse(e) => Self::ConfigParse(e.to_string()),
            ConfigError::Serialize(e) => Self::ConfigParse(e.to_string()),
            ConfigError::Validation { field, message } => {
                Self::ConfigValidation(format!("{field}: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_error_classification() {
        assert!(BeaconwatchError::AdapterNotFound.is_adapter_error());
        assert!(BeaconwatchError::AdapterNotReady(AdapterState::PoweredOff).is_adapter_error());
        assert!(BeaconwatchError::ScanStartFailed("busy".into()).is_adapter_error());
        assert!(!BeaconwatchError::AlreadyScanning.is_adapter_error());
    }

    #[test]
    fn test_config_error_classification() {
        assert!(BeaconwatchError::ConfigNotFound(PathBuf::from("/x")).is_config_error());
        assert!(BeaconwatchError::ConfigParse("bad".into()).is_config_error());
        assert!(!BeaconwatchError::AdapterNotFound.is_config_error());
    }

    #[test]
    fn test_http_status_codes() {
        assert_eq!(BeaconwatchError::AlreadyScanning.http_status_code(), 409);
        assert_eq!(
            BeaconwatchError::ConfigNotFound(PathBuf::new()).http_status_code(),
            404
        );
        assert_eq!(
            BeaconwatchError::ConfigValidation("x".into()).http_status_code(),
            422
        );
        assert_eq!(BeaconwatchError::AdapterNotFound.http_status_code(), 503);
        assert_eq!(
            BeaconwatchError::AdapterNotReady(AdapterState::Unauthorized).http_status_code(),
            503
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(
            BeaconwatchError::AdapterNotFound.error_code(),
            "adapter_not_found"
        );
        assert_eq!(
            BeaconwatchError::AlreadyScanning.error_code(),
            "already_scanning"
        );
    }

    #[test]
    fn test_scan_error_conversion_flattens_adapter_errors() {
        let err: BeaconwatchError =
            ScanError::Adapter(AdapterError::NotReady(AdapterState::Resetting)).into();
        assert!(matches!(
            err,
            BeaconwatchError::AdapterNotReady(AdapterState::Resetting)
        ));

        let err: BeaconwatchError = ScanError::AlreadyScanning.into();
        assert!(matches!(err, BeaconwatchError::AlreadyScanning));
    }

    #[test]
    fn test_error_messages_name_the_state() {
        let err = BeaconwatchError::AdapterNotReady(AdapterState::Unauthorized);
        assert!(err.to_string().contains("unauthorized"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}
        assert_send::<BeaconwatchError>();
        assert_sync::<BeaconwatchError>();
    }
}
