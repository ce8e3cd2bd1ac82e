//! Gatekeeper error types

use thiserror::Error;

/// Errors that can occur during gatekeeper setup
///
/// Rejections of individual candidates are not errors; they are returned as
/// [`RejectionRecord`](linkedclaims_domain::RejectionRecord) values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatekeeperError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
