//! The error taxonomy shared by every workflow.
//!
//! Everything here exits the process with status 1; the distinctions
//! exist so callers (and tests) can tell a bad argument from a missing
//! credential from a genuine service failure.

/// Result type used throughout this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors surfaced by amicycle operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Bad or missing command-line arguments; detected before any
    /// service call is made.
    #[error("{0}")]
    Validation(String),

    /// No usable AWS credentials.
    #[error(
        "no AWS credentials were found; either set the environment variables \
         AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY, or run this program on \
         an EC2 instance that has an IAM role with the appropriate \
         permissions: {0}"
    )]
    Auth(String),

    /// An instance name tag resolved to zero instances.
    #[error("no instance found with a Name tag of \"{0}\"")]
    InstanceNotFound(String),

    /// An instance name tag resolved to more than one instance.
    #[error("multiple instances found with a Name tag of \"{0}\"; use --instance-id instead")]
    AmbiguousInstanceName(String),

    /// The inventory lookup found no images for the instance.
    #[error("no AMIs were found for EC2 instance \"{0}\"")]
    NoImagesFound(String),

    /// A malformed relative-age expression.
    #[error("the --older-than value of \"{0}\" is not formatted properly; use formats like 30d or 24h")]
    InvalidFormat(String),

    /// The service's signal that a dry-run request would have
    /// succeeded. This is not a failure; workflows special-case it
    /// against real errors.
    #[error("dry run operation would have succeeded")]
    DryRunOperation,

    /// Any other service failure, propagated verbatim and never retried.
    #[error("{0}")]
    ExternalService(String),
}
