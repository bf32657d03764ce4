//! # AMI lifecycle tool
//!
//! Create tagged machine images (AMIs) of EC2 instances on demand,
//! prune old ones while honoring a minimum retention count, and report
//! completion metrics to CloudWatch.
//!
//! The retention decision logic ([`retention`], [`correlate`],
//! [`duration`]) is pure and service-free; all cloud access goes
//! through the narrow traits in [`service`], implemented against the
//! AWS SDK in [`aws`].

pub mod aws;
pub mod cli;
pub mod correlate;
mod create;
mod delete;
pub mod duration;
mod error;
pub mod executor;
pub mod image;
mod report;
pub mod retention;
pub mod service;

#[cfg(test)]
pub(crate) mod testutil;

pub use error::{Error, Result};
