//! Data model for machine images and their backing snapshots.

use chrono::{DateTime, Utc};

/// The metadata tag recording which instance an image was created from.
/// This tag is the sole durable linkage between an image and its
/// originating instance; `delete` filters on it.
pub const INSTANCE_TAG: &str = "amicycle-instance-id";

/// Lifecycle status reported by the image service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageState {
    /// Registration in progress.
    Pending,
    /// Ready for use.
    Available,
    /// Registration failed on the service side.
    Failed,
    /// Any other state the service may report.
    Other(String),
}

impl From<&str> for ImageState {
    fn from(s: &str) -> Self {
        match s {
            "pending" => ImageState::Pending,
            "available" => ImageState::Available,
            "failed" => ImageState::Failed,
            other => ImageState::Other(other.to_owned()),
        }
    }
}

/// One point-in-time machine image. Created by the `create` workflow,
/// read-only thereafter, destroyed by the deletion executor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    /// Opaque identifier assigned by the service at creation time.
    pub id: String,
    /// Human-chosen label with the creation timestamp appended.
    pub name: String,
    /// Assigned once at creation, immutable.
    pub created: DateTime<Utc>,
    /// Identifier of the owning account; scopes snapshot lookups.
    pub owner_account_id: String,
    /// Lifecycle status.
    pub state: ImageState,
}

impl Image {
    /// Age of this image relative to `now`, in fractional hours.
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        let age = now.signed_duration_since(self.created);
        age.num_milliseconds() as f64 / (1000.0 * 3600.0)
    }
}

/// A storage-level backing object correlated to an image via its
/// description field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Snapshot {
    /// Opaque identifier assigned by the storage service.
    pub id: String,
    /// Free-form description; contains the backing image's id when the
    /// snapshot was created by an image registration.
    pub description: String,
    /// Identifier of the owning account.
    pub owner_account_id: String,
}
