//! Narrow contracts for the external cloud collaborators.
//!
//! The workflows only ever talk to these traits; the AWS SDK bindings
//! live in [`crate::aws`] and the tests substitute in-memory fakes.
//! Every state-changing call takes `dry_run` as an explicit parameter
//! rather than a global toggle.

use async_trait::async_trait;

use crate::error::Result;
use crate::image::{Image, Snapshot};

/// Machine-image operations of the cloud compute service.
#[async_trait]
pub trait ImageService {
    /// Register a new image of `instance_id`. Returns the new image id.
    ///
    /// Under dry-run the service answers with
    /// [`crate::Error::DryRunOperation`] instead of creating anything.
    async fn create_image(
        &self,
        instance_id: &str,
        name: &str,
        dry_run: bool,
        no_reboot: bool,
    ) -> Result<String>;

    /// All images whose instance tag equals `instance_id` exactly.
    ///
    /// Fails with [`crate::Error::NoImagesFound`] when there are none
    /// and [`crate::Error::Auth`] when credentials are absent or
    /// invalid. No ordering guarantee.
    async fn find_images(&self, instance_id: &str) -> Result<Vec<Image>>;

    /// Look up a single image by id; `None` when not (yet) visible.
    async fn describe_image(&self, image_id: &str) -> Result<Option<Image>>;

    /// Deregister an image. A dry-run "would have succeeded" response
    /// surfaces as [`crate::Error::DryRunOperation`].
    async fn deregister_image(&self, image_id: &str, dry_run: bool) -> Result<()>;

    /// Attach `(key, value)` tags to an image.
    async fn tag_image(&self, image_id: &str, tags: &[(String, String)]) -> Result<()>;

    /// Resolve an instance Name tag to exactly one instance id.
    async fn resolve_instance_name(&self, name: &str) -> Result<String>;
}

/// Storage-snapshot operations of the cloud storage service.
#[async_trait]
pub trait SnapshotService {
    /// All snapshots owned by `owner_account_id`.
    async fn find_snapshots(&self, owner_account_id: &str) -> Result<Vec<Snapshot>>;

    /// Delete one snapshot. A dry-run "would have succeeded" response
    /// surfaces as [`crate::Error::DryRunOperation`].
    async fn delete_snapshot(&self, snapshot_id: &str, dry_run: bool) -> Result<()>;
}

/// The monitoring service consumed by `report`.
#[async_trait]
pub trait MetricsService {
    /// Publish one metric datum to `namespace`.
    async fn put_metric(&self, namespace: &str, name: &str, value: f64, unit: &str) -> Result<()>;
}
