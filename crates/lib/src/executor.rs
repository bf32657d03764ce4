//! Sequential execution of a deletion pass.

use std::collections::BTreeMap;

use amicycle_utils::output;

use crate::error::{Error, Result};
use crate::image::Image;
use crate::service::{ImageService, SnapshotService};

/// Process one selected image after another: deregister it, then delete
/// its correlated snapshots in correlator order, then move on. Never
/// issues overlapping requests.
///
/// A dry-run "would have succeeded" signal counts as success. Any other
/// error aborts immediately, leaving later images untouched; completed
/// deletions are not rolled back. Returns the number of images fully
/// processed.
pub async fn execute(
    selection: &[Image],
    correlation: &BTreeMap<String, Vec<String>>,
    dry_run: bool,
    images: &dyn ImageService,
    snapshots: &dyn SnapshotService,
) -> Result<usize> {
    let mut deleted = 0;

    for image in selection {
        output(format!(
            "{}: De-registering AMI named \"{}\"...",
            image.id, image.name
        ));
        match images.deregister_image(&image.id, dry_run).await {
            // Simulated success under dry-run is not an error.
            Err(Error::DryRunOperation) => {
                tracing::debug!("dry run: deregistering {} was simulated", image.id);
            }
            other => other?,
        }

        // Zero correlated snapshots is fine; the image itself is gone.
        let empty = Vec::new();
        let snapshot_ids = correlation.get(&image.id).unwrap_or(&empty);
        output(format!(
            "{}: Found {} snapshot(s) to delete",
            image.id,
            snapshot_ids.len()
        ));

        for snapshot_id in snapshot_ids {
            output(format!("{}: Deleting snapshot {snapshot_id}...", image.id));
            match snapshots.delete_snapshot(snapshot_id, dry_run).await {
                Err(Error::DryRunOperation) => {
                    tracing::debug!("dry run: deleting {snapshot_id} was simulated");
                }
                other => other?,
            }
        }

        output(format!("{}: Done!", image.id));
        output("");
        deleted += 1;
    }

    Ok(deleted)
}
