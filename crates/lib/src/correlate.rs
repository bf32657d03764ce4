//! Correlation of images to their backing storage snapshots.

use std::collections::BTreeMap;

use crate::image::{Image, Snapshot};

/// Map each image to the ids of the snapshots backing it.
///
/// A snapshot belongs to an image iff the snapshot's description
/// contains the image's id as a literal substring. The storage service
/// does not expose a direct foreign key, so this is a deliberate
/// best-effort heuristic: an id that is a prefix of another id can match
/// descriptions for both, and all such matches are kept rather than
/// deduplicated away.
///
/// Every selected image gets an entry, possibly empty; an image with no
/// correlated snapshots is still deletable.
pub fn correlate(images: &[Image], all_snapshots: &[Snapshot]) -> BTreeMap<String, Vec<String>> {
    let mut correlation = BTreeMap::new();

    for image in images {
        let snapshot_ids: Vec<String> = all_snapshots
            .iter()
            .filter(|snapshot| snapshot.description.contains(&image.id))
            .map(|snapshot| snapshot.id.clone())
            .collect();

        tracing::debug!(
            "correlated {} snapshot(s) to image {}",
            snapshot_ids.len(),
            image.id
        );
        correlation.insert(image.id.clone(), snapshot_ids);
    }

    correlation
}
