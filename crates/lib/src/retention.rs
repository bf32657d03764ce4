//! The retention-pruning decision engine.
//!
//! Given the full inventory of images for an instance, an age threshold
//! and a minimum-retained-count floor, [`select`] computes exactly which
//! images are safe to delete. It is a pure function: no service calls,
//! no clock reads, no hidden state.

use chrono::{DateTime, Utc};

use crate::image::Image;

/// Immutable input to [`select`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetentionPolicy {
    /// Images strictly older than this many hours are eligible for
    /// deletion. An image aged exactly this value is retained.
    pub older_than_hours: f64,
    /// Never delete so many images that fewer than this number remain.
    pub require_at_least: u32,
}

/// Select the images eligible for deletion under `policy`, oldest first.
///
/// The returned order is the order the deletion executor processes, and
/// it is what makes the floor exemption deterministic: when honoring the
/// floor forces us to keep some age-eligible images, the most recently
/// created ones are the ones exempted.
///
/// Invariant: `all_images.len() - result.len() >= require_at_least`.
pub fn select(all_images: &[Image], policy: &RetentionPolicy, now: DateTime<Utc>) -> Vec<Image> {
    let total = all_images.len();
    let floor = policy.require_at_least as usize;

    // Already at or below the floor: nothing can ever be deleted, so
    // don't even bother age-filtering.
    if total <= floor {
        return Vec::new();
    }

    let mut eligible: Vec<Image> = all_images
        .iter()
        .filter(|image| image.age_hours(now) > policy.older_than_hours)
        .cloned()
        .collect();

    if eligible.is_empty() {
        // A normal "nothing to do" outcome, distinct from the inventory
        // lookup finding no images at all.
        return eligible;
    }

    // Oldest first; ties broken by id so the result is deterministic.
    eligible.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));

    // If deleting every eligible image would leave fewer than the floor,
    // exempt the newest eligible ones by truncating the oldest-first list.
    let remaining = total - eligible.len();
    if remaining < floor {
        let excess = floor - remaining;
        eligible.truncate(eligible.len() - excess);
    }

    eligible
}
