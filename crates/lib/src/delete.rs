//! Implementation of `delete`: prune images by age under a retention
//! floor, deleting their backing snapshots along the way.

use anyhow::Result;
use chrono::{DateTime, Utc};
use fn_error_context::context;

use amicycle_utils::{output, success, warning};

use crate::cli::{DeleteArgs, DeleteOpts};
use crate::correlate::correlate;
use crate::duration::parse_older_than;
use crate::executor::execute;
use crate::retention::{select, RetentionPolicy};
use crate::service::{ImageService, SnapshotService};

/// Entry point for the `delete` subcommand.
pub(crate) async fn run(opts: &DeleteOpts) -> Result<()> {
    let args = opts.validated()?;
    let config = crate::aws::load_config(&args.region).await;
    let ec2 = crate::aws::Ec2Service::new(&config);
    prune(&args, &ec2, &ec2, Utc::now()).await
}

/// The whole pruning pass: inventory, selection, correlation, execution.
#[context("pruning images")]
pub(crate) async fn prune(
    args: &DeleteArgs,
    images: &dyn ImageService,
    snapshots: &dyn SnapshotService,
    now: DateTime<Utc>,
) -> Result<()> {
    // Malformed expressions must fail before any service call.
    let older_than_hours = parse_older_than(&args.older_than)?;

    if args.dry_run {
        warning(
            "WARNING: This is a dry run, and no actions will be taken, despite \
             what any output may say!",
        );
    }

    let instance_id = args.target.resolve(images).await?;
    let inventory = images.find_images(&instance_id).await?;

    let policy = RetentionPolicy {
        older_than_hours,
        require_at_least: args.require_at_least,
    };

    // At or below the floor nothing can ever be deleted, so skip the
    // snapshot lookup entirely.
    if inventory.len() <= policy.require_at_least as usize {
        success(format!(
            "NO ACTION TAKEN. There are currently {} AMIs, and --require-at-least={} \
             so no further action can be taken.",
            inventory.len(),
            policy.require_at_least
        ));
        return Ok(());
    }

    let eligible = inventory
        .iter()
        .filter(|image| image.age_hours(now) > policy.older_than_hours)
        .count();
    output(format!("==> Found {eligible} total AMI(s) for deletion."));

    let selection = select(&inventory, &policy, now);
    if selection.len() < eligible {
        output(format!(
            "==> Only deleting {} total AMIs to honor '--require-at-least={}'.",
            selection.len(),
            policy.require_at_least
        ));
    }
    if selection.is_empty() {
        warning("No AMIs to delete.");
        return Ok(());
    }

    // Scope the snapshot lookup to the account owning these images.
    let owner_account_id = selection[0].owner_account_id.clone();
    output(format!(
        "==> Identified current AWS account id as {owner_account_id}"
    ));

    let all_snapshots = snapshots.find_snapshots(&owner_account_id).await?;
    output(format!(
        "==> Found {} total snapshot(s) in this account.",
        all_snapshots.len()
    ));

    let correlation = correlate(&selection, &all_snapshots);
    let deleted = execute(&selection, &correlation, args.dry_run, images, snapshots).await?;

    if args.dry_run {
        success(format!(
            "==> DRY RUN. Had this not been a dry run, {deleted} AMI(s) and their \
             corresponding snapshots would have been deleted."
        ));
    } else {
        success(format!(
            "==> Success! Deleted {deleted} AMI(s) and their corresponding snapshots."
        ));
    }
    Ok(())
}
