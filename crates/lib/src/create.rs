//! Implementation of `create`: register a tagged image of an instance.

use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use fn_error_context::context;

use amicycle_utils::{image_name_timestamp, output, success};

use crate::cli::{CreateArgs, CreateOpts};
use crate::error::Error;
use crate::image::{ImageState, INSTANCE_TAG};
use crate::service::ImageService;

/// How many times a freshly registered image is looked up before
/// giving up on it ever becoming visible.
const VISIBILITY_ATTEMPTS: u32 = 10;
/// Pause between visibility lookups.
const VISIBILITY_DELAY: Duration = Duration::from_millis(500);

/// Entry point for the `create` subcommand.
pub(crate) async fn run(opts: &CreateOpts) -> Result<()> {
    let args = opts.validated()?;
    let config = crate::aws::load_config(&args.region).await;
    let ec2 = crate::aws::Ec2Service::new(&config);
    create_image(&args, &ec2, VISIBILITY_ATTEMPTS, VISIBILITY_DELAY).await?;
    Ok(())
}

/// Create, tag and verify a new image. Returns the new image id, or
/// `None` when the run was simulated under `--dry-run`.
#[context("creating image")]
pub(crate) async fn create_image(
    args: &CreateArgs,
    images: &dyn ImageService,
    attempts: u32,
    delay: Duration,
) -> Result<Option<String>> {
    let instance_id = args.target.resolve(images).await?;

    let name = format!(
        "{} - {}",
        args.ami_name,
        image_name_timestamp(Utc::now())
    );

    output(format!("==> Creating AMI for {instance_id}..."));
    let image_id = match images
        .create_image(&instance_id, &name, args.dry_run, args.no_reboot)
        .await
    {
        Err(Error::DryRunOperation) => {
            success(format!(
                "==> DRY RUN. Had this not been a dry run, an AMI named \"{name}\" \
                 would have been created."
            ));
            return Ok(None);
        }
        other => other?,
    };

    // The image service is eventually consistent; a lookup right after
    // registration can miss the new image.
    wait_for_image(images, &image_id, attempts, delay).await?;

    // This tag is what `delete` filters on later.
    output(format!("==> Adding tags to AMI {image_id}..."));
    images
        .tag_image(
            &image_id,
            &[
                (INSTANCE_TAG.to_owned(), instance_id.clone()),
                ("Name".to_owned(), args.ami_name.clone()),
            ],
        )
        .await?;

    let image = images
        .describe_image(&image_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("could not find the AMI just created ({image_id})"))?;
    if image.state == ImageState::Failed {
        anyhow::bail!(
            "AMI {image_id} was created but entered a state of 'failed'; this is a \
             service-side issue, re-run this command and deregister the failed AMI \
             manually in the console or via the API"
        );
    }

    success(format!("==> Success! Created {image_id} named \"{name}\""));
    Ok(Some(image_id))
}

/// Poll until the newly registered image becomes visible.
async fn wait_for_image(
    images: &dyn ImageService,
    image_id: &str,
    attempts: u32,
    delay: Duration,
) -> Result<()> {
    for attempt in 1..=attempts {
        if images.describe_image(image_id).await?.is_some() {
            return Ok(());
        }
        tracing::debug!("image {image_id} not visible yet (attempt {attempt}/{attempts})");
        tokio::time::sleep(delay).await;
    }
    anyhow::bail!("image {image_id} did not become visible after {attempts} lookups")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::InstanceTarget;
    use crate::testutil::FakeCloud;

    fn args(dry_run: bool) -> CreateArgs {
        CreateArgs {
            region: "us-east-1".to_owned(),
            target: InstanceTarget::Id("i-abc123".to_owned()),
            ami_name: "nightly backup".to_owned(),
            dry_run,
            no_reboot: true,
        }
    }

    #[tokio::test]
    async fn test_creates_tags_and_verifies() {
        let cloud = FakeCloud::default();
        let id = create_image(&args(false), &cloud, 3, Duration::ZERO)
            .await
            .unwrap()
            .expect("an image id");

        assert_eq!(cloud.image_ids(), [id.clone()]);
        // The instance tag is the durable linkage `delete` consumes.
        assert_eq!(cloud.tags_of(&id).as_deref(), Some("i-abc123"));
        // The image exists and carries a timestamped name.
        let image = cloud.describe_image(&id).await.unwrap().unwrap();
        assert!(image.name.starts_with("nightly backup - "));
        assert!(image.name.ends_with("(UTC)"));
    }

    #[tokio::test]
    async fn test_dry_run_creates_nothing() {
        let cloud = FakeCloud::default();
        let created = create_image(&args(true), &cloud, 3, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(created, None);
        assert!(cloud.image_ids().is_empty());
    }

    #[tokio::test]
    async fn test_polls_past_slow_visibility() {
        let cloud = FakeCloud::default();
        // The fake assigns ids sequentially, so the new image will be
        // ami-fake1; keep it invisible for the first two lookups.
        cloud.hide_image_for("ami-fake1", 2);

        let id = create_image(&args(false), &cloud, 5, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(id.as_deref(), Some("ami-fake1"));
    }

    #[tokio::test]
    async fn test_visibility_poll_is_bounded() {
        let cloud = FakeCloud::default();
        cloud.hide_image_for("ami-fake1", u32::MAX);

        let err = create_image(&args(false), &cloud, 3, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("creating image"));
        assert!(format!("{err:#}").contains("did not become visible"));
    }

    #[tokio::test]
    async fn test_failed_image_state_is_an_error() {
        let cloud = FakeCloud::default();
        cloud.set_next_image_state(ImageState::Failed);

        let err = create_image(&args(false), &cloud, 3, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("state of 'failed'"));
    }

    #[tokio::test]
    async fn test_resolves_instance_name_first() {
        let cloud = FakeCloud::default();
        cloud.register_instance_name("web", &["i-xyz789"]);

        let mut by_name = args(false);
        by_name.target = InstanceTarget::Name("web".to_owned());

        let id = create_image(&by_name, &cloud, 3, Duration::ZERO)
            .await
            .unwrap()
            .expect("an image id");
        assert_eq!(cloud.tags_of(&id).as_deref(), Some("i-xyz789"));
    }
}
