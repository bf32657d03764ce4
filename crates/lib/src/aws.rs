//! AWS SDK bindings for the service traits.
//!
//! This is thin glue: every method is one SDK call plus error
//! classification into the crate taxonomy. Nothing here makes retention
//! decisions.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_sdk_ec2::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_ec2::types::{Filter, Tag};
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::image::{Image, ImageState, Snapshot, INSTANCE_TAG};
use crate::service::{ImageService, MetricsService, SnapshotService};

/// Load the shared AWS configuration (credentials from the standard
/// provider chain) pinned to `region`.
pub async fn load_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_owned()))
        .load()
        .await
}

/// Sort an SDK failure into the crate taxonomy.
///
/// EC2 reports a dry-run request that would have succeeded as the error
/// code `DryRunOperation`; that maps to the non-error signal variant.
fn classify_sdk_error<E>(err: SdkError<E>) -> Error
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = ProvideErrorMetadata::code(&err).map(str::to_owned);
    let rendered = DisplayErrorContext(&err).to_string();
    match code.as_deref() {
        Some("DryRunOperation") => Error::DryRunOperation,
        Some("AuthFailure" | "UnauthorizedOperation" | "UnrecognizedClientException") => {
            Error::Auth(rendered)
        }
        // Missing credentials never reach the wire; they surface from
        // the credentials provider chain instead of as a service code.
        _ if rendered.contains("credentials") => Error::Auth(rendered),
        _ => Error::ExternalService(rendered),
    }
}

fn convert_image(image: aws_sdk_ec2::types::Image) -> Result<Image> {
    let id = image.image_id().unwrap_or_default().to_owned();
    let raw_created = image.creation_date().unwrap_or_default();
    let created = DateTime::parse_from_rfc3339(raw_created)
        .map_err(|e| {
            Error::ExternalService(format!(
                "image {id} has an unparseable creation date {raw_created:?}: {e}"
            ))
        })?
        .with_timezone(&Utc);
    Ok(Image {
        created,
        name: image.name().unwrap_or_default().to_owned(),
        owner_account_id: image.owner_id().unwrap_or_default().to_owned(),
        state: image
            .state()
            .map(|s| ImageState::from(s.as_str()))
            .unwrap_or_else(|| ImageState::Other(String::new())),
        id,
    })
}

/// EC2-backed implementation of [`ImageService`] and [`SnapshotService`].
#[derive(Clone, Debug)]
pub struct Ec2Service {
    client: aws_sdk_ec2::Client,
}

impl Ec2Service {
    /// Build an EC2 client from the shared configuration.
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_ec2::Client::new(config),
        }
    }
}

#[async_trait]
impl ImageService for Ec2Service {
    async fn create_image(
        &self,
        instance_id: &str,
        name: &str,
        dry_run: bool,
        no_reboot: bool,
    ) -> Result<String> {
        let resp = self
            .client
            .create_image()
            .instance_id(instance_id)
            .name(name)
            .dry_run(dry_run)
            .no_reboot(no_reboot)
            .send()
            .await
            .map_err(classify_sdk_error)?;
        resp.image_id
            .ok_or_else(|| Error::ExternalService("CreateImage returned no image id".to_owned()))
    }

    async fn find_images(&self, instance_id: &str) -> Result<Vec<Image>> {
        let filter = Filter::builder()
            .name(format!("tag:{INSTANCE_TAG}"))
            .values(instance_id)
            .build();

        let mut pages = self
            .client
            .describe_images()
            .filters(filter)
            .into_paginator()
            .send();

        let mut images = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(classify_sdk_error)?;
            for image in page.images.unwrap_or_default() {
                images.push(convert_image(image)?);
            }
        }
        tracing::debug!("found {} image(s) for instance {instance_id}", images.len());

        if images.is_empty() {
            return Err(Error::NoImagesFound(instance_id.to_owned()));
        }
        Ok(images)
    }

    async fn describe_image(&self, image_id: &str) -> Result<Option<Image>> {
        let resp = self
            .client
            .describe_images()
            .image_ids(image_id)
            .send()
            .await;
        let out = match resp {
            Ok(out) => out,
            // An id that is not visible yet is an error on the wire,
            // not an empty result.
            Err(err) if ProvideErrorMetadata::code(&err) == Some("InvalidAMIID.NotFound") => {
                return Ok(None);
            }
            Err(err) => return Err(classify_sdk_error(err)),
        };
        out.images
            .unwrap_or_default()
            .into_iter()
            .next()
            .map(convert_image)
            .transpose()
    }

    async fn deregister_image(&self, image_id: &str, dry_run: bool) -> Result<()> {
        self.client
            .deregister_image()
            .image_id(image_id)
            .dry_run(dry_run)
            .send()
            .await
            .map(|_| ())
            .map_err(classify_sdk_error)
    }

    async fn tag_image(&self, image_id: &str, tags: &[(String, String)]) -> Result<()> {
        let mut req = self.client.create_tags().resources(image_id);
        for (key, value) in tags {
            req = req.tags(Tag::builder().key(key).value(value).build());
        }
        req.send().await.map(|_| ()).map_err(classify_sdk_error)
    }

    async fn resolve_instance_name(&self, name: &str) -> Result<String> {
        let filter = Filter::builder().name("tag:Name").values(name).build();

        let mut pages = self
            .client
            .describe_instances()
            .filters(filter)
            .into_paginator()
            .send();

        let mut ids = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(classify_sdk_error)?;
            for reservation in page.reservations.unwrap_or_default() {
                for instance in reservation.instances.unwrap_or_default() {
                    if let Some(id) = instance.instance_id {
                        ids.push(id);
                    }
                }
            }
        }

        let mut ids = ids.into_iter();
        match (ids.next(), ids.next()) {
            (Some(id), None) => Ok(id),
            (None, _) => Err(Error::InstanceNotFound(name.to_owned())),
            (Some(_), Some(_)) => Err(Error::AmbiguousInstanceName(name.to_owned())),
        }
    }
}

#[async_trait]
impl SnapshotService for Ec2Service {
    async fn find_snapshots(&self, owner_account_id: &str) -> Result<Vec<Snapshot>> {
        let mut pages = self
            .client
            .describe_snapshots()
            .owner_ids(owner_account_id)
            .into_paginator()
            .send();

        let mut snapshots = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(classify_sdk_error)?;
            for snapshot in page.snapshots.unwrap_or_default() {
                snapshots.push(Snapshot {
                    id: snapshot.snapshot_id.unwrap_or_default(),
                    description: snapshot.description.unwrap_or_default(),
                    owner_account_id: snapshot.owner_id.unwrap_or_default(),
                });
            }
        }
        Ok(snapshots)
    }

    async fn delete_snapshot(&self, snapshot_id: &str, dry_run: bool) -> Result<()> {
        self.client
            .delete_snapshot()
            .snapshot_id(snapshot_id)
            .dry_run(dry_run)
            .send()
            .await
            .map(|_| ())
            .map_err(classify_sdk_error)
    }
}

/// CloudWatch-backed implementation of [`MetricsService`].
#[derive(Clone, Debug)]
pub struct CloudWatchService {
    client: aws_sdk_cloudwatch::Client,
}

impl CloudWatchService {
    /// Build a CloudWatch client from the shared configuration.
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_cloudwatch::Client::new(config),
        }
    }
}

#[async_trait]
impl MetricsService for CloudWatchService {
    async fn put_metric(&self, namespace: &str, name: &str, value: f64, unit: &str) -> Result<()> {
        let datum = aws_sdk_cloudwatch::types::MetricDatum::builder()
            .metric_name(name)
            .value(value)
            .unit(aws_sdk_cloudwatch::types::StandardUnit::from(unit))
            .build();
        self.client
            .put_metric_data()
            .namespace(namespace)
            .metric_data(datum)
            .send()
            .await
            .map(|_| ())
            .map_err(classify_sdk_error)
    }
}
