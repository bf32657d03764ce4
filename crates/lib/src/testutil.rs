//! In-memory stand-ins for the cloud collaborators, shared by the
//! workflow and executor tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::image::{Image, ImageState, Snapshot, INSTANCE_TAG};
use crate::service::{ImageService, MetricsService, SnapshotService};

/// One recorded request against the fake cloud.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FakeCall {
    CreateImage(String),
    Deregister(String),
    DeleteSnapshot(String),
    TagImage(String),
    PutMetric {
        namespace: String,
        name: String,
        value: f64,
        unit: String,
    },
}

#[derive(Debug, Default)]
struct FakeState {
    /// Registered images and the instance tag attached to each, if any.
    images: Vec<(Image, Option<String>)>,
    snapshots: Vec<Snapshot>,
    calls: Vec<FakeCall>,
    /// Image ids that stay invisible to describe_image for N more calls.
    hidden: HashMap<String, u32>,
    /// Snapshot ids whose deletion fails.
    failing_snapshots: Vec<String>,
    /// Image ids whose deregistration fails.
    failing_images: Vec<String>,
    /// Name tag -> matching instance ids.
    instance_names: HashMap<String, Vec<String>>,
    /// State assigned to the next created image.
    next_state: Option<ImageState>,
    created_serial: u32,
}

/// An in-memory cloud implementing all three service traits.
#[derive(Debug, Default)]
pub(crate) struct FakeCloud {
    state: Mutex<FakeState>,
}

impl FakeCloud {
    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect("fake cloud lock poisoned")
    }

    pub(crate) fn insert_image(&self, image: Image, instance_id: &str) {
        self.lock()
            .images
            .push((image, Some(instance_id.to_owned())));
    }

    pub(crate) fn insert_snapshot(&self, snapshot: Snapshot) {
        self.lock().snapshots.push(snapshot);
    }

    pub(crate) fn register_instance_name(&self, name: &str, ids: &[&str]) {
        self.lock()
            .instance_names
            .insert(name.to_owned(), ids.iter().map(|s| s.to_string()).collect());
    }

    pub(crate) fn hide_image_for(&self, image_id: &str, calls: u32) {
        self.lock().hidden.insert(image_id.to_owned(), calls);
    }

    pub(crate) fn fail_snapshot_deletion(&self, snapshot_id: &str) {
        self.lock().failing_snapshots.push(snapshot_id.to_owned());
    }

    pub(crate) fn fail_image_deregistration(&self, image_id: &str) {
        self.lock().failing_images.push(image_id.to_owned());
    }

    pub(crate) fn set_next_image_state(&self, state: ImageState) {
        self.lock().next_state = Some(state);
    }

    pub(crate) fn calls(&self) -> Vec<FakeCall> {
        self.lock().calls.clone()
    }

    pub(crate) fn image_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().images.iter().map(|(i, _)| i.id.clone()).collect();
        ids.sort();
        ids
    }

    pub(crate) fn snapshot_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.lock().snapshots.iter().map(|s| s.id.clone()).collect();
        ids.sort();
        ids
    }

    pub(crate) fn tags_of(&self, image_id: &str) -> Option<String> {
        self.lock()
            .images
            .iter()
            .find(|(i, _)| i.id == image_id)
            .and_then(|(_, tag)| tag.clone())
    }
}

#[async_trait]
impl ImageService for FakeCloud {
    async fn create_image(
        &self,
        _instance_id: &str,
        name: &str,
        dry_run: bool,
        _no_reboot: bool,
    ) -> Result<String> {
        let mut state = self.lock();
        state.calls.push(FakeCall::CreateImage(name.to_owned()));
        if dry_run {
            return Err(Error::DryRunOperation);
        }
        state.created_serial += 1;
        let id = format!("ami-fake{}", state.created_serial);
        let image = Image {
            id: id.clone(),
            name: name.to_owned(),
            created: chrono::Utc::now(),
            owner_account_id: "123456789012".to_owned(),
            state: state.next_state.take().unwrap_or(ImageState::Available),
        };
        state.images.push((image, None));
        Ok(id)
    }

    async fn find_images(&self, instance_id: &str) -> Result<Vec<Image>> {
        let images: Vec<Image> = self
            .lock()
            .images
            .iter()
            .filter(|(_, tag)| tag.as_deref() == Some(instance_id))
            .map(|(i, _)| i.clone())
            .collect();
        if images.is_empty() {
            return Err(Error::NoImagesFound(instance_id.to_owned()));
        }
        Ok(images)
    }

    async fn describe_image(&self, image_id: &str) -> Result<Option<Image>> {
        let mut state = self.lock();
        if let Some(remaining) = state.hidden.get_mut(image_id) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(None);
            }
        }
        Ok(state
            .images
            .iter()
            .find(|(i, _)| i.id == image_id)
            .map(|(i, _)| i.clone()))
    }

    async fn deregister_image(&self, image_id: &str, dry_run: bool) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(FakeCall::Deregister(image_id.to_owned()));
        if dry_run {
            return Err(Error::DryRunOperation);
        }
        if state.failing_images.iter().any(|id| id == image_id) {
            return Err(Error::ExternalService(format!(
                "deregistration of {image_id} refused"
            )));
        }
        state.images.retain(|(i, _)| i.id != image_id);
        Ok(())
    }

    async fn tag_image(&self, image_id: &str, tags: &[(String, String)]) -> Result<()> {
        let mut state = self.lock();
        state.calls.push(FakeCall::TagImage(image_id.to_owned()));
        for (key, value) in tags {
            if key == INSTANCE_TAG {
                for (image, tag) in &mut state.images {
                    if image.id == image_id {
                        *tag = Some(value.clone());
                    }
                }
            }
        }
        Ok(())
    }

    async fn resolve_instance_name(&self, name: &str) -> Result<String> {
        let state = self.lock();
        let matches = state.instance_names.get(name).cloned().unwrap_or_default();
        match matches.as_slice() {
            [] => Err(Error::InstanceNotFound(name.to_owned())),
            [one] => Ok(one.clone()),
            _ => Err(Error::AmbiguousInstanceName(name.to_owned())),
        }
    }
}

#[async_trait]
impl SnapshotService for FakeCloud {
    async fn find_snapshots(&self, owner_account_id: &str) -> Result<Vec<Snapshot>> {
        Ok(self
            .lock()
            .snapshots
            .iter()
            .filter(|s| s.owner_account_id == owner_account_id)
            .cloned()
            .collect())
    }

    async fn delete_snapshot(&self, snapshot_id: &str, dry_run: bool) -> Result<()> {
        let mut state = self.lock();
        state
            .calls
            .push(FakeCall::DeleteSnapshot(snapshot_id.to_owned()));
        if dry_run {
            return Err(Error::DryRunOperation);
        }
        if state.failing_snapshots.iter().any(|id| id == snapshot_id) {
            return Err(Error::ExternalService(format!(
                "deletion of {snapshot_id} refused"
            )));
        }
        state.snapshots.retain(|s| s.id != snapshot_id);
        Ok(())
    }
}

#[async_trait]
impl MetricsService for FakeCloud {
    async fn put_metric(&self, namespace: &str, name: &str, value: f64, unit: &str) -> Result<()> {
        self.lock().calls.push(FakeCall::PutMetric {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
            value,
            unit: unit.to_owned(),
        });
        Ok(())
    }
}
