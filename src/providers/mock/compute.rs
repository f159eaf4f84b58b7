use super::{MockCloud, Paging, Shared, Slot, paginate};
use crate::config::BridgeConfig;
use crate::error::{CloudError, CloudResult, ErrorKind};
use crate::naming;
use crate::pagination::{ResultList, resolve_limit};
use crate::resources::{
    BlockSource, Instance, InstanceSpec, LaunchConfig, MachineImage, Region, Snapshot, VmType,
    Volume,
};
use crate::retry::{RetryConfig, retry_with_backoff};
use crate::services::{
    ComputeService, ImageService, InstanceService, RegionService, ResourceService,
    SnapshotService, VmTypeService, VolumeService,
};
use crate::status::{OPENSTACK_IMAGE, OPENSTACK_INSTANCE, OPENSTACK_SNAPSHOT, OPENSTACK_VOLUME};
use std::sync::Arc;
use std::time::Duration;

/// Attempts made by `create_image` while the instance refuses to be captured.
const IMAGE_CAPTURE_ATTEMPTS: u32 = 3;
const IMAGE_CAPTURE_DELAY: Duration = Duration::from_millis(20);

pub struct MockComputeService {
    instances: MockInstanceService,
    volumes: MockVolumeService,
    snapshots: MockSnapshotService,
    images: MockImageService,
    vm_types: MockVmTypeService,
    regions: MockRegionService,
}

impl MockComputeService {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            instances: MockInstanceService {
                shared: Arc::clone(&shared),
            },
            volumes: MockVolumeService {
                shared: Arc::clone(&shared),
            },
            snapshots: MockSnapshotService {
                shared: Arc::clone(&shared),
            },
            images: MockImageService {
                shared: Arc::clone(&shared),
            },
            vm_types: MockVmTypeService {
                shared: Arc::clone(&shared),
            },
            regions: MockRegionService { shared },
        }
    }
}

impl ComputeService for MockComputeService {
    fn instances(&self) -> &dyn InstanceService {
        &self.instances
    }

    fn volumes(&self) -> &dyn VolumeService {
        &self.volumes
    }

    fn snapshots(&self) -> &dyn SnapshotService {
        &self.snapshots
    }

    fn images(&self) -> &dyn ImageService {
        &self.images
    }

    fn vm_types(&self) -> &dyn VmTypeService {
        &self.vm_types
    }

    fn regions(&self) -> &dyn RegionService {
        &self.regions
    }
}

// ============================================================================
// Instances
// ============================================================================

pub struct MockInstanceService {
    shared: Arc<Shared>,
}

stateful_service!(
    MockInstanceService,
    Instance,
    instances,
    OPENSTACK_INSTANCE,
    Paging::Server
);

/// Check every block device source exists and the root disk fits the image.
fn check_launch_config(
    cloud: &MockCloud,
    launch_config: &LaunchConfig,
    min_disk_gb: Option<u32>,
) -> CloudResult<()> {
    for (index, device) in launch_config.block_devices().iter().enumerate() {
        let missing = match &device.source {
            Some(BlockSource::Image(id)) => (!cloud.images.contains_key(id)).then_some(id),
            Some(BlockSource::Volume(id)) => (!cloud.volumes.contains_key(id)).then_some(id),
            Some(BlockSource::Snapshot(id)) => (!cloud.snapshots.contains_key(id)).then_some(id),
            Some(BlockSource::Blank) | None => None,
        };
        if let Some(id) = missing {
            return Err(CloudError::invalid_configuration(format!(
                "Block device {index} refers to {id}, which does not exist"
            )));
        }

        if device.is_root
            && let (Some(size), Some(min)) = (device.size_gb, min_disk_gb)
            && size < min
        {
            return Err(CloudError::invalid_configuration(format!(
                "Root device is {size} GB but the image needs at least {min} GB"
            )));
        }
    }
    Ok(())
}

fn private_ip(seq: u64) -> String {
    format!("10.0.{}.{}", (seq / 250) % 256, seq % 250 + 4)
}

impl MockInstanceService {
    fn capture_image(&self, id: &str, label: &str) -> CloudResult<MachineImage> {
        self.shared.check_fault("instances.create_image")?;
        let name = naming::generate_name(Some(label), "cb-img")?;

        let mut cloud = self.shared.cloud();
        let instance = cloud
            .instances
            .get(id)
            .ok_or_else(|| CloudError::not_found("Instance", id))?;
        let min_disk_gb = cloud
            .images
            .get(&instance.resource().image_id)
            .and_then(|image| image.resource().min_disk_gb);

        let image_id = self.shared.next_id("img");
        let image = MachineImage {
            id: image_id.clone(),
            name,
            label: Some(label.to_string()),
            state: OPENSTACK_IMAGE.translate("saving"),
            min_disk_gb,
            description: Some(format!("Captured from instance {id}")),
        };
        let slot = Slot::new(image, "saving", "active", self.shared.settle_after());
        let snapshot = slot.peek(&OPENSTACK_IMAGE);
        cloud.images.insert(image_id, slot);
        tracing::debug!(instance = id, image = %snapshot.id, "capturing machine image");
        Ok(snapshot)
    }
}

impl InstanceService for MockInstanceService {
    fn create(&self, spec: &InstanceSpec) -> CloudResult<Instance> {
        self.shared.check_fault("instances.create")?;
        let name = naming::generate_name(Some(&spec.label), "cb-inst")?;

        let mut cloud = self.shared.cloud();
        let min_disk_gb = cloud
            .images
            .get(&spec.image_id)
            .ok_or_else(|| CloudError::not_found("Machine image", &spec.image_id))?
            .resource()
            .min_disk_gb;
        if !cloud.vm_types.iter().any(|vm_type| vm_type.id == spec.vm_type_id) {
            return Err(CloudError::not_found("VM type", &spec.vm_type_id));
        }

        let subnet_zone = match &spec.subnet_id {
            Some(subnet_id) => cloud
                .subnets
                .get(subnet_id)
                .ok_or_else(|| CloudError::not_found("Subnet", subnet_id))?
                .resource()
                .zone
                .clone(),
            None => None,
        };
        if let Some(key_name) = &spec.key_pair_name
            && !cloud.key_pairs.contains_key(key_name)
        {
            return Err(CloudError::not_found("Key pair", key_name));
        }
        if let Some(missing) = spec
            .firewall_ids
            .iter()
            .find(|id| !cloud.firewalls.contains_key(id.as_str()))
        {
            return Err(CloudError::not_found("VM firewall", missing));
        }
        if let Some(launch_config) = &spec.launch_config {
            check_launch_config(&cloud, launch_config, min_disk_gb)?;
        }

        let seq = self.shared.next_seq();
        let id = format!("inst-{seq:06}");
        let instance = Instance {
            id: id.clone(),
            name,
            label: Some(spec.label.clone()),
            state: OPENSTACK_INSTANCE.translate("BUILD"),
            image_id: spec.image_id.clone(),
            vm_type_id: spec.vm_type_id.clone(),
            subnet_id: spec.subnet_id.clone(),
            key_pair_id: spec.key_pair_name.clone(),
            firewall_ids: spec.firewall_ids.clone(),
            public_ips: Vec::new(),
            private_ips: vec![private_ip(seq)],
            zone: spec
                .zone
                .clone()
                .or(subnet_zone)
                .or_else(|| self.shared.config.zone.clone()),
        };
        let slot = Slot::new(instance, "BUILD", "ACTIVE", self.shared.settle_after());
        let snapshot = slot.peek(&OPENSTACK_INSTANCE);
        cloud.instances.insert(id, slot);
        tracing::debug!(id = %snapshot.id, name = %snapshot.name, "launched instance");
        Ok(snapshot)
    }

    fn delete(&self, id: &str) -> CloudResult<bool> {
        self.shared.check_fault("instances.delete")?;
        let mut cloud = self.shared.cloud();
        let Some(slot) = cloud.instances.remove(id) else {
            return Ok(false);
        };

        for volume in cloud.volumes.values_mut() {
            if volume.resource().attached_to.as_deref() == Some(id) {
                let resource = volume.resource_mut();
                resource.attached_to = None;
                resource.device = None;
                volume.force("available");
            }
        }
        let private_ips = &slot.resource().private_ips;
        for fip in cloud.floating_ips.values_mut() {
            if fip
                .resource()
                .private_ip
                .as_ref()
                .is_some_and(|ip| private_ips.contains(ip))
            {
                fip.resource_mut().private_ip = None;
                fip.force("DOWN");
            }
        }
        tracing::debug!(id, "deleted instance");
        Ok(true)
    }

    fn reboot(&self, id: &str) -> CloudResult<bool> {
        self.shared.check_fault("instances.reboot")?;
        let settle = self.shared.settle_after();
        Ok(self.shared.cloud().instances.get_mut(id).is_some_and(|slot| {
            slot.transition("REBOOT", "ACTIVE", settle);
            tracing::debug!(id, "rebooting instance");
            true
        }))
    }

    fn stop(&self, id: &str) -> CloudResult<bool> {
        self.shared.check_fault("instances.stop")?;
        Ok(self.shared.cloud().instances.get_mut(id).is_some_and(|slot| {
            slot.force("SHUTOFF");
            tracing::debug!(id, "stopped instance");
            true
        }))
    }

    fn start(&self, id: &str) -> CloudResult<bool> {
        self.shared.check_fault("instances.start")?;
        let settle = self.shared.settle_after();
        Ok(self.shared.cloud().instances.get_mut(id).is_some_and(|slot| {
            let now = slot.status();
            slot.transition(now, "ACTIVE", settle);
            tracing::debug!(id, "starting instance");
            true
        }))
    }

    fn create_image(&self, id: &str, label: &str) -> CloudResult<MachineImage> {
        let retry = RetryConfig::fixed(IMAGE_CAPTURE_ATTEMPTS, IMAGE_CAPTURE_DELAY);
        retry_with_backoff(&retry, || self.capture_image(id, label))
    }

    fn add_floating_ip(&self, id: &str, floating_ip_id: &str) -> CloudResult<()> {
        self.shared.check_fault("instances.add_floating_ip")?;
        let mut guard = self.shared.cloud();
        let cloud = &mut *guard;
        let instance = cloud
            .instances
            .get_mut(id)
            .ok_or_else(|| CloudError::not_found("Instance", id))?;
        let fip = cloud
            .floating_ips
            .get_mut(floating_ip_id)
            .ok_or_else(|| CloudError::not_found("Floating IP", floating_ip_id))?;

        if fip.resource().in_use() {
            return Err(CloudError::invalid_value(format!(
                "Floating IP {} is already in use",
                fip.resource().public_ip
            )));
        }

        let private_ip = instance.resource().private_ips.first().cloned();
        fip.resource_mut().private_ip = private_ip;
        fip.force("ACTIVE");
        let public_ip = fip.resource().public_ip.clone();
        tracing::debug!(id, %public_ip, "associated floating IP");
        instance.resource_mut().public_ips.push(public_ip);
        Ok(())
    }

    fn remove_floating_ip(&self, id: &str, floating_ip_id: &str) -> CloudResult<()> {
        self.shared.check_fault("instances.remove_floating_ip")?;
        let mut guard = self.shared.cloud();
        let cloud = &mut *guard;
        let instance = cloud
            .instances
            .get_mut(id)
            .ok_or_else(|| CloudError::not_found("Instance", id))?;
        let fip = cloud
            .floating_ips
            .get_mut(floating_ip_id)
            .ok_or_else(|| CloudError::not_found("Floating IP", floating_ip_id))?;

        let attached = fip
            .resource()
            .private_ip
            .as_ref()
            .is_some_and(|ip| instance.resource().private_ips.contains(ip));
        if !attached {
            return Err(CloudError::invalid_value(format!(
                "Floating IP {} is not associated with instance {id}",
                fip.resource().public_ip
            )));
        }

        fip.resource_mut().private_ip = None;
        fip.force("DOWN");
        let public_ip = &fip.resource().public_ip;
        instance
            .resource_mut()
            .public_ips
            .retain(|ip| ip != public_ip);
        tracing::debug!(id, %public_ip, "disassociated floating IP");
        Ok(())
    }
}

// ============================================================================
// Volumes and snapshots
// ============================================================================

pub struct MockVolumeService {
    shared: Arc<Shared>,
}

stateful_service!(
    MockVolumeService,
    Volume,
    volumes,
    OPENSTACK_VOLUME,
    Paging::Server
);

struct NewVolume<'a> {
    label: Option<&'a str>,
    size_gb: u32,
    zone: Option<&'a str>,
    source_snapshot_id: Option<&'a str>,
    description: Option<&'a str>,
}

fn insert_volume(shared: &Shared, cloud: &mut MockCloud, new: &NewVolume<'_>) -> CloudResult<Volume> {
    let name = naming::generate_name(new.label, "cb-vol")?;
    if new.size_gb == 0 {
        return Err(CloudError::invalid_value("Volume size must be greater than 0"));
    }

    let id = shared.next_id("vol");
    let volume = Volume {
        id: id.clone(),
        name,
        label: new.label.map(ToString::to_string),
        state: OPENSTACK_VOLUME.translate("creating"),
        size_gb: new.size_gb,
        zone: new
            .zone
            .map(ToString::to_string)
            .or_else(|| shared.config.zone.clone()),
        attached_to: None,
        device: None,
        source_snapshot_id: new.source_snapshot_id.map(ToString::to_string),
        description: new.description.map(ToString::to_string),
    };
    let slot = Slot::new(volume, "creating", "available", shared.settle_after());
    let snapshot = slot.peek(&OPENSTACK_VOLUME);
    cloud.volumes.insert(id, slot);
    tracing::debug!(id = %snapshot.id, size_gb = snapshot.size_gb, "created volume");
    Ok(snapshot)
}

fn insert_snapshot(
    shared: &Shared,
    cloud: &mut MockCloud,
    volume_id: &str,
    label: &str,
    description: Option<&str>,
) -> CloudResult<Snapshot> {
    let name = naming::generate_name(Some(label), "cb-snap")?;
    let size_gb = cloud
        .volumes
        .get(volume_id)
        .ok_or_else(|| CloudError::not_found("Volume", volume_id))?
        .resource()
        .size_gb;

    let id = shared.next_id("snap");
    let snapshot = Snapshot {
        id: id.clone(),
        name,
        label: Some(label.to_string()),
        state: OPENSTACK_SNAPSHOT.translate("creating"),
        volume_id: volume_id.to_string(),
        size_gb,
        description: description.map(ToString::to_string),
    };
    let slot = Slot::new(snapshot, "creating", "available", shared.settle_after());
    let view = slot.peek(&OPENSTACK_SNAPSHOT);
    cloud.snapshots.insert(id, slot);
    tracing::debug!(id = %view.id, volume = volume_id, "creating snapshot");
    Ok(view)
}

impl VolumeService for MockVolumeService {
    fn create(
        &self,
        label: &str,
        size_gb: u32,
        zone: Option<&str>,
        snapshot_id: Option<&str>,
        description: Option<&str>,
    ) -> CloudResult<Volume> {
        self.shared.check_fault("volumes.create")?;
        let mut cloud = self.shared.cloud();
        if let Some(snapshot_id) = snapshot_id {
            let snapshot_size = cloud
                .snapshots
                .get(snapshot_id)
                .ok_or_else(|| CloudError::not_found("Snapshot", snapshot_id))?
                .resource()
                .size_gb;
            if size_gb < snapshot_size {
                return Err(CloudError::invalid_value(format!(
                    "Volume size {size_gb} GB is smaller than snapshot {snapshot_id} ({snapshot_size} GB)"
                )));
            }
        }
        insert_volume(
            &self.shared,
            &mut cloud,
            &NewVolume {
                label: Some(label),
                size_gb,
                zone,
                source_snapshot_id: snapshot_id,
                description,
            },
        )
    }

    fn delete(&self, id: &str) -> CloudResult<bool> {
        self.shared.check_fault("volumes.delete")?;
        let mut cloud = self.shared.cloud();
        let Some(slot) = cloud.volumes.get(id) else {
            return Ok(false);
        };
        if let Some(instance) = &slot.resource().attached_to {
            return Err(CloudError::new(
                ErrorKind::Provider,
                format!("Volume {id} is attached to instance {instance}; detach it first"),
            ));
        }
        cloud.volumes.remove(id);
        tracing::debug!(id, "deleted volume");
        Ok(true)
    }

    fn attach(&self, id: &str, instance_id: &str, device: &str) -> CloudResult<()> {
        self.shared.check_fault("volumes.attach")?;
        let settle = self.shared.settle_after();
        let mut cloud = self.shared.cloud();
        if !cloud.instances.contains_key(instance_id) {
            return Err(CloudError::not_found("Instance", instance_id));
        }
        let slot = cloud
            .volumes
            .get_mut(id)
            .ok_or_else(|| CloudError::not_found("Volume", id))?;
        if let Some(current) = &slot.resource().attached_to {
            return Err(CloudError::invalid_value(format!(
                "Volume {id} is already attached to instance {current}"
            )));
        }

        let volume = slot.resource_mut();
        volume.attached_to = Some(instance_id.to_string());
        volume.device = Some(device.to_string());
        slot.transition("attaching", "in-use", settle);
        tracing::debug!(id, instance_id, device, "attaching volume");
        Ok(())
    }

    fn detach(&self, id: &str) -> CloudResult<()> {
        self.shared.check_fault("volumes.detach")?;
        let mut cloud = self.shared.cloud();
        let slot = cloud
            .volumes
            .get_mut(id)
            .ok_or_else(|| CloudError::not_found("Volume", id))?;
        let volume = slot.resource_mut();
        if volume.attached_to.take().is_some() {
            volume.device = None;
            slot.force("available");
            tracing::debug!(id, "detached volume");
        }
        Ok(())
    }

    fn create_snapshot(
        &self,
        id: &str,
        label: &str,
        description: Option<&str>,
    ) -> CloudResult<Snapshot> {
        self.shared.check_fault("volumes.create_snapshot")?;
        insert_snapshot(&self.shared, &mut self.shared.cloud(), id, label, description)
    }
}

pub struct MockSnapshotService {
    shared: Arc<Shared>,
}

stateful_service!(
    MockSnapshotService,
    Snapshot,
    snapshots,
    OPENSTACK_SNAPSHOT,
    Paging::Server
);

impl SnapshotService for MockSnapshotService {
    fn create(
        &self,
        volume_id: &str,
        label: &str,
        description: Option<&str>,
    ) -> CloudResult<Snapshot> {
        self.shared.check_fault("snapshots.create")?;
        insert_snapshot(
            &self.shared,
            &mut self.shared.cloud(),
            volume_id,
            label,
            description,
        )
    }

    fn delete(&self, id: &str) -> CloudResult<bool> {
        self.shared.check_fault("snapshots.delete")?;
        let removed = self.shared.cloud().snapshots.remove(id).is_some();
        if removed {
            tracing::debug!(id, "deleted snapshot");
        }
        Ok(removed)
    }

    fn create_volume(
        &self,
        id: &str,
        size_gb: Option<u32>,
        zone: Option<&str>,
    ) -> CloudResult<Volume> {
        self.shared.check_fault("snapshots.create_volume")?;
        let mut cloud = self.shared.cloud();
        let snapshot = cloud
            .snapshots
            .get(id)
            .ok_or_else(|| CloudError::not_found("Snapshot", id))?
            .resource();
        let snapshot_size = snapshot.size_gb;
        let label = snapshot.label.clone();
        let size_gb = size_gb.unwrap_or(snapshot_size);
        if size_gb < snapshot_size {
            return Err(CloudError::invalid_value(format!(
                "Volume size {size_gb} GB is smaller than snapshot {id} ({snapshot_size} GB)"
            )));
        }
        insert_volume(
            &self.shared,
            &mut cloud,
            &NewVolume {
                label: label.as_deref(),
                size_gb,
                zone,
                source_snapshot_id: Some(id),
                description: Some(&format!("Restored from snapshot {id}")),
            },
        )
    }
}

// ============================================================================
// Catalog
// ============================================================================

pub struct MockImageService {
    shared: Arc<Shared>,
}

stateful_service!(
    MockImageService,
    MachineImage,
    images,
    OPENSTACK_IMAGE,
    Paging::Server
);

impl ImageService for MockImageService {
    fn delete(&self, id: &str) -> CloudResult<bool> {
        self.shared.check_fault("images.delete")?;
        let removed = self.shared.cloud().images.remove(id).is_some();
        if removed {
            tracing::debug!(id, "deleted machine image");
        }
        Ok(removed)
    }
}

pub struct MockVmTypeService {
    shared: Arc<Shared>,
}

impl ResourceService<VmType> for MockVmTypeService {
    fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    fn get(&self, id: &str) -> CloudResult<Option<VmType>> {
        self.shared.check_fault("vm_types.get")?;
        Ok(self
            .shared
            .cloud()
            .vm_types
            .iter()
            .find(|vm_type| vm_type.id == id)
            .cloned())
    }

    fn list(&self, limit: Option<usize>, marker: Option<&str>) -> CloudResult<ResultList<VmType>> {
        self.shared.check_fault("vm_types.list")?;
        let limit = resolve_limit(limit, &self.shared.config);
        let vm_types = self.shared.cloud().vm_types.clone();
        Ok(paginate(Paging::Client, vm_types, limit, marker))
    }
}

impl VmTypeService for MockVmTypeService {}

pub struct MockRegionService {
    shared: Arc<Shared>,
}

impl ResourceService<Region> for MockRegionService {
    fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    fn get(&self, id: &str) -> CloudResult<Option<Region>> {
        self.shared.check_fault("regions.get")?;
        Ok(self
            .shared
            .cloud()
            .regions
            .iter()
            .find(|region| region.id == id)
            .cloned())
    }

    fn list(&self, limit: Option<usize>, marker: Option<&str>) -> CloudResult<ResultList<Region>> {
        self.shared.check_fault("regions.list")?;
        let limit = resolve_limit(limit, &self.shared.config);
        let regions = self.shared.cloud().regions.clone();
        Ok(paginate(Paging::Client, regions, limit, marker))
    }
}

impl RegionService for MockRegionService {
    fn current(&self) -> CloudResult<Option<Region>> {
        match &self.shared.config.region {
            Some(region) => self.get(region),
            None => Ok(None),
        }
    }
}
