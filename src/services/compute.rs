//! Compute service traits.

use crate::error::CloudResult;
use crate::resources::{
    Instance, InstanceSpec, MachineImage, Region, Snapshot, VmType, Volume,
};
use crate::services::ResourceService;

pub trait InstanceService: ResourceService<Instance> {
    /// Launch an instance. The returned snapshot is usually still pending; use
    /// [`Waiter::wait_till_ready`](crate::services::Waiter::wait_till_ready).
    ///
    /// # Errors
    ///
    /// `InvalidLabel` for a bad label, `NotFound` for a missing image, VM type,
    /// subnet, key pair or firewall, `InvalidConfiguration` for a launch config
    /// the provider cannot satisfy.
    fn create(&self, spec: &InstanceSpec) -> CloudResult<Instance>;

    /// Terminate an instance. `Ok(false)` if it was already gone.
    ///
    /// # Errors
    ///
    /// Returns any provider failure.
    fn delete(&self, id: &str) -> CloudResult<bool>;

    /// # Errors
    ///
    /// Returns any provider failure.
    fn reboot(&self, id: &str) -> CloudResult<bool>;

    /// # Errors
    ///
    /// Returns any provider failure.
    fn stop(&self, id: &str) -> CloudResult<bool>;

    /// # Errors
    ///
    /// Returns any provider failure.
    fn start(&self, id: &str) -> CloudResult<bool>;

    /// Capture a machine image from the instance.
    ///
    /// Providers may refuse the call for a short while after the instance was
    /// created; implementations retry transient failures a fixed number of times.
    ///
    /// # Errors
    ///
    /// `NotFound` if the instance does not exist, `InvalidLabel` for a bad label.
    fn create_image(&self, id: &str, label: &str) -> CloudResult<MachineImage>;

    /// # Errors
    ///
    /// `NotFound` if either resource is missing, `InvalidValue` if the floating
    /// IP is already in use.
    fn add_floating_ip(&self, id: &str, floating_ip_id: &str) -> CloudResult<()>;

    /// # Errors
    ///
    /// `NotFound` if either resource is missing, `InvalidValue` if the floating
    /// IP is not associated with this instance.
    fn remove_floating_ip(&self, id: &str, floating_ip_id: &str) -> CloudResult<()>;
}

pub trait VolumeService: ResourceService<Volume> {
    /// # Errors
    ///
    /// `InvalidLabel` for a bad label, `InvalidValue` for a zero size,
    /// `NotFound` for a missing source snapshot.
    fn create(
        &self,
        label: &str,
        size_gb: u32,
        zone: Option<&str>,
        snapshot_id: Option<&str>,
        description: Option<&str>,
    ) -> CloudResult<Volume>;

    /// # Errors
    ///
    /// Returns any provider failure, such as deleting an attached volume.
    fn delete(&self, id: &str) -> CloudResult<bool>;

    /// # Errors
    ///
    /// `NotFound` if the volume or instance is missing.
    fn attach(&self, id: &str, instance_id: &str, device: &str) -> CloudResult<()>;

    /// # Errors
    ///
    /// `NotFound` if the volume is missing.
    fn detach(&self, id: &str) -> CloudResult<()>;

    /// # Errors
    ///
    /// `NotFound` if the volume is missing, `InvalidLabel` for a bad label.
    fn create_snapshot(
        &self,
        id: &str,
        label: &str,
        description: Option<&str>,
    ) -> CloudResult<Snapshot>;
}

pub trait SnapshotService: ResourceService<Snapshot> {
    /// # Errors
    ///
    /// `NotFound` if the volume is missing, `InvalidLabel` for a bad label.
    fn create(
        &self,
        volume_id: &str,
        label: &str,
        description: Option<&str>,
    ) -> CloudResult<Snapshot>;

    /// # Errors
    ///
    /// Returns any provider failure.
    fn delete(&self, id: &str) -> CloudResult<bool>;

    /// Restore the snapshot into a new volume, at least as large as the snapshot.
    ///
    /// # Errors
    ///
    /// `NotFound` if the snapshot is missing, `InvalidValue` if `size_gb` is
    /// smaller than the snapshot.
    fn create_volume(
        &self,
        id: &str,
        size_gb: Option<u32>,
        zone: Option<&str>,
    ) -> CloudResult<Volume>;
}

pub trait ImageService: ResourceService<MachineImage> {
    /// # Errors
    ///
    /// Returns any provider failure.
    fn delete(&self, id: &str) -> CloudResult<bool>;
}

/// Read-only catalog of instance sizes.
pub trait VmTypeService: ResourceService<VmType> {}

pub trait RegionService: ResourceService<Region> {
    /// The region named in the provider configuration, if any.
    ///
    /// # Errors
    ///
    /// Returns any provider failure.
    fn current(&self) -> CloudResult<Option<Region>>;
}

pub trait ComputeService: Send + Sync {
    fn instances(&self) -> &dyn InstanceService;
    fn volumes(&self) -> &dyn VolumeService;
    fn snapshots(&self) -> &dyn SnapshotService;
    fn images(&self) -> &dyn ImageService;
    fn vm_types(&self) -> &dyn VmTypeService;
    fn regions(&self) -> &dyn RegionService;
}
