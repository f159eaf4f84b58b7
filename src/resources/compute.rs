//! Compute resources: instances, volumes, snapshots, machine images.

use crate::error::{CloudError, CloudResult};
use crate::lifecycle::lifecycle_state;
use crate::resources::resource;
use serde::{Deserialize, Serialize};

lifecycle_state! {
    /// Normalized state of a virtual machine.
    InstanceState {
        Unknown => "unknown",
        Pending => "pending",
        Configuring => "configuring",
        Running => "running",
        Rebooting => "rebooting",
        Stopped => "stopped",
        Deleted => "deleted",
        Error => "error",
    }
    ready: [Running],
    terminal: [Deleted, Error],
    gone: [Deleted, Unknown],
}

lifecycle_state! {
    VolumeState {
        Unknown => "unknown",
        Creating => "creating",
        Configuring => "configuring",
        Available => "available",
        InUse => "in_use",
        Deleted => "deleted",
        Error => "error",
    }
    ready: [Available],
    terminal: [Deleted, Error],
    gone: [Deleted, Unknown],
}

lifecycle_state! {
    SnapshotState {
        Unknown => "unknown",
        Pending => "pending",
        Configuring => "configuring",
        Available => "available",
        Error => "error",
    }
    ready: [Available],
    terminal: [Error],
    gone: [Unknown],
}

lifecycle_state! {
    MachineImageState {
        Unknown => "unknown",
        Pending => "pending",
        Available => "available",
        Error => "error",
    }
    ready: [Available],
    terminal: [Error],
    gone: [Unknown],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub name: String,
    pub label: Option<String>,
    pub state: InstanceState,
    pub image_id: String,
    pub vm_type_id: String,
    pub subnet_id: Option<String>,
    pub key_pair_id: Option<String>,
    pub firewall_ids: Vec<String>,
    pub public_ips: Vec<String>,
    pub private_ips: Vec<String>,
    pub zone: Option<String>,
}

resource!(Instance, labeled, state: InstanceState);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub name: String,
    pub label: Option<String>,
    pub state: VolumeState,
    pub size_gb: u32,
    pub zone: Option<String>,
    /// Instance the volume is attached to, if any.
    pub attached_to: Option<String>,
    pub device: Option<String>,
    pub source_snapshot_id: Option<String>,
    pub description: Option<String>,
}

resource!(Volume, labeled, state: VolumeState);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub name: String,
    pub label: Option<String>,
    pub state: SnapshotState,
    pub volume_id: String,
    pub size_gb: u32,
    pub description: Option<String>,
}

resource!(Snapshot, labeled, state: SnapshotState);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineImage {
    pub id: String,
    pub name: String,
    pub label: Option<String>,
    pub state: MachineImageState,
    pub min_disk_gb: Option<u32>,
    pub description: Option<String>,
}

resource!(MachineImage, labeled, state: MachineImageState);

/// An instance size offered by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmType {
    pub id: String,
    pub name: String,
    pub family: String,
    pub vcpus: u32,
    pub ram_mb: u64,
    pub disk_gb: u32,
}

resource!(VmType, named);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: String,
    pub name: String,
    pub zones: Vec<String>,
}

resource!(Region, named);

/// What a block device is populated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum BlockSource {
    /// A new, empty volume. Needs an explicit size.
    Blank,
    Image(String),
    Volume(String),
    Snapshot(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDeviceMapping {
    /// `None` for ephemeral (instance-store) devices.
    pub source: Option<BlockSource>,
    pub size_gb: Option<u32>,
    pub delete_on_terminate: bool,
    pub is_root: bool,
}

impl BlockDeviceMapping {
    #[must_use]
    pub const fn is_ephemeral(&self) -> bool {
        self.source.is_none()
    }
}

/// Extra launch-time options for an instance, chiefly its block devices.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    block_devices: Vec<BlockDeviceMapping>,
}

impl LaunchConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a volume-backed device.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if a blank device has no size, the size is
    /// zero, or another device is already marked as root.
    pub fn add_volume_device(
        &mut self,
        source: BlockSource,
        size_gb: Option<u32>,
        is_root: bool,
        delete_on_terminate: bool,
    ) -> CloudResult<&mut Self> {
        if source == BlockSource::Blank && size_gb.is_none() {
            return Err(CloudError::invalid_configuration(
                "A size must be specified for a blank new volume",
            ));
        }
        if size_gb == Some(0) {
            return Err(CloudError::invalid_configuration(
                "The size must be unset or a number greater than 0",
            ));
        }
        if is_root && let Some(pos) = self.block_devices.iter().position(|bd| bd.is_root) {
            return Err(CloudError::invalid_configuration(format!(
                "Block device {pos} is already marked as root; only one root device is allowed"
            )));
        }

        self.block_devices.push(BlockDeviceMapping {
            source: Some(source),
            size_gb,
            delete_on_terminate,
            is_root,
        });
        Ok(self)
    }

    /// Add an ephemeral device. These are never root and vanish with the instance.
    pub fn add_ephemeral_device(&mut self) -> &mut Self {
        self.block_devices.push(BlockDeviceMapping {
            source: None,
            size_gb: None,
            delete_on_terminate: true,
            is_root: false,
        });
        self
    }

    #[must_use]
    pub fn block_devices(&self) -> &[BlockDeviceMapping] {
        &self.block_devices
    }

    #[must_use]
    pub fn root_device(&self) -> Option<&BlockDeviceMapping> {
        self.block_devices.iter().find(|bd| bd.is_root)
    }
}

/// Parameters for launching an instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceSpec {
    pub label: String,
    pub image_id: String,
    pub vm_type_id: String,
    pub subnet_id: Option<String>,
    pub zone: Option<String>,
    pub key_pair_name: Option<String>,
    pub firewall_ids: Vec<String>,
    pub user_data: Option<String>,
    pub launch_config: Option<LaunchConfig>,
}

impl InstanceSpec {
    pub fn new(
        label: impl Into<String>,
        image_id: impl Into<String>,
        vm_type_id: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            image_id: image_id.into(),
            vm_type_id: vm_type_id.into(),
            subnet_id: None,
            zone: None,
            key_pair_name: None,
            firewall_ids: Vec::new(),
            user_data: None,
            launch_config: None,
        }
    }

    #[must_use]
    pub fn with_subnet(mut self, subnet_id: impl Into<String>) -> Self {
        self.subnet_id = Some(subnet_id.into());
        self
    }

    #[must_use]
    pub fn with_zone(mut self, zone: impl Into<String>) -> Self {
        self.zone = Some(zone.into());
        self
    }

    #[must_use]
    pub fn with_key_pair(mut self, name: impl Into<String>) -> Self {
        self.key_pair_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_firewall(mut self, firewall_id: impl Into<String>) -> Self {
        self.firewall_ids.push(firewall_id.into());
        self
    }

    #[must_use]
    pub fn with_user_data(mut self, user_data: impl Into<String>) -> Self {
        self.user_data = Some(user_data.into());
        self
    }

    #[must_use]
    pub fn with_launch_config(mut self, launch_config: LaunchConfig) -> Self {
        self.launch_config = Some(launch_config);
        self
    }
}
