//! Lookup tables translating vendor status strings into common states.
//!
//! Every vendor names its resource states differently (`"ACTIVE"`, `"running"`,
//! `"Succeeded"`...). A [`StatusMap`] is a static table from those strings to a
//! [`LifecycleState`]; anything missing from the table maps to `UNKNOWN`.

use crate::lifecycle::LifecycleState;
use crate::resources::{
    FloatingIpState, GatewayState, InstanceState, MachineImageState, NetworkState, SnapshotState,
    SubnetState, VolumeState,
};

#[derive(Debug, Clone, Copy)]
pub struct StatusMap<S: 'static> {
    vendor: &'static str,
    entries: &'static [(&'static str, S)],
}

impl<S: LifecycleState> StatusMap<S> {
    #[must_use]
    pub const fn new(vendor: &'static str, entries: &'static [(&'static str, S)]) -> Self {
        Self { vendor, entries }
    }

    /// Case-insensitive lookup.
    #[must_use]
    pub fn translate(&self, status: &str) -> S {
        self.entries
            .iter()
            .find(|(raw, _)| raw.eq_ignore_ascii_case(status))
            .map_or_else(
                || {
                    tracing::debug!(vendor = self.vendor, status, "unmapped vendor status");
                    S::UNKNOWN
                },
                |(_, state)| *state,
            )
    }

    /// The first vendor string mapping to `state`, for providers that store raw statuses.
    #[must_use]
    pub fn vendor_status(&self, state: S) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|(_, s)| *s == state)
            .map(|(raw, _)| *raw)
    }

    #[must_use]
    pub const fn vendor(&self) -> &'static str {
        self.vendor
    }
}

pub const AWS_INSTANCE: StatusMap<InstanceState> = StatusMap::new(
    "aws",
    &[
        ("pending", InstanceState::Pending),
        ("running", InstanceState::Running),
        ("shutting-down", InstanceState::Configuring),
        ("terminated", InstanceState::Deleted),
        ("stopping", InstanceState::Configuring),
        ("stopped", InstanceState::Stopped),
    ],
);

pub const OPENSTACK_INSTANCE: StatusMap<InstanceState> = StatusMap::new(
    "openstack",
    &[
        ("BUILD", InstanceState::Pending),
        ("ACTIVE", InstanceState::Running),
        ("REBOOT", InstanceState::Rebooting),
        ("HARD_REBOOT", InstanceState::Rebooting),
        ("RESIZE", InstanceState::Configuring),
        ("VERIFY_RESIZE", InstanceState::Configuring),
        ("MIGRATING", InstanceState::Configuring),
        ("SHUTOFF", InstanceState::Stopped),
        ("SUSPENDED", InstanceState::Stopped),
        ("PAUSED", InstanceState::Stopped),
        ("DELETED", InstanceState::Deleted),
        ("SOFT_DELETED", InstanceState::Deleted),
        ("ERROR", InstanceState::Error),
    ],
);

pub const AZURE_INSTANCE: StatusMap<InstanceState> = StatusMap::new(
    "azure",
    &[
        ("starting", InstanceState::Pending),
        ("running", InstanceState::Running),
        ("stopping", InstanceState::Configuring),
        ("stopped", InstanceState::Stopped),
        ("deallocating", InstanceState::Configuring),
        ("deallocated", InstanceState::Deleted),
        ("failed", InstanceState::Error),
    ],
);

pub const GCP_INSTANCE: StatusMap<InstanceState> = StatusMap::new(
    "gcp",
    &[
        ("PROVISIONING", InstanceState::Pending),
        ("STAGING", InstanceState::Pending),
        ("RUNNING", InstanceState::Running),
        ("STOPPING", InstanceState::Configuring),
        ("SUSPENDING", InstanceState::Configuring),
        ("SUSPENDED", InstanceState::Stopped),
        ("TERMINATED", InstanceState::Stopped),
    ],
);

pub const AWS_VOLUME: StatusMap<VolumeState> = StatusMap::new(
    "aws",
    &[
        ("creating", VolumeState::Creating),
        ("available", VolumeState::Available),
        ("in-use", VolumeState::InUse),
        ("deleting", VolumeState::Configuring),
        ("deleted", VolumeState::Deleted),
        ("error", VolumeState::Error),
    ],
);

pub const OPENSTACK_VOLUME: StatusMap<VolumeState> = StatusMap::new(
    "openstack",
    &[
        ("creating", VolumeState::Creating),
        ("available", VolumeState::Available),
        ("attaching", VolumeState::Configuring),
        ("in-use", VolumeState::InUse),
        ("deleting", VolumeState::Configuring),
        ("error", VolumeState::Error),
        ("error_deleting", VolumeState::Error),
        ("backing-up", VolumeState::Configuring),
        ("restoring-backup", VolumeState::Configuring),
        ("error_restoring", VolumeState::Error),
        ("error_extending", VolumeState::Error),
    ],
);

pub const AZURE_VOLUME: StatusMap<VolumeState> = StatusMap::new(
    "azure",
    &[
        ("Creating", VolumeState::Creating),
        ("Updating", VolumeState::Configuring),
        ("Succeeded", VolumeState::Available),
        ("Deleting", VolumeState::Configuring),
        ("Failed", VolumeState::Error),
    ],
);

pub const GCP_VOLUME: StatusMap<VolumeState> = StatusMap::new(
    "gcp",
    &[
        ("CREATING", VolumeState::Creating),
        ("RESTORING", VolumeState::Configuring),
        ("READY", VolumeState::Available),
        ("FAILED", VolumeState::Error),
        ("DELETING", VolumeState::Configuring),
    ],
);

pub const OPENSTACK_SNAPSHOT: StatusMap<SnapshotState> = StatusMap::new(
    "openstack",
    &[
        ("creating", SnapshotState::Pending),
        ("available", SnapshotState::Available),
        ("deleting", SnapshotState::Configuring),
        ("error", SnapshotState::Error),
        ("error_deleting", SnapshotState::Error),
    ],
);

pub const OPENSTACK_IMAGE: StatusMap<MachineImageState> = StatusMap::new(
    "openstack",
    &[
        ("queued", MachineImageState::Pending),
        ("saving", MachineImageState::Pending),
        ("active", MachineImageState::Available),
        ("killed", MachineImageState::Error),
        ("deleted", MachineImageState::Unknown),
        ("pending_delete", MachineImageState::Unknown),
    ],
);

pub const OPENSTACK_NETWORK: StatusMap<NetworkState> = StatusMap::new(
    "openstack",
    &[
        ("BUILD", NetworkState::Pending),
        ("ACTIVE", NetworkState::Available),
        ("DOWN", NetworkState::Down),
        ("ERROR", NetworkState::Error),
    ],
);

pub const OPENSTACK_SUBNET: StatusMap<SubnetState> = StatusMap::new(
    "openstack",
    &[
        ("BUILD", SubnetState::Pending),
        ("ACTIVE", SubnetState::Available),
        ("DOWN", SubnetState::Down),
        ("ERROR", SubnetState::Error),
    ],
);

pub const OPENSTACK_FLOATING_IP: StatusMap<FloatingIpState> = StatusMap::new(
    "openstack",
    &[
        ("DOWN", FloatingIpState::Available),
        ("ACTIVE", FloatingIpState::InUse),
        ("ERROR", FloatingIpState::Error),
    ],
);

pub const OPENSTACK_GATEWAY: StatusMap<GatewayState> = StatusMap::new(
    "openstack",
    &[
        ("BUILD", GatewayState::Configuring),
        ("ACTIVE", GatewayState::Available),
        ("ERROR", GatewayState::Error),
    ],
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_is_case_insensitive() {
        assert_eq!(OPENSTACK_INSTANCE.translate("active"), InstanceState::Running);
        assert_eq!(AWS_INSTANCE.translate("RUNNING"), InstanceState::Running);
    }

    #[test]
    fn test_unmapped_status_is_unknown() {
        assert_eq!(GCP_VOLUME.translate("MELTING"), VolumeState::Unknown);
        assert_eq!(AZURE_INSTANCE.translate(""), InstanceState::Unknown);
    }

    #[test]
    fn test_vendor_status_reverse_lookup() {
        assert_eq!(
            OPENSTACK_INSTANCE.vendor_status(InstanceState::Running),
            Some("ACTIVE")
        );
        assert_eq!(OPENSTACK_INSTANCE.vendor_status(InstanceState::Unknown), None);
    }
}
