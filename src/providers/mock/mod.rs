//! In-memory provider for tests and local development.
//!
//! The mock behaves like a small, eventually-consistent cloud. Resources are
//! stored with raw OpenStack-style status strings and normalized through the
//! tables in [`crate::status`]. A newly created or mutated resource sits in a
//! transitional status until it has been read `settle_after` times (default 1),
//! so waiting on it exercises the same polling path a real provider would.
//!
//! Paging mirrors the variety of real vendors: compute resources and bucket
//! objects are paged "server-side" with opaque continuation tokens, everything
//! else is materialized and paged client-side.
//!
//! ```
//! use cloudbridge::config::BridgeConfig;
//! use cloudbridge::lifecycle::WaitOptions;
//! use cloudbridge::providers::mock::MockProvider;
//! use cloudbridge::provider::CloudProvider;
//! use cloudbridge::resources::{InstanceSpec, InstanceState};
//! use cloudbridge::services::{ResourceService, Waiter};
//! use std::time::Duration;
//!
//! # fn main() -> cloudbridge::error::CloudResult<()> {
//! let cloud = MockProvider::new(BridgeConfig::default());
//! let image = cloud.compute().images().list(None, None)?.into_items().remove(0);
//! let instances = cloud.compute().instances();
//!
//! let mut vm = instances.create(&InstanceSpec::new("web", &image.id, "m1.small"))?;
//! assert_eq!(vm.state, InstanceState::Pending);
//!
//! let quick = WaitOptions::new(Duration::from_secs(1), Duration::from_millis(10));
//! instances.wait_till_ready(&mut vm, quick)?;
//! assert_eq!(vm.state, InstanceState::Running);
//! # Ok(())
//! # }
//! ```

/// Implement [`ResourceService`](crate::services::ResourceService) for a mock
/// service backed by a [`Table`] of stateful resources.
macro_rules! stateful_service {
    ($service:ty, $resource:ty, $table:ident, $map:expr, $paging:expr) => {
        impl $crate::services::ResourceService<$resource> for $service {
            fn config(&self) -> &$crate::config::BridgeConfig {
                &self.shared.config
            }

            fn get(&self, id: &str) -> $crate::error::CloudResult<Option<$resource>> {
                self.shared
                    .check_fault(concat!(stringify!($table), ".get"))?;
                Ok(self
                    .shared
                    .cloud()
                    .$table
                    .get_mut(id)
                    .map(|slot| slot.observe(&$map)))
            }

            fn list(
                &self,
                limit: Option<usize>,
                marker: Option<&str>,
            ) -> $crate::error::CloudResult<$crate::pagination::ResultList<$resource>> {
                self.shared
                    .check_fault(concat!(stringify!($table), ".list"))?;
                let limit = $crate::pagination::resolve_limit(limit, &self.shared.config);
                let items =
                    $crate::providers::mock::observe_all(&mut self.shared.cloud().$table, &$map);
                Ok($crate::providers::mock::paginate($paging, items, limit, marker))
            }
        }
    };
}

mod compute;
mod network;
mod security;
mod storage;

pub use compute::{
    MockComputeService, MockImageService, MockInstanceService, MockRegionService,
    MockSnapshotService, MockVmTypeService, MockVolumeService,
};
pub use network::{
    MockFloatingIpService, MockGatewayService, MockNetworkService, MockNetworkingService,
    MockSubnetService,
};
pub use security::{MockKeyPairService, MockSecurityService, MockVmFirewallService};
pub use storage::{MockBucketService, MockStorageService};
use storage::StoredObject;

use crate::config::BridgeConfig;
use crate::error::{CloudError, CloudResult, ErrorKind};
use crate::lifecycle::StatefulResource;
use crate::pagination::{Identified, ResultList};
use crate::provider::{CloudProvider, ProviderId};
use crate::resources::{
    Bucket, FloatingIp, Instance, InstanceState, InternetGateway, KeyPair, MachineImage,
    MachineImageState, Network, Region, Snapshot, Subnet, VmFirewall, VmType, Volume, VolumeState,
};
use crate::services::{ComputeService, NetworkingService, SecurityService, StorageService};
use crate::status::{OPENSTACK_INSTANCE, OPENSTACK_VOLUME, StatusMap};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

/// Config key that makes [`CloudProvider::authenticate`] report rejected credentials.
pub const REJECT_CREDENTIALS_KEY: &str = "mock.reject_credentials";

pub const MOCK_REGION: &str = "mock-region-1";
pub const MOCK_ZONES: [&str; 2] = ["mock-zone-a", "mock-zone-b"];

const TOKEN_PREFIX: &str = "mock-page-";

// ============================================================================
// Stored records
// ============================================================================

/// A stored resource plus its raw vendor status.
pub(crate) struct Slot<T> {
    resource: T,
    status: &'static str,
    /// Reads left before `status` becomes the second field.
    pending: Option<(u32, &'static str)>,
}

impl<T: StatefulResource + Clone> Slot<T> {
    /// Store `resource` in `status`, settling into `settled` after `polls` reads.
    fn new(resource: T, status: &'static str, settled: &'static str, polls: u32) -> Self {
        let mut slot = Self {
            resource,
            status,
            pending: None,
        };
        slot.transition(status, settled, polls);
        slot
    }

    fn settled(resource: T, status: &'static str) -> Self {
        Self {
            resource,
            status,
            pending: None,
        }
    }

    fn transition(&mut self, now: &'static str, then: &'static str, polls: u32) {
        if polls == 0 || now == then {
            self.status = then;
            self.pending = None;
        } else {
            self.status = now;
            self.pending = Some((polls, then));
        }
    }

    fn force(&mut self, status: &'static str) {
        self.status = status;
        self.pending = None;
    }

    /// Read the resource, advancing any pending transition by one tick.
    fn observe(&mut self, map: &StatusMap<T::State>) -> T {
        if let Some((polls, then)) = self.pending {
            if polls <= 1 {
                self.status = then;
                self.pending = None;
            } else {
                self.pending = Some((polls - 1, then));
            }
        }
        self.peek(map)
    }

    /// Read the resource without advancing time.
    fn peek(&self, map: &StatusMap<T::State>) -> T {
        let mut resource = self.resource.clone();
        resource.set_state(map.translate(self.status));
        resource
    }

    const fn status(&self) -> &'static str {
        self.status
    }

    const fn resource(&self) -> &T {
        &self.resource
    }

    const fn resource_mut(&mut self) -> &mut T {
        &mut self.resource
    }
}

pub(crate) type Table<T> = BTreeMap<String, Slot<T>>;

pub(crate) fn observe_all<T: StatefulResource + Clone>(
    table: &mut Table<T>,
    map: &StatusMap<T::State>,
) -> Vec<T> {
    table.values_mut().map(|slot| slot.observe(map)).collect()
}

pub(crate) struct StoredBucket {
    pub(crate) bucket: Bucket,
    pub(crate) objects: BTreeMap<String, StoredObject>,
}

/// Everything the mock cloud knows about.
#[derive(Default)]
pub(crate) struct MockCloud {
    pub(crate) instances: Table<Instance>,
    pub(crate) volumes: Table<Volume>,
    pub(crate) snapshots: Table<Snapshot>,
    pub(crate) images: Table<MachineImage>,
    pub(crate) vm_types: Vec<VmType>,
    pub(crate) regions: Vec<Region>,
    pub(crate) networks: Table<Network>,
    pub(crate) subnets: Table<Subnet>,
    pub(crate) floating_ips: Table<FloatingIp>,
    pub(crate) gateways: Table<InternetGateway>,
    pub(crate) key_pairs: BTreeMap<String, KeyPair>,
    pub(crate) firewalls: BTreeMap<String, VmFirewall>,
    pub(crate) buckets: BTreeMap<String, StoredBucket>,
}

// ============================================================================
// Shared provider state
// ============================================================================

struct Fault {
    remaining: u32,
    kind: ErrorKind,
}

/// State shared by every service of one [`MockProvider`].
pub(crate) struct Shared {
    pub(crate) config: BridgeConfig,
    cloud: Mutex<MockCloud>,
    faults: Mutex<HashMap<String, Fault>>,
    settle_after: AtomicU32,
    next_id: AtomicU64,
}

impl Shared {
    fn new(config: BridgeConfig) -> Self {
        let shared = Self {
            config,
            cloud: Mutex::new(MockCloud::default()),
            faults: Mutex::new(HashMap::new()),
            settle_after: AtomicU32::new(1),
            next_id: AtomicU64::new(1),
        };
        shared.seed();
        shared
    }

    pub(crate) fn cloud(&self) -> MutexGuard<'_, MockCloud> {
        self.cloud.lock().expect("mock cloud mutex poisoned")
    }

    pub(crate) fn next_seq(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    pub(crate) fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{:06}", self.next_seq())
    }

    pub(crate) fn settle_after(&self) -> u32 {
        self.settle_after.load(Ordering::Relaxed)
    }

    /// Fail with an injected fault if one is armed for `operation`.
    pub(crate) fn check_fault(&self, operation: &str) -> CloudResult<()> {
        let mut faults = self.faults.lock().expect("faults mutex poisoned");
        if let Some(fault) = faults.get_mut(operation) {
            let kind = fault.kind;
            fault.remaining -= 1;
            if fault.remaining == 0 {
                faults.remove(operation);
            }
            drop(faults);
            tracing::debug!(operation, ?kind, "injected mock fault");
            return Err(CloudError::new(
                kind,
                format!("Injected failure for {operation}"),
            ));
        }
        Ok(())
    }

    fn seed(&self) {
        let mut cloud = self.cloud();

        for (label, min_disk) in [("ubuntu-22-04", 10), ("debian-12", 8)] {
            let id = self.next_id("img");
            let image = MachineImage {
                id: id.clone(),
                name: label.to_string(),
                label: Some(label.to_string()),
                state: MachineImageState::Available,
                min_disk_gb: Some(min_disk),
                description: Some(format!("{label} base image")),
            };
            cloud.images.insert(id, Slot::settled(image, "active"));
        }

        cloud.vm_types = [
            ("m1.tiny", 1, 512, 1),
            ("m1.small", 1, 2048, 20),
            ("m1.medium", 2, 4096, 40),
            ("m1.large", 4, 8192, 80),
        ]
        .into_iter()
        .map(|(name, vcpus, ram_mb, disk_gb)| VmType {
            id: name.to_string(),
            name: name.to_string(),
            family: "m1".to_string(),
            vcpus,
            ram_mb,
            disk_gb,
        })
        .collect();

        cloud.regions = vec![Region {
            id: MOCK_REGION.to_string(),
            name: MOCK_REGION.to_string(),
            zones: MOCK_ZONES.iter().map(ToString::to_string).collect(),
        }];
    }
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}

// ============================================================================
// Server-side paging
// ============================================================================

fn encode_token(id: &str) -> String {
    format!("{TOKEN_PREFIX}{}", hex::encode(id))
}

fn decode_token(token: &str) -> Option<String> {
    let bytes = hex::decode(token.strip_prefix(TOKEN_PREFIX)?).ok()?;
    String::from_utf8(bytes).ok()
}

/// How a mock collection pages its listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Paging {
    /// Opaque continuation tokens over generated ids, no total.
    Server,
    /// Opaque continuation tokens over user-chosen keys in byte order, no total.
    ServerByKey,
    /// Materialize everything and window it locally.
    Client,
}

pub(crate) fn paginate<T: Identified>(
    paging: Paging,
    items: Vec<T>,
    limit: usize,
    marker: Option<&str>,
) -> ResultList<T> {
    match paging {
        Paging::Server => server_page(items, limit, marker, id_order),
        Paging::ServerByKey => server_page(items, limit, marker, <str as Ord>::cmp),
        Paging::Client => ResultList::client_paged(items, limit, marker),
    }
}

/// Listing order for generated ids. Shorter ids sort first, so `inst-1000000`
/// follows `inst-999999` once the sequence outgrows its padding.
fn id_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Page `items` sorted by `order` the way a vendor API would, returning an opaque cursor.
pub(crate) fn server_page<T: Identified>(
    mut items: Vec<T>,
    limit: usize,
    marker: Option<&str>,
    order: fn(&str, &str) -> std::cmp::Ordering,
) -> ResultList<T> {
    let after = match marker {
        Some(token) => match decode_token(token) {
            Some(after) => Some(after),
            None => {
                tracing::debug!(token, "unrecognized continuation token, returning empty page");
                return ResultList::server_paged(Vec::new(), None);
            }
        },
        None => None,
    };
    items.sort_by(|a, b| order(a.id(), b.id()));
    let mut page: Vec<T> = items
        .into_iter()
        .filter(|item| {
            after
                .as_deref()
                .is_none_or(|after| order(item.id(), after).is_gt())
        })
        .take(limit + 1)
        .collect();

    let cursor = if page.len() > limit {
        page.truncate(limit);
        page.last().map(|item| encode_token(item.id()))
    } else {
        None
    };
    ResultList::server_paged(page, cursor)
}

// ============================================================================
// Provider
// ============================================================================

/// An in-memory [`CloudProvider`].
pub struct MockProvider {
    shared: Arc<Shared>,
    compute: MockComputeService,
    networking: MockNetworkingService,
    security: MockSecurityService,
    storage: MockStorageService,
}

impl MockProvider {
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        let shared = Arc::new(Shared::new(config));
        Self {
            compute: MockComputeService::new(Arc::clone(&shared)),
            networking: MockNetworkingService::new(Arc::clone(&shared)),
            security: MockSecurityService::new(Arc::clone(&shared)),
            storage: MockStorageService::new(Arc::clone(&shared)),
            shared,
        }
    }

    /// Constructor registered with [`ProviderFactory`](crate::provider::ProviderFactory).
    ///
    /// # Errors
    ///
    /// Never fails; the signature matches other provider constructors.
    pub fn construct(config: BridgeConfig) -> CloudResult<Arc<dyn CloudProvider>> {
        Ok(Arc::new(Self::new(config)))
    }

    /// Number of reads after which transitional statuses settle. Zero settles immediately.
    #[must_use]
    pub fn with_settle_after(self, polls: u32) -> Self {
        self.shared.settle_after.store(polls, Ordering::Relaxed);
        self
    }

    /// Make the next `times` calls of `operation` fail with `kind`.
    ///
    /// Operation names are `"<collection>.<method>"`, e.g. `"instances.create_image"`.
    pub fn fail_next(&self, operation: &str, times: u32, kind: ErrorKind) {
        if times == 0 {
            return;
        }
        self.shared
            .faults
            .lock()
            .expect("faults mutex poisoned")
            .insert(
                operation.to_string(),
                Fault {
                    remaining: times,
                    kind,
                },
            );
    }

    /// Put an instance into `state` immediately. Returns `false` if it does not exist.
    ///
    /// # Errors
    ///
    /// `InvalidValue` for a state with no vendor status, such as `Unknown`.
    pub fn force_instance_state(&self, id: &str, state: InstanceState) -> CloudResult<bool> {
        force_state(&mut self.shared.cloud().instances, id, state, &OPENSTACK_INSTANCE)
    }

    /// Put a volume into `state` immediately. Returns `false` if it does not exist.
    ///
    /// # Errors
    ///
    /// `InvalidValue` for a state with no vendor status, such as `Unknown`.
    pub fn force_volume_state(&self, id: &str, state: VolumeState) -> CloudResult<bool> {
        force_state(&mut self.shared.cloud().volumes, id, state, &OPENSTACK_VOLUME)
    }
}

fn force_state<T: StatefulResource + Clone>(
    table: &mut Table<T>,
    id: &str,
    state: T::State,
    map: &StatusMap<T::State>,
) -> CloudResult<bool> {
    let status = map.vendor_status(state).ok_or_else(|| {
        CloudError::invalid_value(format!("State {state:?} has no vendor status to force"))
    })?;
    Ok(table.get_mut(id).is_some_and(|slot| {
        slot.force(status);
        true
    }))
}

impl CloudProvider for MockProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Mock
    }

    fn config(&self) -> &BridgeConfig {
        &self.shared.config
    }

    fn compute(&self) -> &dyn ComputeService {
        &self.compute
    }

    fn networking(&self) -> &dyn NetworkingService {
        &self.networking
    }

    fn security(&self) -> &dyn SecurityService {
        &self.security
    }

    fn storage(&self) -> &dyn StorageService {
        &self.storage
    }

    fn authenticate(&self) -> CloudResult<bool> {
        self.shared.check_fault("provider.authenticate")?;
        let rejected = self
            .shared
            .config
            .extra
            .get(REJECT_CREDENTIALS_KEY)
            .is_some_and(|v| v == "true");
        Ok(!rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Item(String);

    impl Identified for Item {
        fn id(&self) -> &str {
            &self.0
        }
    }

    fn items(n: usize) -> Vec<Item> {
        (1..=n).map(|i| Item(format!("i-{i:06}"))).collect()
    }

    #[test]
    fn test_token_round_trip() {
        let token = encode_token("vol-000042");
        assert!(token.starts_with(TOKEN_PREFIX));
        assert_eq!(decode_token(&token).as_deref(), Some("vol-000042"));
        assert!(decode_token("garbage").is_none());
        assert!(decode_token("mock-page-zz").is_none());
        assert!(decode_token("mock-page-abc").is_none());
        assert_eq!(encode_token("a/b"), "mock-page-612f62");
    }

    #[test]
    fn test_server_page_walk() {
        let first = server_page(items(5), 2, None, id_order);
        assert_eq!(first.len(), 2);
        assert!(first.is_truncated());
        assert!(first.supports_server_paging());

        let second = server_page(items(5), 2, first.marker(), id_order);
        assert_eq!(second[0].0, "i-000003");

        let third = server_page(items(5), 2, second.marker(), id_order);
        assert_eq!(third.len(), 1);
        assert!(!third.is_truncated());

        let bogus = server_page(items(5), 2, Some("not-a-token"), id_order);
        assert!(bogus.is_empty());
        assert!(!bogus.is_truncated());
    }

    #[test]
    fn test_server_page_orders_past_six_digits() {
        let ids = ["i-1000001", "i-999998", "i-1000000", "i-999999"];
        let collected = crate::pagination::collect_all(Some(1), |limit, marker| {
            let items = ids.iter().map(|id| Item((*id).to_string())).collect();
            Ok(server_page(items, limit.unwrap_or(1), marker, id_order))
        })
        .unwrap();
        let order: Vec<&str> = collected.iter().map(|item| item.0.as_str()).collect();
        assert_eq!(order, ["i-999998", "i-999999", "i-1000000", "i-1000001"]);
    }

    #[test]
    fn test_fault_injection_counts_down() {
        let provider = MockProvider::new(BridgeConfig::default());
        provider.fail_next("x.y", 2, ErrorKind::RateLimited);
        assert_eq!(
            provider.shared.check_fault("x.y").unwrap_err().kind,
            ErrorKind::RateLimited
        );
        assert!(provider.shared.check_fault("x.y").is_err());
        assert!(provider.shared.check_fault("x.y").is_ok());
        assert!(provider.shared.check_fault("other").is_ok());
    }

    #[test]
    fn test_force_state_rejects_states_without_vendor_status() {
        let provider = MockProvider::new(BridgeConfig::default());
        assert!(!provider.force_instance_state("missing", InstanceState::Error).unwrap());
        assert!(!provider.force_volume_state("missing", VolumeState::Available).unwrap());

        let err = provider
            .force_instance_state("missing", InstanceState::Unknown)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidValue);
        let err = provider
            .force_volume_state("missing", VolumeState::Unknown)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidValue);
    }

    #[test]
    fn test_seeded_catalog() {
        let shared = Shared::new(BridgeConfig::default());
        let cloud = shared.cloud();
        assert_eq!(cloud.images.len(), 2);
        assert_eq!(cloud.vm_types.len(), 4);
        assert_eq!(cloud.regions[0].zones.len(), 2);
    }

    #[test]
    fn test_authenticate_rejection() {
        let mut config = BridgeConfig::default();
        config
            .extra
            .insert(REJECT_CREDENTIALS_KEY.to_string(), "true".to_string());
        assert!(!MockProvider::new(config).authenticate().unwrap());
        assert!(
            MockProvider::new(BridgeConfig::default())
                .authenticate()
                .unwrap()
        );
    }
}
