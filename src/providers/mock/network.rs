use super::{MockCloud, Paging, Shared, Slot};
use crate::error::{CloudError, CloudResult, ErrorKind};
use crate::naming;
use crate::resources::{FloatingIp, InternetGateway, Network, Subnet};
use crate::services::{
    DEFAULT_NETWORK_CIDR, DEFAULT_NETWORK_LABEL, DEFAULT_SUBNET_LABEL, FloatingIpService,
    GatewayService, NetworkService, NetworkingService, SubnetService,
};
use crate::status::{OPENSTACK_FLOATING_IP, OPENSTACK_GATEWAY, OPENSTACK_NETWORK, OPENSTACK_SUBNET};
use std::collections::BTreeSet;
use std::net::Ipv4Addr;
use std::sync::Arc;

pub struct MockNetworkingService {
    networks: MockNetworkService,
    subnets: MockSubnetService,
    floating_ips: MockFloatingIpService,
    gateways: MockGatewayService,
}

impl MockNetworkingService {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self {
            networks: MockNetworkService {
                shared: Arc::clone(&shared),
            },
            subnets: MockSubnetService {
                shared: Arc::clone(&shared),
            },
            floating_ips: MockFloatingIpService {
                shared: Arc::clone(&shared),
            },
            gateways: MockGatewayService { shared },
        }
    }
}

impl NetworkingService for MockNetworkingService {
    fn networks(&self) -> &dyn NetworkService {
        &self.networks
    }

    fn subnets(&self) -> &dyn SubnetService {
        &self.subnets
    }

    fn floating_ips(&self) -> &dyn FloatingIpService {
        &self.floating_ips
    }

    fn gateways(&self) -> &dyn GatewayService {
        &self.gateways
    }
}

/// Parse an IPv4 CIDR block such as `10.0.0.0/16`.
pub(super) fn parse_cidr(cidr: &str) -> CloudResult<(Ipv4Addr, u8)> {
    let invalid = || CloudError::invalid_value(format!("Invalid CIDR block {cidr:?}"));
    let (addr, prefix) = cidr.split_once('/').ok_or_else(invalid)?;
    let addr: Ipv4Addr = addr.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
    if prefix > 32 {
        return Err(invalid());
    }
    Ok((addr, prefix))
}

fn insert_network(
    shared: &Shared,
    cloud: &mut MockCloud,
    label: &str,
    cidr_block: &str,
) -> CloudResult<Network> {
    let name = naming::generate_name(Some(label), "cb-net")?;
    parse_cidr(cidr_block)?;

    let id = shared.next_id("net");
    let network = Network {
        id: id.clone(),
        name,
        label: Some(label.to_string()),
        state: OPENSTACK_NETWORK.translate("BUILD"),
        cidr_block: cidr_block.to_string(),
        external: false,
    };
    let slot = Slot::new(network, "BUILD", "ACTIVE", shared.settle_after());
    let view = slot.peek(&OPENSTACK_NETWORK);
    cloud.networks.insert(id, slot);
    tracing::debug!(id = %view.id, cidr_block, "created network");
    Ok(view)
}

fn insert_subnet(
    shared: &Shared,
    cloud: &mut MockCloud,
    label: &str,
    network_id: &str,
    cidr_block: &str,
    zone: Option<&str>,
) -> CloudResult<Subnet> {
    let name = naming::generate_name(Some(label), "cb-subnet")?;
    if !cloud.networks.contains_key(network_id) {
        return Err(CloudError::not_found("Network", network_id));
    }
    parse_cidr(cidr_block)?;

    let id = shared.next_id("subnet");
    let subnet = Subnet {
        id: id.clone(),
        name,
        label: Some(label.to_string()),
        state: OPENSTACK_SUBNET.translate("BUILD"),
        network_id: network_id.to_string(),
        cidr_block: cidr_block.to_string(),
        zone: zone
            .map(ToString::to_string)
            .or_else(|| shared.config.zone.clone()),
    };
    let slot = Slot::new(subnet, "BUILD", "ACTIVE", shared.settle_after());
    let view = slot.peek(&OPENSTACK_SUBNET);
    cloud.subnets.insert(id, slot);
    tracing::debug!(id = %view.id, network_id, cidr_block, "created subnet");
    Ok(view)
}

pub struct MockNetworkService {
    shared: Arc<Shared>,
}

stateful_service!(
    MockNetworkService,
    Network,
    networks,
    OPENSTACK_NETWORK,
    Paging::Client
);

impl NetworkService for MockNetworkService {
    fn create(&self, label: &str, cidr_block: &str) -> CloudResult<Network> {
        self.shared.check_fault("networks.create")?;
        insert_network(&self.shared, &mut self.shared.cloud(), label, cidr_block)
    }

    fn delete(&self, id: &str) -> CloudResult<bool> {
        self.shared.check_fault("networks.delete")?;
        let mut cloud = self.shared.cloud();
        if !cloud.networks.contains_key(id) {
            return Ok(false);
        }
        if let Some(subnet) = cloud
            .subnets
            .values()
            .find(|slot| slot.resource().network_id == id)
        {
            return Err(CloudError::new(
                ErrorKind::Provider,
                format!(
                    "Network {id} still has subnet {}; delete it first",
                    subnet.resource().id
                ),
            ));
        }

        for gateway in cloud.gateways.values_mut() {
            let gateway = gateway.resource_mut();
            if gateway.network_id.as_deref() == Some(id) {
                gateway.network_id = None;
            }
        }
        cloud.networks.remove(id);
        tracing::debug!(id, "deleted network");
        Ok(true)
    }
}

pub struct MockSubnetService {
    shared: Arc<Shared>,
}

stateful_service!(
    MockSubnetService,
    Subnet,
    subnets,
    OPENSTACK_SUBNET,
    Paging::Client
);

impl SubnetService for MockSubnetService {
    fn create(
        &self,
        label: &str,
        network_id: &str,
        cidr_block: &str,
        zone: Option<&str>,
    ) -> CloudResult<Subnet> {
        self.shared.check_fault("subnets.create")?;
        insert_subnet(
            &self.shared,
            &mut self.shared.cloud(),
            label,
            network_id,
            cidr_block,
            zone,
        )
    }

    fn delete(&self, id: &str) -> CloudResult<bool> {
        self.shared.check_fault("subnets.delete")?;
        let mut cloud = self.shared.cloud();
        if let Some(instance) = cloud
            .instances
            .values()
            .find(|slot| slot.resource().subnet_id.as_deref() == Some(id))
        {
            return Err(CloudError::new(
                ErrorKind::Provider,
                format!(
                    "Subnet {id} is in use by instance {}",
                    instance.resource().id
                ),
            ));
        }
        let removed = cloud.subnets.remove(id).is_some();
        if removed {
            tracing::debug!(id, "deleted subnet");
        }
        Ok(removed)
    }

    fn get_or_create_default(&self, zone: Option<&str>) -> CloudResult<Subnet> {
        self.shared.check_fault("subnets.get_or_create_default")?;
        let zone = zone
            .map(ToString::to_string)
            .or_else(|| self.shared.config.zone.clone());

        let mut guard = self.shared.cloud();
        let cloud = &mut *guard;
        if let Some(existing) = cloud.subnets.values_mut().find(|slot| {
            slot.resource().label.as_deref() == Some(DEFAULT_SUBNET_LABEL)
                && slot.resource().zone == zone
        }) {
            return Ok(existing.observe(&OPENSTACK_SUBNET));
        }

        let existing_network = cloud
            .networks
            .values()
            .find(|slot| slot.resource().label.as_deref() == Some(DEFAULT_NETWORK_LABEL))
            .map(|slot| slot.resource().id.clone());
        let network_id = match existing_network {
            Some(id) => id,
            None => {
                insert_network(&self.shared, cloud, DEFAULT_NETWORK_LABEL, DEFAULT_NETWORK_CIDR)?
                    .id
            }
        };

        let (base, _) = parse_cidr(DEFAULT_NETWORK_CIDR)?;
        let [a, b, ..] = base.octets();
        let used: BTreeSet<u8> = cloud
            .subnets
            .values()
            .filter(|slot| slot.resource().network_id == network_id)
            .filter_map(|slot| parse_cidr(&slot.resource().cidr_block).ok())
            .map(|(addr, _)| addr.octets())
            .filter(|octets| octets[..2] == [a, b])
            .map(|octets| octets[2])
            .collect();
        let block = (0..=u8::MAX).find(|octet| !used.contains(octet)).ok_or_else(|| {
            CloudError::new(
                ErrorKind::Provider,
                format!("Network {network_id} has no free /24 block for a default subnet"),
            )
        })?;
        let cidr_block = format!("{a}.{b}.{block}.0/24");
        tracing::info!(?zone, %cidr_block, "creating default subnet");
        insert_subnet(
            &self.shared,
            cloud,
            DEFAULT_SUBNET_LABEL,
            &network_id,
            &cidr_block,
            zone.as_deref(),
        )
    }
}

pub struct MockFloatingIpService {
    shared: Arc<Shared>,
}

stateful_service!(
    MockFloatingIpService,
    FloatingIp,
    floating_ips,
    OPENSTACK_FLOATING_IP,
    Paging::Client
);

impl FloatingIpService for MockFloatingIpService {
    fn create(&self, gateway_id: &str) -> CloudResult<FloatingIp> {
        self.shared.check_fault("floating_ips.create")?;
        let mut cloud = self.shared.cloud();
        if !cloud.gateways.contains_key(gateway_id) {
            return Err(CloudError::not_found("Internet gateway", gateway_id));
        }

        let allocated: BTreeSet<&str> = cloud
            .floating_ips
            .values()
            .map(|slot| slot.resource().public_ip.as_str())
            .collect();
        let public_ip = (1..=254u8)
            .map(|host| Ipv4Addr::new(203, 0, 113, host).to_string())
            .find(|ip| !allocated.contains(ip.as_str()))
            .ok_or_else(|| {
                CloudError::new(ErrorKind::Provider, "No public addresses left to allocate")
            })?;

        let id = self.shared.next_id("fip");
        let fip = FloatingIp {
            id: id.clone(),
            public_ip,
            private_ip: None,
            state: OPENSTACK_FLOATING_IP.translate("DOWN"),
            gateway_id: gateway_id.to_string(),
        };
        tracing::debug!(%id, public_ip = %fip.public_ip, "allocated floating IP");
        cloud.floating_ips.insert(id, Slot::settled(fip.clone(), "DOWN"));
        Ok(fip)
    }

    fn delete(&self, id: &str) -> CloudResult<bool> {
        self.shared.check_fault("floating_ips.delete")?;
        let mut cloud = self.shared.cloud();
        let Some(slot) = cloud.floating_ips.get(id) else {
            return Ok(false);
        };
        if slot.resource().in_use() {
            return Err(CloudError::new(
                ErrorKind::Provider,
                format!(
                    "Floating IP {} is still associated with an instance",
                    slot.resource().public_ip
                ),
            ));
        }
        cloud.floating_ips.remove(id);
        tracing::debug!(id, "released floating IP");
        Ok(true)
    }
}

pub struct MockGatewayService {
    shared: Arc<Shared>,
}

stateful_service!(
    MockGatewayService,
    InternetGateway,
    gateways,
    OPENSTACK_GATEWAY,
    Paging::Client
);

impl GatewayService for MockGatewayService {
    fn get_or_create(&self, network_id: &str) -> CloudResult<InternetGateway> {
        self.shared.check_fault("gateways.get_or_create")?;
        let mut cloud = self.shared.cloud();
        if !cloud.networks.contains_key(network_id) {
            return Err(CloudError::not_found("Network", network_id));
        }
        if let Some(existing) = cloud
            .gateways
            .values_mut()
            .find(|slot| slot.resource().network_id.as_deref() == Some(network_id))
        {
            return Ok(existing.observe(&OPENSTACK_GATEWAY));
        }

        let id = self.shared.next_id("gw");
        let gateway = InternetGateway {
            id: id.clone(),
            name: naming::generate_name(None, "cb-gateway")?,
            state: OPENSTACK_GATEWAY.translate("BUILD"),
            network_id: Some(network_id.to_string()),
        };
        let slot = Slot::new(gateway, "BUILD", "ACTIVE", self.shared.settle_after());
        let view = slot.peek(&OPENSTACK_GATEWAY);
        cloud.gateways.insert(id, slot);
        tracing::debug!(id = %view.id, network_id, "created internet gateway");
        Ok(view)
    }

    fn delete(&self, id: &str) -> CloudResult<bool> {
        self.shared.check_fault("gateways.delete")?;
        let removed = self.shared.cloud().gateways.remove(id).is_some();
        if removed {
            tracing::debug!(id, "deleted internet gateway");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::MockProvider;
    use super::*;
    use crate::config::BridgeConfig;
    use crate::lifecycle::WaitOptions;
    use crate::provider::CloudProvider;
    use crate::resources::{FloatingIpState, NetworkState, SubnetState};
    use crate::services::{ResourceService, Waiter};
    use std::time::Duration;

    #[test]
    fn test_parse_cidr() {
        assert_eq!(
            parse_cidr("10.0.0.0/16").unwrap(),
            (Ipv4Addr::new(10, 0, 0, 0), 16)
        );
        assert!(parse_cidr("10.0.0.0").is_err());
        assert!(parse_cidr("10.0.0.0/33").is_err());
        assert!(parse_cidr("ten/8").is_err());
    }

    #[test]
    fn test_network_becomes_available() {
        let cloud = MockProvider::new(BridgeConfig::default());
        let networks = cloud.networking().networks();
        let mut net = networks.create("backend", "10.1.0.0/16").unwrap();
        assert_eq!(net.state, NetworkState::Pending);

        let quick = WaitOptions::new(Duration::from_secs(1), Duration::from_millis(5));
        networks.wait_till_ready(&mut net, quick).unwrap();
        assert_eq!(net.state, NetworkState::Available);

        let err = networks.create("backend", "10.1.0.0").unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidValue);
    }

    #[test]
    fn test_network_with_subnets_cannot_be_deleted() {
        let cloud = MockProvider::new(BridgeConfig::default()).with_settle_after(0);
        let net = cloud
            .networking()
            .networks()
            .create("backend", "10.1.0.0/16")
            .unwrap();
        let subnet = cloud
            .networking()
            .subnets()
            .create("backend-a", &net.id, "10.1.1.0/24", Some("mock-zone-a"))
            .unwrap();
        assert_eq!(subnet.state, SubnetState::Available);

        let err = cloud.networking().networks().delete(&net.id).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Provider);

        assert!(cloud.networking().subnets().delete(&subnet.id).unwrap());
        assert!(cloud.networking().networks().delete(&net.id).unwrap());
        assert!(!cloud.networking().networks().delete(&net.id).unwrap());
    }

    #[test]
    fn test_default_subnet_is_reused() {
        let cloud = MockProvider::new(BridgeConfig::default());
        let subnets = cloud.networking().subnets();

        let a = subnets.get_or_create_default(Some("mock-zone-a")).unwrap();
        let again = subnets.get_or_create_default(Some("mock-zone-a")).unwrap();
        let b = subnets.get_or_create_default(Some("mock-zone-b")).unwrap();

        assert_eq!(a.id, again.id);
        assert_ne!(a.id, b.id);
        assert_eq!(a.network_id, b.network_id);
        assert_ne!(a.cidr_block, b.cidr_block);
        assert_eq!(cloud.networking().networks().list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_default_subnet_reuses_freed_block() {
        let cloud = MockProvider::new(BridgeConfig::default());
        let subnets = cloud.networking().subnets();

        let a = subnets.get_or_create_default(Some("zone-a")).unwrap();
        let b = subnets.get_or_create_default(Some("zone-b")).unwrap();
        assert!(subnets.delete(&a.id).unwrap());
        let c = subnets.get_or_create_default(Some("zone-c")).unwrap();

        assert_eq!(a.cidr_block, "10.0.0.0/24");
        assert_eq!(b.cidr_block, "10.0.1.0/24");
        assert_eq!(c.cidr_block, "10.0.0.0/24");
    }

    #[test]
    fn test_default_subnets_exhaust_the_network() {
        let cloud = MockProvider::new(BridgeConfig::default());
        let subnets = cloud.networking().subnets();

        let blocks: BTreeSet<String> = (0..256)
            .map(|i| {
                subnets
                    .get_or_create_default(Some(&format!("zone-{i}")))
                    .unwrap()
                    .cidr_block
            })
            .collect();
        assert_eq!(blocks.len(), 256);
        assert!(blocks.contains("10.0.255.0/24"));

        let err = subnets
            .get_or_create_default(Some("zone-overflow"))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Provider);
    }

    #[test]
    fn test_floating_ip_addresses_are_never_shared() {
        let cloud = MockProvider::new(BridgeConfig::default()).with_settle_after(0);
        let net = cloud
            .networking()
            .networks()
            .create("edge", "10.3.0.0/16")
            .unwrap();
        let gw = cloud.networking().gateways().get_or_create(&net.id).unwrap();
        let fips = cloud.networking().floating_ips();

        let first = fips.create(&gw.id).unwrap();
        let second = fips.create(&gw.id).unwrap();
        assert_eq!(first.public_ip, "203.0.113.1");
        assert_eq!(second.public_ip, "203.0.113.2");

        assert!(fips.delete(&first.id).unwrap());
        assert_eq!(fips.create(&gw.id).unwrap().public_ip, "203.0.113.1");

        let addresses: BTreeSet<String> = (0..252)
            .map(|_| fips.create(&gw.id).unwrap().public_ip)
            .collect();
        assert_eq!(addresses.len(), 252);
        assert!(!addresses.contains(&second.public_ip));
        assert_eq!(
            fips.create(&gw.id).unwrap_err().kind,
            ErrorKind::Provider
        );
    }

    #[test]
    fn test_gateway_and_floating_ip() {
        let cloud = MockProvider::new(BridgeConfig::default()).with_settle_after(0);
        let net = cloud
            .networking()
            .networks()
            .create("edge", "10.2.0.0/16")
            .unwrap();
        let gateways = cloud.networking().gateways();
        let gw = gateways.get_or_create(&net.id).unwrap();
        assert_eq!(gateways.get_or_create(&net.id).unwrap().id, gw.id);

        let fip = cloud.networking().floating_ips().create(&gw.id).unwrap();
        assert_eq!(fip.state, FloatingIpState::Available);
        assert!(fip.public_ip.starts_with("203.0.113."));

        let err = cloud
            .networking()
            .floating_ips()
            .create("gw-missing")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
