//! Networking service traits.

use crate::error::CloudResult;
use crate::resources::{FloatingIp, InternetGateway, Network, Subnet};
use crate::services::ResourceService;

/// Label of the network created by [`SubnetService::get_or_create_default`].
pub const DEFAULT_NETWORK_LABEL: &str = "cloudbridge-net";
pub const DEFAULT_SUBNET_LABEL: &str = "cloudbridge-subnet";
pub const DEFAULT_NETWORK_CIDR: &str = "10.0.0.0/16";

pub trait NetworkService: ResourceService<Network> {
    /// # Errors
    ///
    /// `InvalidLabel` for a bad label, `InvalidValue` for a malformed CIDR block.
    fn create(&self, label: &str, cidr_block: &str) -> CloudResult<Network>;

    /// # Errors
    ///
    /// Returns any provider failure, such as deleting a network that still has subnets.
    fn delete(&self, id: &str) -> CloudResult<bool>;
}

pub trait SubnetService: ResourceService<Subnet> {
    /// # Errors
    ///
    /// `NotFound` for a missing network, `InvalidLabel` or `InvalidValue` for bad input.
    fn create(
        &self,
        label: &str,
        network_id: &str,
        cidr_block: &str,
        zone: Option<&str>,
    ) -> CloudResult<Subnet>;

    /// # Errors
    ///
    /// Returns any provider failure.
    fn delete(&self, id: &str) -> CloudResult<bool>;

    /// The default subnet for `zone`, creating it (and its network) on first use.
    ///
    /// # Errors
    ///
    /// Returns any provider failure.
    fn get_or_create_default(&self, zone: Option<&str>) -> CloudResult<Subnet>;
}

pub trait FloatingIpService: ResourceService<FloatingIp> {
    /// Allocate a public address behind `gateway_id`.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing gateway.
    fn create(&self, gateway_id: &str) -> CloudResult<FloatingIp>;

    /// # Errors
    ///
    /// Returns any provider failure.
    fn delete(&self, id: &str) -> CloudResult<bool>;
}

pub trait GatewayService: ResourceService<InternetGateway> {
    /// The gateway attached to `network_id`, creating one if there is none.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing network.
    fn get_or_create(&self, network_id: &str) -> CloudResult<InternetGateway>;

    /// # Errors
    ///
    /// Returns any provider failure.
    fn delete(&self, id: &str) -> CloudResult<bool>;
}

pub trait NetworkingService: Send + Sync {
    fn networks(&self) -> &dyn NetworkService;
    fn subnets(&self) -> &dyn SubnetService;
    fn floating_ips(&self) -> &dyn FloatingIpService;
    fn gateways(&self) -> &dyn GatewayService;
}
