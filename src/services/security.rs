//! Security service traits.

use crate::error::CloudResult;
use crate::resources::{FirewallRule, KeyPair, RuleSpec, VmFirewall};
use crate::services::ResourceService;

pub trait KeyPairService: ResourceService<KeyPair> {
    /// Import `public_key`, or generate a new key pair when it is `None`. Only
    /// a generated key pair carries private key material.
    ///
    /// # Errors
    ///
    /// `InvalidName` for a bad name, `DuplicateResource` if the name is taken.
    fn create(&self, name: &str, public_key: Option<&str>) -> CloudResult<KeyPair>;

    /// # Errors
    ///
    /// Returns any provider failure.
    fn delete(&self, id: &str) -> CloudResult<bool>;
}

pub trait VmFirewallService: ResourceService<VmFirewall> {
    /// # Errors
    ///
    /// `InvalidLabel` for a bad label, `NotFound` for a missing network.
    fn create(
        &self,
        label: &str,
        network_id: &str,
        description: Option<&str>,
    ) -> CloudResult<VmFirewall>;

    /// # Errors
    ///
    /// Returns any provider failure.
    fn delete(&self, id: &str) -> CloudResult<bool>;

    /// Add a rule. Adding a rule that already exists returns the existing rule.
    ///
    /// # Errors
    ///
    /// `NotFound` for a missing firewall or source firewall, `InvalidValue` for
    /// a rule with no peer or an inverted port range.
    fn add_rule(&self, id: &str, rule: &RuleSpec) -> CloudResult<FirewallRule>;

    /// # Errors
    ///
    /// `NotFound` for a missing firewall.
    fn remove_rule(&self, id: &str, rule_id: &str) -> CloudResult<bool>;
}

pub trait SecurityService: Send + Sync {
    fn key_pairs(&self) -> &dyn KeyPairService;
    fn vm_firewalls(&self) -> &dyn VmFirewallService;
}
