//! Building providers through `ProviderFactory`.

use anyhow::Result;
use cloudbridge::prelude::*;
use cloudbridge::testing::assert_error_kind;

#[test]
fn provider_ids_parse_case_insensitively() -> Result<()> {
    assert_eq!("OpenStack".parse::<ProviderId>()?, ProviderId::OpenStack);
    assert_eq!("AWS".parse::<ProviderId>()?, ProviderId::Aws);
    for id in ProviderId::ALL {
        assert_eq!(id.to_string().parse::<ProviderId>()?, id);
    }
    assert_error_kind("digitalocean".parse::<ProviderId>(), ErrorKind::UnknownProvider);
    Ok(())
}

#[test]
fn unregistered_provider_is_unknown() {
    let factory = ProviderFactory::new();
    let err = assert_error_kind(
        factory.create_provider(ProviderId::Azure, BridgeConfig::default()),
        ErrorKind::UnknownProvider,
    );
    assert!(err.message.contains("azure"));
}

#[cfg(feature = "mock")]
mod with_mock {
    use super::*;
    use cloudbridge::provider::ServiceKind;
    use cloudbridge::providers::mock::{MockProvider, REJECT_CREDENTIALS_KEY};
    use cloudbridge::testing::fast_config;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn default_factory_offers_mock() -> Result<()> {
        let factory = ProviderFactory::default();
        assert_eq!(factory.list_providers(), vec![ProviderId::Mock]);

        let provider = factory.create_provider(ProviderId::Mock, fast_config())?;
        assert_eq!(provider.id(), ProviderId::Mock);
        assert_eq!(provider.config(), &fast_config());
        assert!(provider.authenticate()?);
        for kind in [
            ServiceKind::Compute,
            ServiceKind::Networking,
            ServiceKind::Security,
            ServiceKind::Storage,
        ] {
            assert!(provider.has_service(kind));
        }
        Ok(())
    }

    #[test]
    fn services_share_the_provider_config() -> Result<()> {
        let config = fast_config().with_result_limit(3);
        let provider = ProviderFactory::new().create_provider(ProviderId::Mock, config)?;
        assert_eq!(provider.compute().instances().config().default_result_limit, 3);
        assert_eq!(provider.storage().buckets().config().default_result_limit, 3);
        assert_eq!(provider.networking().subnets().config().default_result_limit, 3);
        Ok(())
    }

    #[test]
    fn invalid_config_is_rejected_before_construction() {
        let config = BridgeConfig::default()
            .with_wait_timeout(Duration::from_secs(1))
            .with_wait_interval(Duration::from_secs(5));
        assert_error_kind(
            ProviderFactory::new().create_provider(ProviderId::Mock, config),
            ErrorKind::InvalidConfiguration,
        );
    }

    #[test]
    fn rejected_credentials_are_not_an_error() -> Result<()> {
        let mut config = fast_config();
        config
            .extra
            .insert(REJECT_CREDENTIALS_KEY.to_string(), "true".to_string());
        let provider = ProviderFactory::new().create_provider(ProviderId::Mock, config)?;
        assert!(!provider.authenticate()?);
        Ok(())
    }

    #[test]
    fn authentication_failures_propagate() {
        let provider = MockProvider::new(fast_config());
        provider.fail_next("provider.authenticate", 1, ErrorKind::Network);
        assert_error_kind(provider.authenticate(), ErrorKind::Network);
        assert_eq!(provider.authenticate(), Ok(true));
    }

    fn build_as_openstack(config: BridgeConfig) -> CloudResult<Arc<dyn CloudProvider>> {
        Ok(Arc::new(MockProvider::new(config.with_region("regionOne"))))
    }

    #[test]
    fn custom_constructors_can_be_registered() -> Result<()> {
        let mut factory = ProviderFactory::empty();
        assert!(factory.list_providers().is_empty());
        factory
            .register(ProviderId::OpenStack, build_as_openstack)
            .register(ProviderId::Mock, MockProvider::construct);
        assert_eq!(
            factory.list_providers(),
            vec![ProviderId::OpenStack, ProviderId::Mock]
        );

        let provider = factory.create_provider(ProviderId::OpenStack, fast_config())?;
        assert_eq!(provider.config().region.as_deref(), Some("regionOne"));
        Ok(())
    }
}
