//! End-to-end compute scenarios against the mock provider.

#[cfg(feature = "mock")]
mod mock_compute_tests {
    use anyhow::Result;
    use cloudbridge::prelude::*;
    use cloudbridge::providers::mock::{MOCK_REGION, MOCK_ZONES, MockProvider};
    use cloudbridge::testing::*;

    #[test]
    fn instance_full_lifecycle() -> Result<()> {
        let cloud = mock_provider();
        let networking = cloud.networking();
        let instances = cloud.compute().instances();

        let subnet = networking.subnets().get_or_create_default(Some(MOCK_ZONES[0]))?;
        let key = cloud.security().key_pairs().create("ops", None)?;
        assert!(key.material.is_some());
        let firewall = cloud
            .security()
            .vm_firewalls()
            .create("web", &subnet.network_id, Some("web tier"))?;

        let image = cloud.compute().images().list_all()?.remove(0);
        let spec = InstanceSpec::new("web", &image.id, "m1.small")
            .with_subnet(&subnet.id)
            .with_key_pair(&key.name)
            .with_firewall(&firewall.id)
            .with_user_data("#!/bin/sh\necho hello\n");
        let mut vm = instances.create(&spec)?;
        assert_eq!(vm.label.as_deref(), Some("web"));
        assert_eq!(vm.zone.as_deref(), Some(MOCK_ZONES[0]));
        assert_eq!(vm.firewall_ids, vec![firewall.id.clone()]);
        assert_eq!(vm.private_ips.len(), 1);
        instances.wait_till_ready(&mut vm, WaitOptions::default())?;

        assert!(instances.reboot(&vm.id)?);
        assert_eq!(
            instances.get(&vm.id)?.map(|vm| vm.state),
            Some(InstanceState::Running)
        );

        let gateway = networking.gateways().get_or_create(&subnet.network_id)?;
        let fip = networking.floating_ips().create(&gateway.id)?;
        assert_eq!(fip.state, FloatingIpState::Available);

        instances.add_floating_ip(&vm.id, &fip.id)?;
        let vm_now = instances.get(&vm.id)?.expect("instance exists");
        assert_eq!(vm_now.public_ips, vec![fip.public_ip.clone()]);
        let fip_now = networking.floating_ips().get(&fip.id)?.expect("floating IP exists");
        assert_eq!(fip_now.state, FloatingIpState::InUse);
        assert_eq!(fip_now.private_ip, vm_now.private_ips.first().cloned());

        assert_error_kind(
            instances.add_floating_ip(&vm.id, &fip.id),
            ErrorKind::InvalidValue,
        );
        instances.remove_floating_ip(&vm.id, &fip.id)?;
        assert!(instances.get(&vm.id)?.expect("instance exists").public_ips.is_empty());
        assert_error_kind(
            instances.remove_floating_ip(&vm.id, &fip.id),
            ErrorKind::InvalidValue,
        );

        assert!(instances.delete(&vm.id)?);
        instances.wait_till_deleted(&mut vm, WaitOptions::default())?;
        assert!(!instances.delete(&vm.id)?);
        Ok(())
    }

    #[test]
    fn deleting_an_instance_releases_its_floating_ip() -> Result<()> {
        let cloud = mock_provider();
        let networking = cloud.networking();
        let subnet = networking.subnets().get_or_create_default(None)?;
        let gateway = networking.gateways().get_or_create(&subnet.network_id)?;
        let fip = networking.floating_ips().create(&gateway.id)?;

        let vm = launch_instance(&cloud, "edge")?;
        cloud.compute().instances().add_floating_ip(&vm.id, &fip.id)?;
        assert_error_kind(
            networking.floating_ips().delete(&fip.id),
            ErrorKind::Provider,
        );

        cloud.compute().instances().delete(&vm.id)?;
        let released = networking.floating_ips().get(&fip.id)?.expect("floating IP exists");
        assert!(!released.in_use());
        assert!(networking.floating_ips().delete(&fip.id)?);
        Ok(())
    }

    #[test]
    fn captured_image_can_launch_new_instances() -> Result<()> {
        let cloud = mock_provider();
        let compute = cloud.compute();
        let mut vm = launch_instance(&cloud, "golden")?;
        compute.instances().wait_till_ready(&mut vm, WaitOptions::default())?;

        let mut image = compute.instances().create_image(&vm.id, "golden-image")?;
        assert_eq!(image.state, MachineImageState::Pending);
        compute.images().wait_till_ready(&mut image, WaitOptions::default())?;

        let clone = compute
            .instances()
            .create(&InstanceSpec::new("clone", &image.id, "m1.tiny"))?;
        assert_eq!(clone.image_id, image.id);

        assert!(compute.images().delete(&image.id)?);
        assert!(compute.images().get(&image.id)?.is_none());
        Ok(())
    }

    #[test]
    fn create_image_of_missing_instance_fails() {
        let cloud = mock_provider();
        assert_error_kind(
            cloud.compute().instances().create_image("inst-999999", "nothing"),
            ErrorKind::NotFound,
        );
    }

    #[test]
    fn launch_config_with_volumes() -> Result<()> {
        let cloud = mock_provider();
        let compute = cloud.compute();
        let image = compute.images().list_all()?.remove(0);
        let min_disk = image.min_disk_gb.unwrap_or(1);

        let mut lc = LaunchConfig::new();
        lc.add_volume_device(BlockSource::Image(image.id.clone()), Some(min_disk + 10), true, true)?
            .add_volume_device(BlockSource::Blank, Some(50), false, true)?
            .add_ephemeral_device();
        assert_eq!(lc.block_devices().len(), 3);

        let vm = compute
            .instances()
            .create(&InstanceSpec::new("app", &image.id, "m1.medium").with_launch_config(lc))?;
        assert_eq!(vm.image_id, image.id);

        let mut missing = LaunchConfig::new();
        missing.add_volume_device(BlockSource::Volume("vol-404".into()), None, false, false)?;
        assert_error_kind(
            compute
                .instances()
                .create(&InstanceSpec::new("app", &image.id, "m1.medium").with_launch_config(missing)),
            ErrorKind::InvalidConfiguration,
        );
        Ok(())
    }

    #[test]
    fn snapshot_round_trip() -> Result<()> {
        let cloud = mock_provider();
        let compute = cloud.compute();

        let mut volume = compute.volumes().create("data", 30, None, None, Some("db data"))?;
        compute.volumes().wait_till_ready(&mut volume, WaitOptions::default())?;

        let mut snapshot = compute.volumes().create_snapshot(&volume.id, "nightly", None)?;
        compute.snapshots().wait_till_ready(&mut snapshot, WaitOptions::default())?;
        assert_eq!(snapshot.volume_id, volume.id);
        assert_eq!(snapshot.size_gb, 30);

        let restored = compute.snapshots().create_volume(&snapshot.id, None, None)?;
        assert_eq!(restored.size_gb, 30);
        assert_eq!(restored.source_snapshot_id.as_deref(), Some(snapshot.id.as_str()));

        assert_error_kind(
            compute.volumes().create("small", 10, None, Some(&snapshot.id), None),
            ErrorKind::InvalidValue,
        );
        let bigger = compute
            .volumes()
            .create("bigger", 40, None, Some(&snapshot.id), None)?;
        assert_eq!(bigger.size_gb, 40);

        assert!(compute.snapshots().delete(&snapshot.id)?);
        assert!(!compute.snapshots().delete(&snapshot.id)?);
        assert_error_kind(
            compute.snapshots().create_volume(&snapshot.id, None, None),
            ErrorKind::NotFound,
        );
        Ok(())
    }

    #[test]
    fn volume_validation() {
        let cloud = mock_provider();
        let volumes = cloud.compute().volumes();
        assert_error_kind(
            volumes.create("empty", 0, None, None, None),
            ErrorKind::InvalidValue,
        );
        assert_error_kind(
            volumes.create("Not A Label", 5, None, None, None),
            ErrorKind::InvalidLabel,
        );
        assert_error_kind(volumes.attach("vol-404", "inst-404", "/dev/vdb"), ErrorKind::NotFound);
        assert_error_kind(volumes.detach("vol-404"), ErrorKind::NotFound);
    }

    #[test]
    fn catalog_lookups() -> Result<()> {
        let cloud = MockProvider::new(fast_config().with_region(MOCK_REGION));
        let compute = cloud.compute();

        let tiny = compute.vm_types().get("m1.tiny")?.expect("m1.tiny is seeded");
        assert!(tiny.vcpus >= 1);
        assert!(compute.vm_types().get("z9.mega")?.is_none());

        let region = compute.regions().current()?.expect("region is configured");
        assert_eq!(region.id, MOCK_REGION);
        assert_eq!(region.zones, MOCK_ZONES.map(String::from).to_vec());
        assert_eq!(compute.regions().list_all()?.len(), 1);

        let unconfigured = mock_provider();
        assert!(unconfigured.compute().regions().current()?.is_none());
        Ok(())
    }

    #[test]
    fn injected_create_failures_leave_no_trace() -> Result<()> {
        let cloud = mock_provider();
        cloud.fail_next("instances.create", 1, ErrorKind::RateLimited);
        let err = assert_error_kind(launch_instance(&cloud, "web"), ErrorKind::RateLimited);
        assert!(err.is_transient());
        assert!(cloud.compute().instances().list_all()?.is_empty());

        launch_instance(&cloud, "web")?;
        assert_eq!(cloud.compute().instances().list_all()?.len(), 1);
        Ok(())
    }
}
