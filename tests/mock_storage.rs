//! Object storage scenarios against the mock provider.

#[cfg(feature = "mock")]
mod mock_storage_tests {
    use anyhow::Result;
    use cloudbridge::pagination::collect_all;
    use cloudbridge::prelude::*;
    use cloudbridge::testing::*;

    #[test]
    fn objects_round_trip_with_checksums() -> Result<()> {
        let cloud = mock_provider();
        let buckets = cloud.storage().buckets();
        buckets.create("artifacts")?;

        let first = buckets.put_object("artifacts", "build/app.tar", b"v1")?;
        let second = buckets.put_object("artifacts", "build/app.tar", b"v2")?;
        assert_eq!(first.bucket, "artifacts");
        assert_ne!(first.checksum, second.checksum);
        assert_eq!(
            buckets.get_object("artifacts", "build/app.tar")?,
            Some(b"v2".to_vec())
        );

        let same = buckets.put_object("artifacts", "copy/app.tar", b"v2")?;
        assert_eq!(same.checksum, second.checksum);

        let listed = buckets.list_objects("artifacts", None, None, None)?;
        assert_ids(&listed, &["build/app.tar", "copy/app.tar"]);
        Ok(())
    }

    #[test]
    fn object_listing_pages_on_the_server() -> Result<()> {
        let cloud = mock_provider();
        let buckets = cloud.storage().buckets();
        buckets.create("logs")?;
        let keys: Vec<String> = (0..9).map(|i| format!("day-{i:02}.log")).collect();
        for key in &keys {
            buckets.put_object("logs", key, key.as_bytes())?;
        }
        let expected: Vec<&str> = keys.iter().map(String::as_str).collect();

        for limit in [1, 4, 9, 10] {
            assert_pages_reconstruct(limit, &expected, |limit, marker| {
                buckets.list_objects("logs", None, limit, marker)
            });
        }

        let page = buckets.list_objects("logs", None, Some(4), None)?;
        assert!(page.supports_server_paging());
        assert_eq!(page.total_results(), None);

        let garbage = buckets.list_objects("logs", None, Some(4), Some("day-03.log"))?;
        assert!(garbage.is_empty());
        Ok(())
    }

    #[test]
    fn prefix_filter_combines_with_paging() -> Result<()> {
        let cloud = mock_provider();
        let buckets = cloud.storage().buckets();
        buckets.create("media")?;
        for key in ["img/a.png", "img/b.png", "img/c.png", "vid/a.mp4"] {
            buckets.put_object("media", key, b"bytes")?;
        }

        let images = collect_all(Some(2), |limit, marker| {
            buckets.list_objects("media", Some("img/"), limit, marker)
        })?;
        assert_ids(&images, &["img/a.png", "img/b.png", "img/c.png"]);
        assert!(buckets.list_objects("media", Some("txt/"), None, None)?.is_empty());
        Ok(())
    }

    #[test]
    fn bucket_rules() -> Result<()> {
        let cloud = mock_provider();
        let buckets = cloud.storage().buckets();

        assert_error_kind(buckets.create("UPPER"), ErrorKind::InvalidName);
        assert_error_kind(buckets.create("a..b"), ErrorKind::InvalidName);
        buckets.create("data.example.com")?;
        buckets.create("2024-archive")?;
        assert_error_kind(buckets.create("2024-archive"), ErrorKind::DuplicateResource);
        assert_ids(&buckets.list_all()?, &["2024-archive", "data.example.com"]);

        assert_error_kind(buckets.put_object("data.example.com", "", b"x"), ErrorKind::InvalidValue);
        assert_error_kind(
            buckets.list_objects("missing-bucket", None, None, None),
            ErrorKind::NotFound,
        );
        assert!(!buckets.delete_object("data.example.com", "nothing")?);
        assert!(buckets.delete("2024-archive")?);
        assert!(buckets.get("2024-archive")?.is_none());
        Ok(())
    }

    #[test]
    fn storage_faults_surface_to_callers() -> Result<()> {
        let cloud = mock_provider();
        let buckets = cloud.storage().buckets();
        buckets.create("flaky")?;

        cloud.fail_next("buckets.put_object", 1, ErrorKind::ServiceUnavailable);
        assert_error_kind(
            buckets.put_object("flaky", "k", b"v"),
            ErrorKind::ServiceUnavailable,
        );
        assert_eq!(buckets.get_object("flaky", "k")?, None);
        buckets.put_object("flaky", "k", b"v")?;
        assert_eq!(buckets.get_object("flaky", "k")?, Some(b"v".to_vec()));
        Ok(())
    }
}
