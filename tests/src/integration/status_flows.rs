//! # Status List Flows
//!
//! Registry lifecycle through the service and its storage port, and a full
//! publish-then-verify round through the node runtime and the log.

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use csl_01_status_list::{
        Base64Alphabet, CodecConfig, Compression, CredentialStatus, InMemoryRegistryStorage,
        RegistryStorage, StatusCodec, StatusList, StatusListError, StatusRegistryApi,
        StatusRegistryService, StatusStride, StorageError,
    };
    use csl_node::{NodeConfig, NodeRuntime, StatusListPublication};
    use shared_crypto::Ed25519KeyPair;
    use shared_types::MessageEnvelope;
    use std::sync::Arc;
    use std::time::Duration;

    /// Raw (uncompressed) 2-bit list: index 0 REVOKED, 2 SUSPENDED,
    /// 4 RESUMED, 100 REVOKED, 1022 SUSPENDED.
    const RAW_FOUR_STATE: &str = "e8KAADwMdAdMAA==";

    /// Storage whose backend is always down.
    struct FailingStorage;

    #[async_trait]
    impl RegistryStorage for FailingStorage {
        async fn get(&self, _reference: &str) -> Result<Option<Vec<u8>>, StorageError> {
            Err(StorageError::Unavailable("disk detached".into()))
        }

        async fn put(&self, _reference: &str, _document: Vec<u8>) -> Result<String, StorageError> {
            Err(StorageError::Unavailable("disk detached".into()))
        }
    }

    fn registry() -> (
        Arc<InMemoryRegistryStorage>,
        StatusRegistryService<InMemoryRegistryStorage>,
    ) {
        let storage = Arc::new(InMemoryRegistryStorage::new());
        (Arc::clone(&storage), StatusRegistryService::new(storage))
    }

    // =========================================================================
    // REGISTRY LIFECYCLE
    // =========================================================================

    #[tokio::test]
    async fn test_full_lifecycle_two_bit() {
        let (_, service) = registry();
        service.create("university", StatusStride::TwoBit).await.unwrap();

        service.issue("university", 0).await.unwrap();
        service.suspend("university", 0).await.unwrap();
        assert_eq!(
            service.resolve("university", 0).await.unwrap(),
            CredentialStatus::Suspended
        );
        service.resume("university", 0).await.unwrap();
        assert_eq!(
            service.resolve("university", 0).await.unwrap(),
            CredentialStatus::Resumed
        );
        service.revoke("university", 0).await.unwrap();
        assert_eq!(
            service.resolve("university", 0).await.unwrap(),
            CredentialStatus::Revoked
        );

        assert_eq!(
            service.resolve("university", 2).await.unwrap(),
            CredentialStatus::Active
        );
        assert_eq!(
            service.resolve("university", 1_000_000).await.unwrap(),
            CredentialStatus::Active
        );
    }

    #[tokio::test]
    async fn test_one_bit_registry_rejects_suspension() {
        let (_, service) = registry();
        service.create("employer", StatusStride::OneBit).await.unwrap();

        service.revoke("employer", 9).await.unwrap();
        let err = service.suspend("employer", 3).await.unwrap_err();
        assert_eq!(
            err,
            StatusListError::UnsupportedStatus {
                status: CredentialStatus::Suspended,
                stride: 1
            }
        );

        service.resume("employer", 9).await.unwrap();
        assert_eq!(
            service.resolve("employer", 9).await.unwrap(),
            CredentialStatus::Active
        );
    }

    #[tokio::test]
    async fn test_misaligned_index_leaves_registry_unchanged() {
        let (storage, service) = registry();
        service.create("list", StatusStride::TwoBit).await.unwrap();
        service.revoke("list", 6).await.unwrap();
        let before = service.load("list").await.unwrap();

        let err = service.revoke("list", 7).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "index must be Multiples of 2 OR 0. e.g. 0, 2, 4, 6, 8, 10, 12, 14"
        );
        assert_eq!(service.load("list").await.unwrap(), before);
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_reference() {
        let (_, service) = registry();
        assert_eq!(
            service.revoke("missing", 0).await,
            Err(StatusListError::NotFound("missing".into()))
        );
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_as_storage_error() {
        let service = StatusRegistryService::new(Arc::new(FailingStorage));

        let err = service.create("list", StatusStride::TwoBit).await.unwrap_err();
        assert_eq!(
            err,
            StatusListError::Storage("Storage backend unavailable: disk detached".into())
        );
        assert!(matches!(
            service.resolve("list", 0).await,
            Err(StatusListError::Storage(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_reported() {
        let (storage, service) = registry();
        storage
            .put("list", b"{\"stride\":2,\"encoded\":\"!!!\"}".to_vec())
            .await
            .unwrap();
        assert!(matches!(
            service.load("list").await,
            Err(StatusListError::Format(_))
        ));

        storage.put("list", b"not json".to_vec()).await.unwrap();
        assert!(matches!(
            service.load("list").await,
            Err(StatusListError::Storage(_))
        ));
    }

    // =========================================================================
    // CODEC INTEROPERABILITY
    // =========================================================================

    #[tokio::test]
    async fn test_registries_with_different_codecs_read_each_other() {
        let storage = Arc::new(InMemoryRegistryStorage::new());
        let gzip = StatusCodec::new(
            CodecConfig::default()
                .with_compression(Compression::Gzip)
                .with_alphabet(Base64Alphabet::UrlSafeNoPad),
        )
        .unwrap();
        let writer = StatusRegistryService::with_codec(Arc::clone(&storage), gzip);
        let reader = StatusRegistryService::new(Arc::clone(&storage));

        writer.create("shared", StatusStride::TwoBit).await.unwrap();
        writer.revoke("shared", 4096).await.unwrap();
        writer.suspend("shared", 8).await.unwrap();

        assert_eq!(
            reader.resolve("shared", 4096).await.unwrap(),
            CredentialStatus::Revoked
        );
        assert_eq!(
            reader.resolve("shared", 8).await.unwrap(),
            CredentialStatus::Suspended
        );

        reader.resume("shared", 8).await.unwrap();
        assert_eq!(
            writer.resolve("shared", 8).await.unwrap(),
            CredentialStatus::Resumed
        );
    }

    #[tokio::test]
    async fn test_externally_encoded_list_can_be_stored_and_mutated() {
        let (_, service) = registry();
        let list = StatusList::from_encoded(StatusStride::TwoBit, RAW_FOUR_STATE).unwrap();
        service.store("imported", &list).await.unwrap();

        service.revoke("imported", 2).await.unwrap();

        let loaded = service.load("imported").await.unwrap();
        assert_eq!(loaded.get(0).unwrap(), CredentialStatus::Revoked);
        assert_eq!(loaded.get(2).unwrap(), CredentialStatus::Revoked);
        assert_eq!(loaded.get(4).unwrap(), CredentialStatus::Resumed);
        assert_eq!(loaded.get(100).unwrap(), CredentialStatus::Revoked);
        assert_eq!(loaded.get(1022).unwrap(), CredentialStatus::Suspended);
        assert_eq!(loaded.count(CredentialStatus::Revoked), 3);
        assert_eq!(loaded.physical_len_bits(), list.physical_len_bits());
    }

    // =========================================================================
    // PUBLICATION
    // =========================================================================

    fn node_config(stride: StatusStride) -> NodeConfig {
        NodeConfig {
            stride,
            registry_entries: 4096,
            confirmation_timeout: Duration::from_secs(3),
            ..NodeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_published_list_matches_registry() {
        let node = NodeRuntime::new(node_config(StatusStride::TwoBit)).unwrap();
        node.provision("issuer-a").await.unwrap();
        node.registry().revoke("issuer-a", 10).await.unwrap();
        node.registry().suspend("issuer-a", 20).await.unwrap();

        let published = node.publish("issuer-a").await.unwrap();

        assert_eq!(published.receipt.topic_id, node.topic_id());
        assert_eq!(node.log().records(node.topic_id()), vec![published.record.clone()]);

        let committed = node.verify_publication(&published.record).unwrap();
        assert_eq!(committed, node.registry().load("issuer-a").await.unwrap());
        assert_eq!(committed.get(10).unwrap(), CredentialStatus::Revoked);
        assert_eq!(committed.get(20).unwrap(), CredentialStatus::Suspended);
        assert_eq!(committed.physical_len_bits(), 8192);
    }

    #[tokio::test]
    async fn test_each_version_is_a_new_ordered_record() {
        let node = NodeRuntime::new(node_config(StatusStride::OneBit)).unwrap();
        node.provision("issuer-b").await.unwrap();

        let first = node.publish("issuer-b").await.unwrap();
        node.registry().revoke("issuer-b", 77).await.unwrap();
        let second = node.publish("issuer-b").await.unwrap();

        assert!(second.record.sequence_number > first.record.sequence_number);
        assert!(second.record.consensus_timestamp > first.record.consensus_timestamp);
        assert_eq!(
            node.verify_publication(&first.record).unwrap().get(77).unwrap(),
            CredentialStatus::Active
        );
        assert_eq!(
            node.verify_publication(&second.record).unwrap().get(77).unwrap(),
            CredentialStatus::Revoked
        );
    }

    #[tokio::test]
    async fn test_foreign_signature_fails_verification() {
        let node = NodeRuntime::new(node_config(StatusStride::TwoBit)).unwrap();
        let list = StatusList::with_capacity(StatusStride::TwoBit, 16);
        let mut envelope = MessageEnvelope::new(StatusListPublication {
            reference: "forged".into(),
            stride: StatusStride::TwoBit,
            encoded: list.serialize().unwrap(),
        });
        envelope.sign(&Ed25519KeyPair::from_seed([0x42; 32])).unwrap();
        let record = node
            .log()
            .publish_raw(node.topic_id(), envelope.to_wire_bytes().unwrap(), true)
            .unwrap();

        assert!(node.verify_publication(&record).is_err());
    }
}
