//! Registry Tests

#[cfg(test)]
mod integration_tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use crate::logic::category::ThreatCategory;
    use crate::logic::model::testing::{detector, write_artifact};
    use crate::logic::model::{load_artifact, AlgorithmKind, ModelLoadError};
    use crate::logic::registry::{ModelKey, ModelRegistry, NotReady, Readiness};

    #[test]
    fn test_unknown_key_not_ready() {
        let registry = ModelRegistry::new();
        let err = registry.get(ThreatCategory::Phishing, AlgorithmKind::LightGbm).unwrap_err();
        assert_eq!(err, NotReady::Unknown);
        assert!(!registry.detection_available());
    }

    #[test]
    fn test_declared_key_reports_loading() {
        let registry = ModelRegistry::new();
        registry.declare(ThreatCategory::Trojan, AlgorithmKind::XgBoost);

        assert_eq!(
            registry.get(ThreatCategory::Trojan, AlgorithmKind::XgBoost).unwrap_err(),
            NotReady::Loading
        );
        let status = registry.status();
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].readiness, Readiness::Loading);
    }

    #[test]
    fn test_load_blocking_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(
            dir.path(),
            "LGBM_model.json",
            &detector(ThreatCategory::Phishing, AlgorithmKind::LightGbm, 0, 0.8),
        );

        let registry = ModelRegistry::new();
        let handle = registry.load_blocking(ThreatCategory::Phishing, AlgorithmKind::LightGbm, &path).unwrap();
        assert_eq!(handle.algorithm(), AlgorithmKind::LightGbm);
        assert_eq!(handle.expected_input_len(), 5);

        let served = registry.get(ThreatCategory::Phishing, AlgorithmKind::LightGbm).unwrap();
        assert!(Arc::ptr_eq(&handle, &served));
        assert!(registry.detection_available());
    }

    #[tokio::test]
    async fn test_async_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(
            dir.path(),
            "xgBoost_model.json",
            &detector(ThreatCategory::Trojan, AlgorithmKind::XgBoost, 1, 0.7),
        );

        let registry = ModelRegistry::new();
        registry.declare(ThreatCategory::Trojan, AlgorithmKind::XgBoost);
        registry.load(ThreatCategory::Trojan, AlgorithmKind::XgBoost, path).await.unwrap();

        assert!(registry.get(ThreatCategory::Trojan, AlgorithmKind::XgBoost).is_ok());
        assert_eq!(registry.status()[0].readiness, Readiness::Ready);
    }

    #[test]
    fn test_category_mismatch_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(
            dir.path(),
            "model.json",
            &detector(ThreatCategory::Trojan, AlgorithmKind::XgBoost, 0, 0.7),
        );

        let registry = ModelRegistry::new();
        match registry.load_blocking(ThreatCategory::Ransomware, AlgorithmKind::XgBoost, &path) {
            Err(ModelLoadError::CategoryMismatch { requested, found }) => {
                assert_eq!(requested, ThreatCategory::Ransomware);
                assert_eq!(found, ThreatCategory::Trojan);
            }
            other => panic!("Expected CategoryMismatch, got {:?}", other),
        }
        assert_eq!(registry.ready_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_load_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_artifact(
            dir.path(),
            "LGBM_model.json",
            &detector(ThreatCategory::Phishing, AlgorithmKind::LightGbm, 0, 0.8),
        );
        let missing = dir.path().join("random_forest_model.json");

        let registry = ModelRegistry::new();
        let rf = ModelKey::new(ThreatCategory::Ransomware, AlgorithmKind::RandomForest);
        let lgbm = ModelKey::new(ThreatCategory::Phishing, AlgorithmKind::LightGbm);
        registry.declare(rf.category, rf.algorithm);
        registry.declare(lgbm.category, lgbm.algorithm);

        assert!(registry.load(rf.category, rf.algorithm, missing).await.is_err());
        assert!(registry.load(lgbm.category, lgbm.algorithm, good).await.is_ok());

        assert!(matches!(
            registry.get(rf.category, rf.algorithm),
            Err(NotReady::Failed(_))
        ));
        assert!(registry.get(lgbm.category, lgbm.algorithm).is_ok());
        assert!(registry.detection_available());
    }

    #[tokio::test]
    async fn test_expected_algorithm_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(
            dir.path(),
            "model.json",
            &detector(ThreatCategory::Phishing, AlgorithmKind::RandomForest, 0, 0.8),
        );

        let registry = ModelRegistry::new();
        let key = ModelKey::new(ThreatCategory::Phishing, AlgorithmKind::LightGbm);
        let err = registry.load(key.category, key.algorithm, path).await.unwrap_err();
        assert!(matches!(err, ModelLoadError::InvalidModel(_)));
        assert!(registry.get(ThreatCategory::Phishing, AlgorithmKind::RandomForest).is_err());
    }

    #[test]
    fn test_reload_replaces_handle() {
        let dir = tempfile::tempdir().unwrap();
        let first = write_artifact(
            dir.path(),
            "v1.json",
            &detector(ThreatCategory::Phishing, AlgorithmKind::LightGbm, 0, 0.8),
        );
        let second = write_artifact(
            dir.path(),
            "v2.json",
            &detector(ThreatCategory::Phishing, AlgorithmKind::LightGbm, 1, 0.9),
        );

        let registry = ModelRegistry::new();
        let old = registry.load_blocking(ThreatCategory::Phishing, AlgorithmKind::LightGbm, &first).unwrap();
        let new = registry.load_blocking(ThreatCategory::Phishing, AlgorithmKind::LightGbm, &second).unwrap();

        assert!(new.generation > old.generation);
        let served = registry.get(ThreatCategory::Phishing, AlgorithmKind::LightGbm).unwrap();
        assert!(Arc::ptr_eq(&served, &new));
        // Borrowers of the old handle keep a working model
        assert!(old.model().predict(&[1.0, 0.0, 0.0, 0.0, 0.0]).unwrap().label);
        assert_eq!(registry.algorithms_for(ThreatCategory::Phishing), vec![AlgorithmKind::LightGbm]);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_prior_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(
            dir.path(),
            "LGBM_model.json",
            &detector(ThreatCategory::Phishing, AlgorithmKind::LightGbm, 0, 0.8),
        );

        let registry = ModelRegistry::new();
        let key = ModelKey::new(ThreatCategory::Phishing, AlgorithmKind::LightGbm);
        let original = registry.load(key.category, key.algorithm, path.clone()).await.unwrap();

        std::fs::write(&path, b"{ truncated").unwrap();
        assert!(registry.load(key.category, key.algorithm, path).await.is_err());

        let served = registry.get(key.category, key.algorithm).unwrap();
        assert!(Arc::ptr_eq(&served, &original));
        let status = registry.status();
        assert_eq!(status[0].readiness, Readiness::Ready);
        assert!(status[0].last_error.is_some());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reload_never_torn() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_artifact(
            dir.path(),
            "xgBoost_model.json",
            &detector(ThreatCategory::Trojan, AlgorithmKind::XgBoost, 2, 0.9),
        );

        let registry = Arc::new(ModelRegistry::new());
        registry.load_blocking(ThreatCategory::Trojan, AlgorithmKind::XgBoost, &path).unwrap();
        let done = Arc::new(AtomicBool::new(false));

        let mut readers = Vec::new();
        for _ in 0..4 {
            let registry = registry.clone();
            let done = done.clone();
            readers.push(tokio::spawn(async move {
                let mut reads = 0u32;
                while !done.load(Ordering::Relaxed) {
                    let handle = registry
                        .get(ThreatCategory::Trojan, AlgorithmKind::XgBoost)
                        .expect("handle stays served across reloads");
                    assert_eq!(handle.expected_input_len(), 5);
                    let score = handle.model().predict(&[0.0, 0.0, 1.0, 0.0, 0.0]).unwrap();
                    assert!(score.label);
                    reads += 1;
                    tokio::task::yield_now().await;
                }
                reads
            }));
        }

        for _ in 0..20 {
            registry.load(ThreatCategory::Trojan, AlgorithmKind::XgBoost, path.clone()).await.unwrap();
        }
        done.store(true, Ordering::Relaxed);

        for reader in readers {
            reader.await.unwrap();
        }
        let handle = registry.get(ThreatCategory::Trojan, AlgorithmKind::XgBoost).unwrap();
        assert_eq!(handle.generation, 21);
    }

    #[test]
    fn test_failed_load_of_declared_key_reports_failed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("LGBM_model.json");

        let registry = ModelRegistry::new();
        registry.declare(ThreatCategory::Phishing, AlgorithmKind::LightGbm);
        let err = registry
            .load_blocking(ThreatCategory::Phishing, AlgorithmKind::LightGbm, &missing)
            .unwrap_err();
        assert!(matches!(err, ModelLoadError::NotFound(_)));

        assert!(matches!(
            registry.get(ThreatCategory::Phishing, AlgorithmKind::LightGbm),
            Err(NotReady::Failed(_))
        ));
        let status = registry.status();
        assert_eq!(status[0].readiness, Readiness::Failed);
        assert!(status[0].last_error.is_some());
    }

    #[test]
    fn test_stale_load_does_not_replace_newer_handle() {
        let dir = tempfile::tempdir().unwrap();
        let older = write_artifact(
            dir.path(),
            "older.json",
            &detector(ThreatCategory::Trojan, AlgorithmKind::XgBoost, 0, 0.7),
        );
        let newer = write_artifact(
            dir.path(),
            "newer.json",
            &detector(ThreatCategory::Trojan, AlgorithmKind::XgBoost, 1, 0.9),
        );

        let registry = ModelRegistry::new();
        let key = ModelKey::new(ThreatCategory::Trojan, AlgorithmKind::XgBoost);
        let first = registry.reserve_generation();
        let second = registry.reserve_generation();

        // The later load finishes decoding first
        let current = registry.install(key, second, &newer, load_artifact(&newer)).unwrap();
        let kept = registry.install(key, first, &older, load_artifact(&older)).unwrap();

        assert!(Arc::ptr_eq(&current, &kept));
        let served = registry.get(key.category, key.algorithm).unwrap();
        assert_eq!(served.generation, second);
        assert_eq!(served.source, newer);
    }

    #[test]
    fn test_unload_and_order() {
        let dir = tempfile::tempdir().unwrap();
        let rf = write_artifact(
            dir.path(),
            "rf.json",
            &detector(ThreatCategory::Phishing, AlgorithmKind::RandomForest, 0, 0.8),
        );
        let lgbm = write_artifact(
            dir.path(),
            "lgbm.json",
            &detector(ThreatCategory::Phishing, AlgorithmKind::LightGbm, 0, 0.8),
        );

        let registry = ModelRegistry::new();
        registry.declare(ThreatCategory::Phishing, AlgorithmKind::LightGbm);
        registry.load_blocking(ThreatCategory::Phishing, AlgorithmKind::RandomForest, &rf).unwrap();
        registry.load_blocking(ThreatCategory::Phishing, AlgorithmKind::LightGbm, &lgbm).unwrap();

        assert_eq!(
            registry.algorithms_for(ThreatCategory::Phishing),
            vec![AlgorithmKind::LightGbm, AlgorithmKind::RandomForest]
        );

        assert!(registry.unload(ThreatCategory::Phishing, AlgorithmKind::LightGbm).is_some());
        assert_eq!(
            registry.algorithms_for(ThreatCategory::Phishing),
            vec![AlgorithmKind::RandomForest]
        );
        assert_eq!(
            registry.get(ThreatCategory::Phishing, AlgorithmKind::LightGbm).unwrap_err(),
            NotReady::Unknown
        );

        registry.clear();
        assert!(registry.status().is_empty());
    }
}
