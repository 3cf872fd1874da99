//! Engine Tests - full pipeline

#[cfg(test)]
mod integration_tests {
    use std::path::Path;
    use std::sync::Arc;
    use parking_lot::Mutex;
    use tokio::sync::oneshot;
    use uuid::Uuid;

    use crate::logic::category::ThreatCategory;
    use crate::logic::config::{EngineConfig, ModelSpec};
    use crate::logic::engine::{ThreatEngine, WarningPresenter};
    use crate::logic::ensemble::AbstainReason;
    use crate::logic::features::{CategoryBags, RawFeatureBag};
    use crate::logic::gate::{BlockReason, GateConfig, GateOutcome, UserChoice};
    use crate::logic::model::testing::{detector, write_artifact};
    use crate::logic::model::AlgorithmKind;
    use crate::logic::registry::Readiness;
    use crate::logic::verdict::{DetectionStatus, Verdict};

    // ========================================================================
    // FIXTURES
    // ========================================================================

    enum Answer {
        Choose(UserChoice),
        /// Keep the sender alive and never answer
        Ignore,
        /// Drop the sender (tab closed)
        Close,
    }

    struct ScriptedPresenter {
        answer: Answer,
        shown: Mutex<Vec<(Uuid, Verdict)>>,
        pending: Mutex<Vec<oneshot::Sender<UserChoice>>>,
    }

    impl ScriptedPresenter {
        fn new(answer: Answer) -> Self {
            Self {
                answer,
                shown: Mutex::new(Vec::new()),
                pending: Mutex::new(Vec::new()),
            }
        }

        fn shown_count(&self) -> usize {
            self.shown.lock().len()
        }
    }

    impl WarningPresenter for ScriptedPresenter {
        fn present_warning(&self, gate_id: Uuid, verdict: &Verdict) -> oneshot::Receiver<UserChoice> {
            self.shown.lock().push((gate_id, verdict.clone()));
            let (tx, rx) = oneshot::channel();
            match self.answer {
                Answer::Choose(choice) => {
                    let _ = tx.send(choice);
                }
                Answer::Ignore => self.pending.lock().push(tx),
                Answer::Close => drop(tx),
            }
            rx
        }
    }

    /// Detectors keyed on: ransomware hasMzHeader, phishing domainReputation,
    /// trojan registryChanges
    fn model_specs(dir: &Path) -> Vec<ModelSpec> {
        let specs = [
            (ThreatCategory::Ransomware, AlgorithmKind::RandomForest, 8, "random_forest_model.json"),
            (ThreatCategory::Phishing, AlgorithmKind::LightGbm, 1, "LGBM_model.json"),
            (ThreatCategory::Trojan, AlgorithmKind::XgBoost, 4, "xgBoost_model.json"),
        ];
        specs
            .iter()
            .map(|(category, algorithm, feature, file)| ModelSpec {
                category: *category,
                algorithm: *algorithm,
                path: write_artifact(dir, file, &detector(*category, *algorithm, *feature, 0.9)),
            })
            .collect()
    }

    fn bags(ransomware: bool, phishing: bool, trojan: bool) -> CategoryBags {
        let mut bags = CategoryBags::new();
        bags.insert(
            ThreatCategory::Ransomware,
            RawFeatureBag::new()
                .with("fileDownloadBehavior", ransomware)
                .with("encryptionPatterns", false)
                .with("networkProtocols", false)
                .with("fileSystemActivities", false)
                .with("machine", "amd64")
                .with("fileSizeKb", 120.0)
                .with("byteEntropy", 4.2)
                .with("suspiciousStrings", false)
                .with("hasMzHeader", ransomware),
        );
        bags.insert(
            ThreatCategory::Phishing,
            RawFeatureBag::new()
                .with("urlStructure", false)
                .with("domainReputation", phishing)
                .with("htmlContent", false)
                .with("sslCertificates", false)
                .with("phishingKeywords", false),
        );
        bags.insert(
            ThreatCategory::Trojan,
            RawFeatureBag::new()
                .with("networkTrafficAnomalies", false)
                .with("systemCallPatterns", false)
                .with("fileSystemModifications", false)
                .with("processBehavior", false)
                .with("registryChanges", trojan),
        );
        bags
    }

    async fn loaded_engine(dir: &Path, gate: GateConfig) -> ThreatEngine {
        let mut config = EngineConfig::with_model_dir(dir);
        config.models = model_specs(dir);
        config.gate = gate;

        let engine = ThreatEngine::from_config(&config).unwrap();
        let reports = engine.load_models(&config.models).await;
        assert!(reports.iter().all(|r| r.is_ok()));
        engine
    }

    // ========================================================================
    // EVALUATE
    // ========================================================================

    #[tokio::test]
    async fn test_evaluate_precedence() {
        let dir = tempfile::tempdir().unwrap();
        let engine = loaded_engine(dir.path(), GateConfig::default()).await;

        let verdict = engine.evaluate(&bags(true, true, false));
        assert_eq!(verdict.category, Some(ThreatCategory::Ransomware));
        assert_eq!(verdict.predictions.len(), 3);

        let verdict = engine.evaluate(&bags(false, true, true));
        assert_eq!(verdict.category, Some(ThreatCategory::Phishing));

        let verdict = engine.evaluate(&bags(false, false, false));
        assert_eq!(verdict.category, None);
        assert_eq!(verdict.detection, DetectionStatus::Available);
    }

    #[tokio::test]
    async fn test_missing_bag_not_evaluated() {
        let dir = tempfile::tempdir().unwrap();
        let engine = loaded_engine(dir.path(), GateConfig::default()).await;

        let mut partial = bags(false, false, true);
        partial.remove(&ThreatCategory::Ransomware);
        partial.remove(&ThreatCategory::Phishing);

        let verdict = engine.evaluate(&partial);
        assert_eq!(verdict.predictions.len(), 1);
        assert_eq!(verdict.category, Some(ThreatCategory::Trojan));
    }

    #[tokio::test]
    async fn test_schema_mismatch_contained_to_category() {
        let dir = tempfile::tempdir().unwrap();
        let engine = loaded_engine(dir.path(), GateConfig::default()).await;

        let mut broken = bags(false, true, false);
        broken.insert(
            ThreatCategory::Ransomware,
            RawFeatureBag::new().with("fileDownloadBehavior", "yes"),
        );

        let verdict = engine.evaluate(&broken);
        assert_eq!(verdict.category, Some(ThreatCategory::Phishing));
        assert!(matches!(
            verdict.predictions[0].abstain_reason,
            Some(AbstainReason::SchemaMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn test_partial_load_failure_degrades() {
        let dir = tempfile::tempdir().unwrap();
        let mut specs = model_specs(dir.path());
        std::fs::write(&specs[0].path, b"garbage").unwrap();
        specs[2].path = dir.path().join("missing.json");

        let engine = ThreatEngine::new(
            Arc::new(crate::logic::registry::ModelRegistry::new()),
            Default::default(),
            GateConfig::default(),
        )
        .unwrap();
        let reports = engine.load_models(&specs).await;
        assert_eq!(reports.iter().filter(|r| r.is_ok()).count(), 1);

        let verdict = engine.evaluate(&bags(true, true, true));
        assert_eq!(verdict.category, Some(ThreatCategory::Phishing));
        assert_eq!(verdict.abstentions(), 2);

        let status = engine.status();
        assert!(status.detection_available);
        let readiness: Vec<_> = status.models.iter().map(|m| m.readiness).collect();
        assert_eq!(readiness, vec![Readiness::Failed, Readiness::Ready, Readiness::Failed]);
    }

    #[tokio::test]
    async fn test_nothing_loaded_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::with_model_dir(dir.path());
        let engine = ThreatEngine::from_config(&config).unwrap();

        let verdict = engine.evaluate(&bags(true, true, true));
        assert_eq!(verdict.detection, DetectionStatus::Unavailable);
        assert!(verdict.predictions.iter().all(|p| p.abstain_reason == Some(AbstainReason::NotReady)));
        assert!(!engine.status().detection_available);
    }

    // ========================================================================
    // NAVIGATE
    // ========================================================================

    #[tokio::test]
    async fn test_clean_page_allowed_without_warning() {
        let dir = tempfile::tempdir().unwrap();
        let engine = loaded_engine(dir.path(), GateConfig::default()).await;
        let presenter = ScriptedPresenter::new(Answer::Choose(UserChoice::GoBack));

        let decision = engine.navigate(&bags(false, false, false), &presenter).await.unwrap();
        assert!(decision.is_allowed());
        assert!(!decision.warned);
        assert_eq!(presenter.shown_count(), 0);
    }

    #[tokio::test]
    async fn test_threat_user_continues() {
        let dir = tempfile::tempdir().unwrap();
        let engine = loaded_engine(dir.path(), GateConfig::default()).await;
        let presenter = ScriptedPresenter::new(Answer::Choose(UserChoice::Continue));

        let decision = engine.navigate(&bags(false, true, false), &presenter).await.unwrap();
        assert!(decision.warned);
        assert!(decision.is_allowed());

        let shown = presenter.shown.lock();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, decision.gate_id);
        assert_eq!(shown[0].1.category, Some(ThreatCategory::Phishing));
    }

    #[tokio::test]
    async fn test_threat_user_goes_back() {
        let dir = tempfile::tempdir().unwrap();
        let engine = loaded_engine(dir.path(), GateConfig::default()).await;
        let presenter = ScriptedPresenter::new(Answer::Choose(UserChoice::GoBack));

        let decision = engine.navigate(&bags(true, false, false), &presenter).await.unwrap();
        assert_eq!(decision.outcome, GateOutcome::Block(BlockReason::UserWentBack));
    }

    #[tokio::test]
    async fn test_threat_timeout_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let gate = GateConfig { decision_timeout_secs: 0, ..GateConfig::default() };
        let engine = loaded_engine(dir.path(), gate).await;
        let presenter = ScriptedPresenter::new(Answer::Ignore);

        let decision = engine.navigate(&bags(false, false, true), &presenter).await.unwrap();
        assert_eq!(decision.outcome, GateOutcome::Block(BlockReason::DecisionTimeout));
    }

    #[tokio::test]
    async fn test_closed_warning_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let engine = loaded_engine(dir.path(), GateConfig::default()).await;
        let presenter = ScriptedPresenter::new(Answer::Close);

        let decision = engine.navigate(&bags(false, true, false), &presenter).await.unwrap();
        assert_eq!(decision.outcome, GateOutcome::Block(BlockReason::Abandoned));

        let stats = engine.status().gate;
        assert_eq!(stats.warned, 1);
        assert_eq!(stats.blocked, 1);
    }

    #[tokio::test]
    async fn test_unavailable_detection_warns_unless_permissive() {
        let dir = tempfile::tempdir().unwrap();
        let config = EngineConfig::with_model_dir(dir.path());
        let engine = ThreatEngine::from_config(&config).unwrap();
        let presenter = ScriptedPresenter::new(Answer::Choose(UserChoice::Continue));

        let decision = engine.navigate(&bags(false, false, false), &presenter).await.unwrap();
        assert!(decision.warned);
        assert_eq!(decision.verdict.detection, DetectionStatus::Unavailable);

        let mut permissive = EngineConfig::with_model_dir(dir.path());
        permissive.gate = GateConfig::permissive_when_unavailable();
        let engine = ThreatEngine::from_config(&permissive).unwrap();
        let decision = engine.navigate(&bags(false, false, false), &presenter).await.unwrap();
        assert!(!decision.warned);
        assert!(decision.is_allowed());
    }

    #[tokio::test]
    async fn test_background_load_mid_evaluation() {
        let dir = tempfile::tempdir().unwrap();
        let specs = model_specs(dir.path());
        let engine = ThreatEngine::new(
            Arc::new(crate::logic::registry::ModelRegistry::new()),
            Default::default(),
            GateConfig::default(),
        )
        .unwrap();

        let loading = engine.spawn_model_loads(&specs);
        // Every prediction is either scored or NotReady, never an error
        let verdict = engine.evaluate(&bags(false, true, false));
        assert_eq!(verdict.predictions.len(), 3);

        let reports = loading.await.unwrap();
        assert!(reports.iter().all(|r| r.is_ok()));
        let verdict = engine.evaluate(&bags(false, true, false));
        assert_eq!(verdict.category, Some(ThreatCategory::Phishing));
        assert_eq!(verdict.abstentions(), 0);
    }
}
