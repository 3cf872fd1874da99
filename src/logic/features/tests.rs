//! Integration Tests for the Feature Builder
//!
//! Builds vectors from collector-shaped bags across every category layout.

#[cfg(test)]
mod integration_tests {
    use crate::logic::category::ThreatCategory;
    use crate::logic::features::{
        build, build_with_version, current_layout, FeatureError, RawFeatureBag,
    };
    use crate::logic::features::layout::UNKNOWN_LEVEL_CODE;

    fn ransomware_bag() -> RawFeatureBag {
        RawFeatureBag::new()
            .with("fileDownloadBehavior", true)
            .with("encryptionPatterns", false)
            .with("networkProtocols", true)
            .with("fileSystemActivities", false)
            .with("machine", "amd64")
            .with("fileSizeKb", 2048.0)
            .with("byteEntropy", 7.8)
            .with("suspiciousStrings", true)
            .with("hasMzHeader", true)
    }

    fn phishing_bag() -> RawFeatureBag {
        RawFeatureBag::new()
            .with("urlStructure", true)
            .with("domainReputation", false)
            .with("htmlContent", true)
            .with("sslCertificates", false)
            .with("phishingKeywords", true)
    }

    /// Same bag → bit-identical vector
    #[test]
    fn test_build_is_deterministic() {
        let bag = ransomware_bag();
        let first = build(ThreatCategory::Ransomware, &bag).unwrap();

        for _ in 0..10 {
            let again = build(ThreatCategory::Ransomware, &bag).unwrap();
            let a: Vec<u32> = first.values.iter().map(|v| v.to_bits()).collect();
            let b: Vec<u32> = again.values.iter().map(|v| v.to_bits()).collect();
            assert_eq!(a, b);
            assert_eq!(first.layout_hash, again.layout_hash);
        }
    }

    /// Values land in layout order, not bag order
    #[test]
    fn test_values_follow_layout_order() {
        let vector = build(ThreatCategory::Ransomware, &ransomware_bag()).unwrap();

        assert_eq!(vector.len(), current_layout(ThreatCategory::Ransomware).len());
        assert_eq!(vector.values, vec![1.0, 0.0, 1.0, 0.0, 1.0, 2048.0, 7.8, 1.0, 1.0]);
    }

    #[test]
    fn test_missing_field_is_schema_mismatch() {
        let bag = RawFeatureBag::new().with("urlStructure", true);
        let err = build(ThreatCategory::Phishing, &bag).unwrap_err();

        match err {
            FeatureError::SchemaMismatch { category, field, .. } => {
                assert_eq!(category, ThreatCategory::Phishing);
                assert_eq!(field, "domainReputation");
            }
            other => panic!("Expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_wrong_kind_is_schema_mismatch() {
        let bag = phishing_bag().with("sslCertificates", 1.0);
        let err = build(ThreatCategory::Phishing, &bag).unwrap_err();
        assert!(err.to_string().contains("expected flag, got number"));

        // Booleans are not numbers either
        let bag = ransomware_bag().with("fileSizeKb", true);
        assert!(build(ThreatCategory::Ransomware, &bag).is_err());
    }

    #[test]
    fn test_non_finite_numeric_rejected() {
        let bag = ransomware_bag().with("byteEntropy", f64::NAN);
        assert!(matches!(
            build(ThreatCategory::Ransomware, &bag),
            Err(FeatureError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_numeric_beyond_f32_range_rejected() {
        let bag = ransomware_bag().with("fileSizeKb", 1e300);
        match build(ThreatCategory::Ransomware, &bag) {
            Err(FeatureError::SchemaMismatch { .. }) => {}
            other => panic!("Expected SchemaMismatch, got {:?}", other),
        }

        let bag = ransomware_bag().with("fileSizeKb", f64::from(f32::MAX));
        assert!(build(ThreatCategory::Ransomware, &bag).is_ok());
    }

    #[test]
    fn test_extra_fields_are_ignored() {
        let plain = build(ThreatCategory::Phishing, &phishing_bag()).unwrap();
        let extended = build(
            ThreatCategory::Phishing,
            &phishing_bag().with("futureSignal", 3.0).with("collector", "v9"),
        )
        .unwrap();

        assert_eq!(plain, extended);
    }

    #[test]
    fn test_categorical_levels() {
        let vector = build(ThreatCategory::Ransomware, &ransomware_bag().with("machine", "ARM64")).unwrap();
        assert_eq!(vector.get_by_name("machine"), Some(3.0));

        let vector = build(ThreatCategory::Ransomware, &ransomware_bag().with("machine", "riscv")).unwrap();
        assert_eq!(vector.get_by_name("machine"), Some(UNKNOWN_LEVEL_CODE));
    }

    /// Historical layout builds from a bag that lacks newer fields
    #[test]
    fn test_build_with_historical_version() {
        let bag = RawFeatureBag::new()
            .with("fileDownloadBehavior", true)
            .with("encryptionPatterns", true)
            .with("networkProtocols", false)
            .with("fileSystemActivities", true);

        assert!(build(ThreatCategory::Ransomware, &bag).is_err());

        let vector = build_with_version(ThreatCategory::Ransomware, 1, &bag).unwrap();
        assert_eq!(vector.version, 1);
        assert_eq!(vector.values, vec![1.0, 1.0, 0.0, 1.0]);
        assert!(vector.is_compatible());
    }

    #[test]
    fn test_unknown_version() {
        let err = build_with_version(ThreatCategory::Trojan, 7, &RawFeatureBag::new()).unwrap_err();
        assert_eq!(
            err,
            FeatureError::UnknownLayoutVersion { category: ThreatCategory::Trojan, version: 7 }
        );
    }
}
