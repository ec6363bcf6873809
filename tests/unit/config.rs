use super::*;

#[test]
fn defaults_match_card_geometry() {
    let cfg = ExportConfig::default();
    assert_eq!(cfg.pixel_size(), (2800, 1400));
    assert_eq!(cfg.image_timeout(), Duration::from_secs(3));
    assert_eq!(cfg.page_width_mm, 297.0);
    assert_eq!(cfg.page_height_mm, 148.5);
    cfg.validate().unwrap();
    FireworksConfig::default().validate().unwrap();
}

#[test]
fn empty_json_uses_defaults() {
    let cfg: AppConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(cfg, AppConfig::default());

    let cfg: AppConfig =
        serde_json::from_str(r#"{"fireworks": {"max_projectiles": 3}}"#).unwrap();
    assert_eq!(cfg.fireworks.max_projectiles, 3);
    assert_eq!(cfg.fireworks.burst_min, 50);
}

#[test]
fn unknown_fields_are_rejected() {
    assert!(serde_json::from_str::<AppConfig>(r#"{"export": {"dpi": 3}}"#).is_err());
}

#[test]
fn invalid_values_fail_validation() {
    let cfg = ExportConfig {
        pixel_density: 0,
        ..ExportConfig::default()
    };
    assert!(cfg.validate().is_err());

    let cfg = ExportConfig {
        width: 40_000,
        ..ExportConfig::default()
    };
    assert!(cfg.validate().is_err());

    let fw = FireworksConfig {
        burst_min: 100,
        burst_max: 50,
        ..FireworksConfig::default()
    };
    assert!(fw.validate().is_err());
}

#[test]
fn projectile_cap_cannot_exceed_five() {
    let fw = FireworksConfig {
        max_projectiles: MAX_ACTIVE_PROJECTILES + 1,
        ..FireworksConfig::default()
    };
    let err = fw.validate().unwrap_err();
    assert!(err.to_string().contains("max_projectiles"));

    let fw = FireworksConfig {
        max_projectiles: 2,
        ..FireworksConfig::default()
    };
    fw.validate().unwrap();

    let parsed: AppConfig =
        serde_json::from_str(r#"{"fireworks": {"max_projectiles": 9}}"#).unwrap();
    assert!(parsed.fireworks.validate().is_err());
}

#[test]
fn config_file_round_trip() {
    let dir = std::env::temp_dir().join(format!("birthday-card-config-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("card.json");
    std::fs::write(&path, r#"{"export": {"image_timeout_ms": 250}}"#).unwrap();

    let cfg = AppConfig::from_json_file(&path).unwrap();
    assert_eq!(cfg.export.image_timeout_ms, 250);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn run_length_rejects_overflow() {
    let fw = FireworksConfig::default();
    assert_eq!(fw.run_length(10).unwrap(), Duration::from_millis(160));

    let slow = FireworksConfig {
        frame_interval_ms: u64::MAX,
        ..FireworksConfig::default()
    };
    assert!(matches!(slow.run_length(2), Err(CardError::Validation(_))));
    assert!(fw.run_length(u64::from(u32::MAX) + 1).is_err());
}
