use gantry::bridge::introspect::IntrospectAccess;
use gantry::{Bridge, BridgeConfig};
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn config_round_trips_through_a_json_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("gantry.json");

    let config = BridgeConfig {
        max_depth: 4,
        max_collection_size: 32,
        max_objects: 256,
        debug: true,
    };
    config.save(&path).unwrap();

    let loaded = BridgeConfig::load(&path).unwrap();
    assert_eq!(loaded.max_depth, 4);
    assert_eq!(loaded.max_collection_size, 32);
    assert_eq!(loaded.max_objects, 256);
    assert!(loaded.debug);
}

#[test]
fn loading_a_missing_file_is_a_config_error() {
    let temp = TempDir::new().unwrap();
    let err = BridgeConfig::load(&temp.path().join("absent.json")).unwrap_err();
    assert!(err.to_string().contains("Configuration error"));
}

#[test]
fn bridges_construct_from_a_config_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("gantry.json");

    let config = BridgeConfig {
        max_depth: 7,
        ..BridgeConfig::default()
    };
    config.save(&path).unwrap();

    let access = Arc::new(IntrospectAccess::new(config));
    let bridge = Bridge::from_config_file(&path, access).unwrap();
    assert_eq!(bridge.config().max_depth, 7);
}

#[test]
fn default_limits_match_the_serializer_defaults() {
    let config = BridgeConfig::default();
    assert_eq!(config.max_depth, 16);
    assert_eq!(config.max_collection_size, 1000);
    assert_eq!(config.max_objects, 10000);
    assert!(!config.debug);
}
