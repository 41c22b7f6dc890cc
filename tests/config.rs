use assert_matches::assert_matches;

use pokedex_viewer::config::{
    Config, ConfigLoader, DEFAULT_BASE_URL, DEFAULT_CONCURRENCY, DEFAULT_ITEM_COUNT,
};
use pokedex_viewer::error::DexError;

#[test]
fn empty_config_uses_defaults() {
    let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
    assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
    assert_eq!(resolved.item_count, DEFAULT_ITEM_COUNT);
    assert_eq!(resolved.concurrency, DEFAULT_CONCURRENCY);
    assert_eq!(resolved.preferences_path, None);
}

#[test]
fn config_file_is_parsed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pokedex.json");
    std::fs::write(
        &path,
        r#"{
            "base_url": "http://localhost:8080/api/v2",
            "item_count": 151,
            "concurrency": 4,
            "preferences_path": "/tmp/pokedex/prefs.json"
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.base_url, "http://localhost:8080/api/v2/");
    assert_eq!(resolved.item_count, 151);
    assert_eq!(resolved.concurrency, 4);
    assert_eq!(
        resolved.preferences_path.as_deref().map(|p| p.as_str()),
        Some("/tmp/pokedex/prefs.json")
    );
}

#[test]
fn explicit_missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.json");
    assert_matches!(
        ConfigLoader::resolve(path.to_str()),
        Err(DexError::ConfigRead(_))
    );
}

#[test]
fn malformed_json_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pokedex.json");
    std::fs::write(&path, "{\"item_count\": }").unwrap();
    assert_matches!(
        ConfigLoader::resolve(path.to_str()),
        Err(DexError::ConfigParse(_))
    );
}

#[test]
fn invalid_values_are_rejected() {
    let zero_count = Config {
        item_count: Some(0),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(zero_count),
        Err(DexError::ConfigValue(_))
    );

    let bad_url = Config {
        base_url: Some("ftp://pokeapi.co".to_string()),
        ..Config::default()
    };
    assert_matches!(
        ConfigLoader::resolve_config(bad_url),
        Err(DexError::ConfigValue(_))
    );
}
