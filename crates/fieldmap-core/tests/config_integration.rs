//! Loading mapper configuration from files and the environment

use fieldmap_core::config::{ENV_DOC_ID, ENV_GROUP_POLICY};
use fieldmap_core::{Error, FieldGroupPolicy, MapperConfig, MapperConfigBuilder};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_load_each_file_format() {
    let dir = TempDir::new().unwrap();
    let files = [
        (
            "mapper.json",
            r#"{"doc_id":"d-1","namespaces":{"ns1":"urn:a"},"xml":{"declaration":true}}"#,
        ),
        (
            "mapper.yaml",
            "doc_id: d-1\nnamespaces:\n  ns1: urn:a\nxml:\n  declaration: true\n",
        ),
        (
            "mapper.toml",
            "doc_id = \"d-1\"\n\n[namespaces]\nns1 = \"urn:a\"\n\n[xml]\ndeclaration = true\n",
        ),
    ];

    for (name, content) in files {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        let config = MapperConfig::from_file(&path).unwrap();
        assert_eq!(config.doc_id.as_deref(), Some("d-1"), "{}", name);
        assert_eq!(config.namespaces.get("ns1").map(String::as_str), Some("urn:a"));
        assert!(config.xml.declaration);
        assert_eq!(config.group_policy, FieldGroupPolicy::WarnAndSkip);
    }
}

#[test]
fn test_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let config = MapperConfigBuilder::new()
        .doc_id("saved")
        .group_policy(FieldGroupPolicy::Strict)
        .namespace("ord", "urn:orders")
        .pretty_json(true)
        .build();

    for name in ["out.json", "out.yml", "nested/out.toml"] {
        let path = dir.path().join(name);
        config.save(&path).unwrap();
        assert_eq!(MapperConfig::from_file(&path).unwrap(), config, "{}", name);
    }
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let err = MapperConfig::from_file(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[test]
fn test_env_overrides() {
    // the only test in this binary that touches these variables
    std::env::set_var(ENV_GROUP_POLICY, "strict");
    std::env::set_var(ENV_DOC_ID, "env-doc");
    let config = MapperConfig::default().merge_with_env().unwrap();
    std::env::remove_var(ENV_GROUP_POLICY);
    std::env::remove_var(ENV_DOC_ID);

    assert_eq!(config.group_policy, FieldGroupPolicy::Strict);
    assert_eq!(config.doc_id.as_deref(), Some("env-doc"));
}
