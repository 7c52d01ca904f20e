//! Configuration loading tests
//!
//! Exercise YAML parsing, environment variable expansion, defaults and
//! validation against real files.

use media_upload_gateway::config::Config;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_load_minimal_config() {
    let file = write_config(
        r#"
server:
  address: "127.0.0.1:8080"
provider:
  cloud_name: "demo"
  api_key: "key"
  api_secret: "secret"
"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.server.address, "127.0.0.1:8080");
    assert_eq!(config.provider.cloud_name, "demo");

    // Defaults
    assert_eq!(config.upload.image_folder, "test_upload");
    assert_eq!(config.upload.video_folder, "test_upload_video");
    assert_eq!(config.server.max_upload_bytes, 104857600);
    assert!(config.metrics.enabled);
    assert!(config.provider.endpoint.is_none());
}

#[test]
fn test_load_expands_env_vars() {
    std::env::set_var("GATEWAY_CONFIG_TEST_SECRET", "expanded-secret");

    let file = write_config(
        r#"
server:
  address: "127.0.0.1:8080"
provider:
  cloud_name: "demo"
  api_key: "key"
  api_secret: "${GATEWAY_CONFIG_TEST_SECRET}"
"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.provider.api_secret, "expanded-secret");

    std::env::remove_var("GATEWAY_CONFIG_TEST_SECRET");
}

#[test]
fn test_load_env_var_default_syntax() {
    let file = write_config(
        r#"
server:
  address: "127.0.0.1:8080"
provider:
  cloud_name: "${GATEWAY_CONFIG_TEST_UNSET:-fallback-cloud}"
  api_key: "key"
  api_secret: "secret"
"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.provider.cloud_name, "fallback-cloud");
}

#[test]
fn test_load_custom_folders_and_limits() {
    let file = write_config(
        r#"
server:
  address: "0.0.0.0:9000"
  max_upload_bytes: 1048576
provider:
  cloud_name: "demo"
  api_key: "key"
  api_secret: "secret"
  endpoint: "http://localhost:9999"
upload:
  image_folder: "photos"
  video_folder: "clips"
metrics:
  enabled: false
"#,
    );

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.server.max_upload_bytes, 1048576);
    assert_eq!(config.upload.image_folder, "photos");
    assert_eq!(config.upload.video_folder, "clips");
    assert_eq!(
        config.provider.endpoint.as_deref(),
        Some("http://localhost:9999")
    );
    assert!(!config.metrics.enabled);
}

#[test]
fn test_load_rejects_missing_credentials() {
    let file = write_config(
        r#"
server:
  address: "127.0.0.1:8080"
provider:
  cloud_name: "demo"
  api_key: ""
  api_secret: "secret"
"#,
    );

    assert!(Config::load(file.path()).is_err());
}

#[test]
fn test_load_rejects_bad_endpoint_scheme() {
    let file = write_config(
        r#"
server:
  address: "127.0.0.1:8080"
provider:
  cloud_name: "demo"
  api_key: "key"
  api_secret: "secret"
  endpoint: "ftp://example.com"
"#,
    );

    assert!(Config::load(file.path()).is_err());
}

#[test]
fn test_load_missing_file() {
    assert!(Config::load("/nonexistent/config.yaml").is_err());
}

#[test]
fn test_load_malformed_yaml() {
    let file = write_config("server: [not, a, mapping");
    assert!(Config::load(file.path()).is_err());
}
