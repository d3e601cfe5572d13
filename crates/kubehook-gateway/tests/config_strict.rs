#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use kubehook_gateway::config;

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
gateway:
  listen: "0.0.0.0:8000"
  review_pth: "/audit" # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_CONFIG");
}

#[test]
fn unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn review_path_may_not_shadow_ops_routes() {
    let bad = r#"
version: 1
gateway:
  review_path: "/metrics"
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_CONFIG");
}

#[test]
fn body_limit_out_of_range() {
    let bad = r#"
version: 1
gateway:
  max_body_bytes: 16
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.client_code().as_str(), "BAD_CONFIG");
}

#[test]
fn listen_must_be_socket_addr() {
    let bad = r#"
version: 1
gateway:
  listen: "localhost"
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.gateway.review_path, "/audit");
    assert_eq!(cfg.gateway.listen, "127.0.0.1:8000");
    assert_eq!(cfg.gateway.max_body_bytes, 4 * 1024 * 1024);
    assert_eq!(cfg.gateway.service_name, "webhookreceiver");
}

#[test]
fn sample_config_file_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../kubehook.yaml");
    let cfg = config::load_from_file(path).expect("sample config must load");
    assert!(cfg.gateway.listen_addr().is_ok());
}
