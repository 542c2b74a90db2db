use globsync::{ClusterConfig, ConfigError, KubeClient};
use std::fs;

const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: test
clusters:
- name: test-cluster
  cluster:
    server: https://example.invalid:6443
    certificate-authority-data: ZmFrZS1jYQ==
contexts:
- name: test
  context:
    cluster: test-cluster
    user: test-user
users:
- name: test-user
  user:
    token: sekret
"#;

#[test]
fn kubeconfig_resolves_server_token_and_ca() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config");
    fs::write(&path, KUBECONFIG).unwrap();

    let config = ClusterConfig::from_kubeconfig(&path).unwrap();
    assert_eq!(config.server, "https://example.invalid:6443");
    assert_eq!(config.token.as_deref(), Some("sekret"));
    assert_eq!(config.ca_data.as_deref(), Some(b"fake-ca".as_slice()));
}

#[test]
fn kubeconfig_reads_token_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let token_path = dir.path().join("token");
    fs::write(&token_path, "from-file\n").unwrap();

    let yaml = format!(
        r#"
current-context: test
clusters:
- name: test-cluster
  cluster:
    server: https://example.invalid:6443
contexts:
- name: test
  context:
    cluster: test-cluster
    user: test-user
users:
- name: test-user
  user:
    tokenFile: {}
"#,
        token_path.display()
    );
    let path = dir.path().join("config");
    fs::write(&path, yaml).unwrap();

    let config = ClusterConfig::from_kubeconfig(&path).unwrap();
    assert_eq!(config.token.as_deref(), Some("from-file"));
    assert!(config.ca_data.is_none());
}

#[test]
fn unknown_current_context_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config");
    fs::write(&path, KUBECONFIG.replace("current-context: test", "current-context: prod")).unwrap();

    let err = ClusterConfig::from_kubeconfig(&path).unwrap_err();
    assert!(matches!(err, ConfigError::MissingContext(name) if name == "prod"));
}

#[test]
fn unreadable_kubeconfig_is_an_io_error() {
    let err =
        ClusterConfig::from_kubeconfig(std::path::Path::new("/nonexistent/kubeconfig")).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "got {err:?}");
}

#[test]
fn in_cluster_requires_the_pod_environment() {
    std::env::remove_var("KUBERNETES_SERVICE_HOST");
    std::env::remove_var("KUBERNETES_SERVICE_PORT");
    let err = ClusterConfig::in_cluster().unwrap_err();
    assert!(matches!(err, ConfigError::NotInCluster(_)), "got {err:?}");
}

#[test]
fn client_builds_from_resolved_config() {
    let config = ClusterConfig {
        server: "https://example.invalid:6443/".to_string(),
        token: Some("sekret".to_string()),
        ca_data: None,
    };
    assert!(KubeClient::connect(&config).is_ok());
}
