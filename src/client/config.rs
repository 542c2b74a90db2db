use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Connection settings resolved from the pod environment or a kubeconfig.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
    /// Base URL of the API server, e.g. `https://10.0.0.1:443`.
    pub server: String,
    /// Bearer token attached to every request, when one is configured.
    pub token: Option<String>,
    /// PEM bundle for the API server's certificate authority.
    pub ca_data: Option<Vec<u8>>,
}

/// Errors raised while resolving cluster connection settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("not running in-cluster: {0}")]
    NotInCluster(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse kubeconfig {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("kubeconfig has no context named {0:?}")]
    MissingContext(String),
    #[error("kubeconfig has no cluster named {0:?}")]
    MissingCluster(String),
    #[error("kubeconfig has no user named {0:?}")]
    MissingUser(String),
    #[error("invalid certificate-authority-data: {0}")]
    InvalidCaData(base64::DecodeError),
    #[error("no kubeconfig path available and not running in-cluster")]
    NoConfig,
}

impl ClusterConfig {
    /// Resolves settings the way the process boots: in-cluster first, then
    /// the kubeconfig fallback.
    pub fn resolve(kubeconfig: Option<&Path>) -> Result<Self, ConfigError> {
        match Self::in_cluster() {
            Ok(config) => return Ok(config),
            Err(err) => debug!(error = %err, "no in-cluster configuration, using kubeconfig"),
        }
        match kubeconfig {
            Some(path) => Self::from_kubeconfig(path),
            None => Err(ConfigError::NoConfig),
        }
    }

    /// Builds settings from the service-account mount inside a pod.
    pub fn in_cluster() -> Result<Self, ConfigError> {
        let host = env::var("KUBERNETES_SERVICE_HOST")
            .map_err(|_| ConfigError::NotInCluster("KUBERNETES_SERVICE_HOST unset".into()))?;
        let port = env::var("KUBERNETES_SERVICE_PORT")
            .map_err(|_| ConfigError::NotInCluster("KUBERNETES_SERVICE_PORT unset".into()))?;
        let token = read_file(Path::new(SERVICE_ACCOUNT_DIR).join("token"))?;
        let ca_data = read_file(Path::new(SERVICE_ACCOUNT_DIR).join("ca.crt"))?;
        Ok(Self {
            server: format!("https://{host}:{port}"),
            token: Some(String::from_utf8_lossy(&token).trim().to_string()),
            ca_data: Some(ca_data),
        })
    }

    /// Builds settings from the `current-context` entry of a kubeconfig
    /// file. Bearer-token users are supported; the token may be inline or
    /// in a referenced file.
    pub fn from_kubeconfig(path: &Path) -> Result<Self, ConfigError> {
        let raw = read_file(path.to_path_buf())?;
        let file: KubeconfigFile =
            serde_yaml::from_slice(&raw).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let context = file
            .contexts
            .iter()
            .find(|entry| entry.name == file.current_context)
            .map(|entry| &entry.context)
            .ok_or_else(|| ConfigError::MissingContext(file.current_context.clone()))?;
        let cluster = file
            .clusters
            .iter()
            .find(|entry| entry.name == context.cluster)
            .map(|entry| &entry.cluster)
            .ok_or_else(|| ConfigError::MissingCluster(context.cluster.clone()))?;
        let user = file
            .users
            .iter()
            .find(|entry| entry.name == context.user)
            .map(|entry| &entry.user)
            .ok_or_else(|| ConfigError::MissingUser(context.user.clone()))?;

        let ca_data = match (&cluster.certificate_authority_data, &cluster.certificate_authority) {
            (Some(inline), _) => Some(
                STANDARD
                    .decode(inline.as_bytes())
                    .map_err(ConfigError::InvalidCaData)?,
            ),
            (None, Some(ca_path)) => Some(read_file(ca_path.clone())?),
            (None, None) => None,
        };

        let token = match (&user.token, &user.token_file) {
            (Some(token), _) => Some(token.clone()),
            (None, Some(token_path)) => {
                let raw = read_file(token_path.clone())?;
                Some(String::from_utf8_lossy(&raw).trim().to_string())
            }
            (None, None) => None,
        };

        Ok(Self {
            server: cluster.server.clone(),
            token,
            ca_data,
        })
    }
}

fn read_file(path: PathBuf) -> Result<Vec<u8>, ConfigError> {
    fs::read(&path).map_err(|source| ConfigError::Io { path, source })
}

#[derive(Debug, Deserialize)]
struct KubeconfigFile {
    #[serde(default, rename = "current-context")]
    current_context: String,
    #[serde(default)]
    clusters: Vec<NamedCluster>,
    #[serde(default)]
    contexts: Vec<NamedContext>,
    #[serde(default)]
    users: Vec<NamedUser>,
}

#[derive(Debug, Deserialize)]
struct NamedCluster {
    name: String,
    cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
struct ClusterEntry {
    server: String,
    #[serde(default, rename = "certificate-authority")]
    certificate_authority: Option<PathBuf>,
    #[serde(default, rename = "certificate-authority-data")]
    certificate_authority_data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedContext {
    name: String,
    context: ContextEntry,
}

#[derive(Debug, Deserialize)]
struct ContextEntry {
    cluster: String,
    user: String,
}

#[derive(Debug, Deserialize)]
struct NamedUser {
    name: String,
    user: UserEntry,
}

#[derive(Debug, Default, Deserialize)]
struct UserEntry {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "tokenFile")]
    token_file: Option<PathBuf>,
}
