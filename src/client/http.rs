use crate::access::AccessReview;
use crate::client::config::ClusterConfig;
use crate::object::{ConfigMap, ObjectKind, ObjectMeta, Replicable, Secret};
use crate::store::{KindStore, ObjectStore, StoreError};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

const ACCESS_REVIEW_PATH: &str = "/apis/authorization.k8s.io/v1/selfsubjectaccessreviews";

/// Blocking HTTP adapter implementing the object-store port against the
/// cluster's REST API.
#[derive(Debug, Clone)]
pub struct KubeClient {
    http: Client,
    base: String,
    token: Option<String>,
}

impl KubeClient {
    /// Builds the HTTP client for the resolved cluster settings.
    pub fn connect(config: &ClusterConfig) -> Result<Self, StoreError> {
        let mut builder = Client::builder();
        if let Some(ca) = &config.ca_data {
            let cert = reqwest::Certificate::from_pem(ca).map_err(|err| {
                StoreError::Transport(format!("invalid cluster CA bundle: {err}"))
            })?;
            builder = builder.add_root_certificate(cert);
        }
        let http = builder
            .build()
            .map_err(|err| StoreError::Transport(format!("http client build failed: {err}")))?;
        Ok(Self {
            http,
            base: config.server.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    fn collection_url(&self, kind: ObjectKind, namespace: &str) -> String {
        self.url(&format!(
            "/api/v1/namespaces/{namespace}/{}",
            kind.resource()
        ))
    }

    fn object_url(&self, kind: ObjectKind, namespace: &str, name: &str) -> String {
        self.url(&format!(
            "/api/v1/namespaces/{namespace}/{}/{name}",
            kind.resource()
        ))
    }

    fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        let builder = match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        };
        builder
            .send()
            .map_err(|err| StoreError::Transport(err.to_string()))
    }

    /// Maps failure statuses for operations addressing a single object.
    fn check_object(
        &self,
        response: Response,
        kind: ObjectKind,
        namespace: &str,
        name: &str,
    ) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = status_message(response);
        Err(match status {
            StatusCode::NOT_FOUND => StoreError::NotFound {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            StatusCode::CONFLICT => StoreError::Conflict {
                kind,
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            StatusCode::FORBIDDEN => StoreError::Forbidden { message },
            _ => StoreError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    /// Maps failure statuses for collection-level calls.
    fn check_api(&self, response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = status_message(response);
        Err(match status {
            StatusCode::FORBIDDEN => StoreError::Forbidden { message },
            _ => StoreError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    fn list_kind<T>(&self, namespace: &str) -> Result<Vec<T>, StoreError>
    where
        T: Replicable + DeserializeOwned,
    {
        debug!(kind = %T::KIND, namespace, "listing objects");
        let response = self.send(self.http.get(self.collection_url(T::KIND, namespace)))?;
        let response = self.check_api(response)?;
        let list: WireList<T> = decode(response)?;
        Ok(list.items)
    }

    fn get_kind<T>(&self, namespace: &str, name: &str) -> Result<T, StoreError>
    where
        T: Replicable + DeserializeOwned,
    {
        debug!(kind = %T::KIND, namespace, name, "fetching object");
        let response = self.send(self.http.get(self.object_url(T::KIND, namespace, name)))?;
        let response = self.check_object(response, T::KIND, namespace, name)?;
        decode(response)
    }

    fn create_kind<T>(&self, namespace: &str, object: &T) -> Result<(), StoreError>
    where
        T: Replicable + Serialize,
    {
        debug!(kind = %T::KIND, namespace, name = object.name(), "creating object");
        let response = self.send(
            self.http
                .post(self.collection_url(T::KIND, namespace))
                .json(object),
        )?;
        self.check_object(response, T::KIND, namespace, object.name())?;
        Ok(())
    }

    fn update_kind<T>(&self, namespace: &str, object: &T) -> Result<(), StoreError>
    where
        T: Replicable + Serialize,
    {
        debug!(kind = %T::KIND, namespace, name = object.name(), "updating object");
        let response = self.send(
            self.http
                .put(self.object_url(T::KIND, namespace, object.name()))
                .json(object),
        )?;
        self.check_object(response, T::KIND, namespace, object.name())?;
        Ok(())
    }

    fn delete_kind<T: Replicable>(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        debug!(kind = %T::KIND, namespace, name, "deleting object");
        let response = self.send(self.http.delete(self.object_url(T::KIND, namespace, name)))?;
        self.check_object(response, T::KIND, namespace, name)?;
        Ok(())
    }
}

impl KindStore<ConfigMap> for KubeClient {
    fn list(&self, namespace: &str) -> Result<Vec<ConfigMap>, StoreError> {
        self.list_kind(namespace)
    }

    fn get(&self, namespace: &str, name: &str) -> Result<ConfigMap, StoreError> {
        self.get_kind(namespace, name)
    }

    fn create(&self, namespace: &str, object: &ConfigMap) -> Result<(), StoreError> {
        self.create_kind(namespace, object)
    }

    fn update(&self, namespace: &str, object: &ConfigMap) -> Result<(), StoreError> {
        self.update_kind(namespace, object)
    }

    fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.delete_kind::<ConfigMap>(namespace, name)
    }
}

impl KindStore<Secret> for KubeClient {
    fn list(&self, namespace: &str) -> Result<Vec<Secret>, StoreError> {
        self.list_kind(namespace)
    }

    fn get(&self, namespace: &str, name: &str) -> Result<Secret, StoreError> {
        self.get_kind(namespace, name)
    }

    fn create(&self, namespace: &str, object: &Secret) -> Result<(), StoreError> {
        self.create_kind(namespace, object)
    }

    fn update(&self, namespace: &str, object: &Secret) -> Result<(), StoreError> {
        self.update_kind(namespace, object)
    }

    fn delete(&self, namespace: &str, name: &str) -> Result<(), StoreError> {
        self.delete_kind::<Secret>(namespace, name)
    }
}

impl ObjectStore for KubeClient {
    fn list_namespaces(&self) -> Result<Vec<String>, StoreError> {
        debug!("listing namespaces");
        let response = self.send(self.http.get(self.url("/api/v1/namespaces")))?;
        let response = self.check_api(response)?;
        let list: WireList<WireNamespace> = decode(response)?;
        Ok(list
            .items
            .into_iter()
            .map(|namespace| namespace.metadata.name)
            .collect())
    }
}

impl AccessReview for KubeClient {
    fn can_perform(&self, verb: &str, resource: &str) -> Result<bool, StoreError> {
        debug!(verb, resource, "posting self subject access review");
        let body = WireAccessReview::new(verb, resource);
        let response = self.send(self.http.post(self.url(ACCESS_REVIEW_PATH)).json(&body))?;
        let response = self.check_api(response)?;
        let review: WireAccessReviewResult = decode(response)?;
        Ok(review.status.map(|status| status.allowed).unwrap_or(false))
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
    response
        .json()
        .map_err(|err| StoreError::Transport(format!("response decode failed: {err}")))
}

fn status_message(response: Response) -> String {
    let raw = response.text().unwrap_or_default();
    match serde_json::from_str::<WireStatus>(&raw) {
        Ok(WireStatus {
            message: Some(message),
        }) => message,
        _ => raw.chars().take(200).collect(),
    }
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct WireList<T> {
    #[serde(default)]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct WireNamespace {
    #[serde(default)]
    metadata: ObjectMeta,
}

#[derive(Debug, Deserialize)]
struct WireStatus {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireAccessReview {
    api_version: &'static str,
    kind: &'static str,
    spec: WireAccessReviewSpec,
}

impl WireAccessReview {
    fn new(verb: &str, resource: &str) -> Self {
        Self {
            api_version: "authorization.k8s.io/v1",
            kind: "SelfSubjectAccessReview",
            spec: WireAccessReviewSpec {
                resource_attributes: WireResourceAttributes {
                    verb: verb.to_string(),
                    resource: resource.to_string(),
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireAccessReviewSpec {
    resource_attributes: WireResourceAttributes,
}

#[derive(Debug, Serialize)]
struct WireResourceAttributes {
    verb: String,
    resource: String,
}

#[derive(Debug, Deserialize)]
struct WireAccessReviewResult {
    #[serde(default)]
    status: Option<WireReviewStatus>,
}

#[derive(Debug, Deserialize)]
struct WireReviewStatus {
    #[serde(default)]
    allowed: bool,
}
