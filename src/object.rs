use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::de::{Deserializer, Error as _};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Annotation that marks an object for cluster-wide replication.
pub const GLOBAL_ANNOTATION: &str = "MakeGlobal";

/// Label key stamped on every replicated copy.
pub const CREATED_BY_LABEL: &str = "CreatedBy";

/// Label value stamped on every replicated copy.
pub const CREATED_BY_VALUE: &str = "globsync";

/// The two object kinds the sync engine replicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ObjectKind {
    ConfigMap,
    Secret,
}

impl ObjectKind {
    /// Returns the canonical kind name.
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::ConfigMap => "ConfigMap",
            ObjectKind::Secret => "Secret",
        }
    }

    /// Returns the REST resource name for the kind.
    pub fn resource(self) -> &'static str {
        match self {
            ObjectKind::ConfigMap => "configmaps",
            ObjectKind::Secret => "secrets",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object metadata carried on the wire for every kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Fresh metadata for a copy: target namespace, the `CreatedBy` label, and
/// nothing inherited from the source.
fn copy_meta(name: &str, namespace: &str) -> ObjectMeta {
    let mut labels = BTreeMap::new();
    labels.insert(CREATED_BY_LABEL.to_string(), CREATED_BY_VALUE.to_string());
    ObjectMeta {
        name: name.to_string(),
        namespace: namespace.to_string(),
        labels,
        annotations: BTreeMap::new(),
    }
}

/// Binary payload value, base64-encoded on the wire.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ByteString(pub Vec<u8>);

impl fmt::Debug for ByteString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ByteString({} bytes)", self.0.len())
    }
}

impl From<&str> for ByteString {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl Serialize for ByteString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for ByteString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map(ByteString)
            .map_err(D::Error::custom)
    }
}

/// Capability shared by every kind the engine replicates: an identity, an
/// annotation map, a comparable data payload, and a way to mint a copy for
/// another namespace.
pub trait Replicable: Clone {
    const KIND: ObjectKind;

    fn meta(&self) -> &ObjectMeta;

    fn name(&self) -> &str {
        &self.meta().name
    }

    fn namespace(&self) -> &str {
        &self.meta().namespace
    }

    fn annotations(&self) -> &BTreeMap<String, String> {
        &self.meta().annotations
    }

    /// Value equality of the data payload only; metadata is never compared.
    fn payload_matches(&self, other: &Self) -> bool;

    /// Builds the copy written into `namespace`: same name and payload,
    /// fresh metadata carrying only the `CreatedBy` label.
    fn copy_for(&self, namespace: &str) -> Self;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigMap {
    pub metadata: ObjectMeta,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl ConfigMap {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                namespace: namespace.into(),
                ..ObjectMeta::default()
            },
            data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.annotations.insert(key.into(), value.into());
        self
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.labels.insert(key.into(), value.into());
        self
    }
}

impl Replicable for ConfigMap {
    const KIND: ObjectKind = ObjectKind::ConfigMap;

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn payload_matches(&self, other: &Self) -> bool {
        self.data == other.data
    }

    fn copy_for(&self, namespace: &str) -> Self {
        Self {
            metadata: copy_meta(self.name(), namespace),
            data: self.data.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Secret {
    pub metadata: ObjectMeta,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, ByteString>,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub secret_type: String,
}

impl Secret {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                namespace: namespace.into(),
                ..ObjectMeta::default()
            },
            data: BTreeMap::new(),
            secret_type: String::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<ByteString>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_type(mut self, secret_type: impl Into<String>) -> Self {
        self.secret_type = secret_type.into();
        self
    }

    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.annotations.insert(key.into(), value.into());
        self
    }
}

impl Replicable for Secret {
    const KIND: ObjectKind = ObjectKind::Secret;

    fn meta(&self) -> &ObjectMeta {
        &self.metadata
    }

    fn payload_matches(&self, other: &Self) -> bool {
        self.data == other.data
    }

    /// The copy keeps the source `type` field, which the server treats as
    /// immutable once set.
    fn copy_for(&self, namespace: &str) -> Self {
        Self {
            metadata: copy_meta(self.name(), namespace),
            data: self.data.clone(),
            secret_type: self.secret_type.clone(),
        }
    }
}
