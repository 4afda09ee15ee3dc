//! Configuration document
//!
//! The typed aggregate stored in every configuration layer (`fleetkit.yaml`).
//! Fields are addressed externally by their encoded (camelCase) names through
//! [`Document::read_field`] and [`Document::write_field`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::core::node::{self, Node};
use crate::core::sequence::SequenceCmd;
use crate::error::FieldError;
use crate::record_node;

pub(crate) fn is_default<T: Default + PartialEq>(value: &T) -> bool {
    *value == T::default()
}

/// The full configuration aggregate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Document {
    /// Application metadata
    #[serde(skip_serializing_if = "is_default")]
    pub app: AppSettings,

    /// Build and toolchain settings
    #[serde(skip_serializing_if = "is_default")]
    pub build: BuildSettings,

    /// Publish targets by name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub publish: BTreeMap<String, PublishTarget>,

    /// Devices by name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub devices: BTreeMap<String, Device>,

    /// Named command sequences
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub sequences: BTreeMap<String, Vec<SequenceCmd>>,

    /// Regen files: project-relative source path to destination path
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub templates: BTreeMap<String, String>,
}

/// Application metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppSettings {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub lang: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub fqdn: String,
    /// Derived from `fqdn` when left empty
    #[serde(skip_serializing_if = "String::is_empty")]
    pub duid: String,
    /// Template-defined options, free-form
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
    #[serde(skip_serializing_if = "is_default")]
    pub dependencies: Dependencies,
    /// Environment passed to the application container
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Compile and runtime package dependencies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Dependencies {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub compile: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub runtime: Vec<String>,
}

/// Build settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct BuildSettings {
    /// Toolchain images by architecture alias
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub toolchains: BTreeMap<String, ToolchainSettings>,
    /// Alias used when none is given
    #[serde(skip_serializing_if = "String::is_empty")]
    pub default: String,
    #[serde(skip_serializing_if = "is_default")]
    pub cross_compile: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub docker_file_template: String,
    #[serde(skip_serializing_if = "is_default")]
    pub options: BuildOptions,
}

/// One toolchain image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ToolchainSettings {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub image: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub config_file: String,
}

/// Build options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct BuildOptions {
    #[serde(skip_serializing_if = "is_default")]
    pub skip_host_env: bool,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output_type: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// How artifacts reach a publish target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishMethod {
    Listen,
    Put,
    Copy,
}

/// Authentication scheme of an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthType {
    Basic,
    Bearer,
    Digest,
    Password,
    PublicKey,
}

/// Artifact publish target
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct PublishTarget {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub addr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthType>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub private_key_file: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<PublishMethod>,
}

/// Where a device downloads artifacts from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadSource {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub publish: String,
}

/// A target device
///
/// `addr` may hold `${...}` expressions evaluated when the device is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Device {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub addr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthType>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub private_key_file: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub token: String,
    #[serde(skip_serializing_if = "is_default")]
    pub source: DownloadSource,
}

record_node!(Document {
    "app" => app,
    "build" => build,
    "publish" => publish,
    "devices" => devices,
    "sequences" => sequences,
    "templates" => templates,
});

record_node!(AppSettings {
    "lang" => lang,
    "title" => title,
    "name" => name,
    "author" => author,
    "description" => description,
    "version" => version,
    "fqdn" => fqdn,
    "duid" => duid,
    "options" => options,
    "dependencies" => dependencies,
    "env" => env,
});

record_node!(Dependencies {
    "compile" => compile,
    "runtime" => runtime,
});

record_node!(BuildSettings {
    "toolchains" => toolchains,
    "default" => default,
    "crossCompile" => cross_compile,
    "dockerFileTemplate" => docker_file_template,
    "options" => options,
});

record_node!(ToolchainSettings {
    "image" => image,
    "configFile" => config_file,
});

record_node!(BuildOptions {
    "skipHostEnv" => skip_host_env,
    "outputType" => output_type,
    "env" => env,
});

record_node!(PublishTarget {
    "addr" => addr,
    "auth" => auth,
    "privateKeyFile" => private_key_file,
    "token" => token,
    "method" => method,
});

record_node!(DownloadSource {
    "url" => url,
    "publish" => publish,
});

record_node!(Device {
    "addr" => addr,
    "auth" => auth,
    "privateKeyFile" => private_key_file,
    "token" => token,
    "source" => source,
});

impl Document {
    /// Parse a layer file, rejecting unknown fields
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        let value: Value = serde_yaml::from_str(text)?;
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_yaml::from_value(value)
    }

    /// Serialize, omitting empty values
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Read the value at a dotted field path
    pub fn read_field(&self, path: &str) -> Result<Value, FieldError> {
        node::read(self, path)
    }

    /// Replace or append the value at a dotted field path
    pub fn write_field(&mut self, path: &str, raw: &str, append: bool) -> Result<(), FieldError> {
        node::write(self, path, raw, append)
    }

    /// Plain write that may add a missing dictionary key (`-c` overrides)
    pub fn upsert_field(&mut self, path: &str, raw: &str) -> Result<(), FieldError> {
        node::upsert(self, path, raw)
    }

    /// Completion candidates for a partial field path
    pub fn suggestions(&self, prefix: &str) -> Vec<String> {
        node::suggestions(self, prefix)
    }

    /// Canonical key/value tree, also used as rendering context
    pub fn to_canonical(&self) -> Result<Value, FieldError> {
        self.encode().map_err(|error| FieldError::Encode {
            path: String::new(),
            error,
        })
    }

    /// Replay a canonical tree (typically a layer or delta) over this document
    pub fn overlay(&mut self, tree: &Value) -> Result<(), FieldError> {
        node::overlay(self, "", tree)
    }
}
