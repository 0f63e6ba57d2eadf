//! Desired-state descriptions sent as request bodies.
//!
//! Control parameters of a reconciliation run (state, credentials,
//! endpoint, check mode) are not representable on these types, so they
//! can never leak into a request body.

use crate::error::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Default tag-matching rule type for mirrors
pub const DEFAULT_RULE_TYPE: &str = "TAG_GLOB_CSV";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl FromStr for Visibility {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            _ => Err(Error::Validation(format!(
                "visibility must be `public` or `private`, got `{}`",
                s
            ))),
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Public => f.write_str("public"),
            Visibility::Private => f.write_str("private"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoKind {
    #[default]
    Image,
    Application,
}

impl FromStr for RepoKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "image" => Ok(RepoKind::Image),
            "application" => Ok(RepoKind::Application),
            _ => Err(Error::Validation(format!(
                "repo_kind must be `image` or `application`, got `{}`",
                s
            ))),
        }
    }
}

/// Desired state of a repository
///
/// Request body for `POST /api/v1/repository`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSpec {
    pub namespace: String,
    pub repository: String,
    pub visibility: Visibility,
    pub repo_kind: RepoKind,
    pub description: String,
}

/// Desired mirror configuration of a repository
///
/// Request body for `POST`/`PUT` of `/api/v1/repository/{repository}/mirror`.
/// `is_enabled` is always forced from the desired state by the reconciler;
/// a caller-supplied value is never sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MirrorSpec {
    pub is_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_registry_config: Option<ExternalRegistryConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_registry_username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_registry_password: Option<String>,
    /// Location to mirror, e.g. `docker.io/library/alpine`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_start_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_rule: Option<RootRule>,
    /// Seconds between syncs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub robot_username: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExternalRegistryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<Proxy>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Proxy {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_proxy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_proxy: Option<String>,
}

/// Tag-matching rule deciding which tags a mirror syncs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootRule {
    pub rule_type: String,
    pub rule_value: String,
}

impl RootRule {
    /// Rule of the default `TAG_GLOB_CSV` type.
    pub fn tag_glob_csv(rule_value: &str) -> Self {
        RootRule {
            rule_type: DEFAULT_RULE_TYPE.to_string(),
            rule_value: rule_value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn repo_spec_body() {
        let spec = RepoSpec {
            namespace: "team".to_string(),
            repository: "widget".to_string(),
            visibility: Visibility::Private,
            repo_kind: RepoKind::Image,
            description: String::new(),
        };
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({
                "namespace": "team",
                "repository": "widget",
                "visibility": "private",
                "repo_kind": "image",
                "description": "",
            })
        );
    }

    #[test]
    fn mirror_spec_skips_unset_fields() {
        let spec = MirrorSpec {
            is_enabled: true,
            external_reference: Some("docker.io/library/alpine".to_string()),
            root_rule: Some(RootRule::tag_glob_csv("latest,3.*")),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&spec).unwrap(),
            json!({
                "is_enabled": true,
                "external_reference": "docker.io/library/alpine",
                "root_rule": {
                    "rule_type": "TAG_GLOB_CSV",
                    "rule_value": "latest,3.*",
                },
            })
        );
    }

    #[test]
    fn parse_enums() {
        assert_eq!("public".parse::<Visibility>().unwrap(), Visibility::Public);
        assert_eq!(
            "application".parse::<RepoKind>().unwrap(),
            RepoKind::Application
        );
        assert!("internal".parse::<Visibility>().is_err());
        assert!("chart".parse::<RepoKind>().is_err());
    }
}
