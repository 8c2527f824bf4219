//! Issue manifest - per-dataset configuration loaded from
//! `json/issue-data-config.json`
//!
//! The manifest maps an issue id to the adapter kind, the selectable
//! clustering options for the UI, and the adapter-specific file layout.
//! The manifest fetch is memoized per base path through the shared
//! [`JsonFetcher`] cache, so concurrent loads share one request.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fetch::{join_path, FetchError, JsonFetcher};

/// Manifest location relative to the base path.
pub const CONFIG_PATH: &str = "json/issue-data-config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid issue config at {url}: {source}")]
    Invalid {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("issue config not found for: {0}")]
    IssueNotFound(String),
    #[error("{section} config is missing for {issue}")]
    MissingSection { issue: String, section: String },
    #[error("path is not configured for mode: {0}")]
    MissingModePath(String),
}

/// One selectable clustering-type option for the UI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterTypeOption {
    pub value: String,
    pub label: String,
}

/// File layout for the legacy three-file datasets. Patterns substitute
/// `{type}` and `{ver}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySourceConfig {
    pub bundle: String,
    pub data_points_pattern: String,
    pub clusters_pattern: String,
}

/// File layout for the normalized cache-v2 datasets. Per-mode maps are
/// keyed by the mode string (`title`/`abstract`/`grasp`/`response`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheV2SourceConfig {
    pub papers: String,
    pub features: String,
    #[serde(default)]
    pub papers_by_mode: Option<HashMap<String, String>>,
    #[serde(default)]
    pub features_by_mode: Option<HashMap<String, String>>,
    pub points_by_mode: HashMap<String, String>,
    pub index_by_mode: HashMap<String, String>,
    pub clusters_by_mode: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueConfigEntry {
    pub adapter_kind: String,
    pub type_options: Vec<ClusterTypeOption>,
    pub cluster_options: Vec<u32>,
    #[serde(default)]
    pub legacy: Option<LegacySourceConfig>,
    #[serde(default)]
    pub cache_v2: Option<CacheV2SourceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueConfigFile {
    pub issues: HashMap<String, IssueConfigEntry>,
}

/// Load the whole manifest for a base path. The underlying fetch is
/// memoized, so repeated calls share one request per session.
pub async fn load_issue_config(
    fetcher: &JsonFetcher,
    base: &str,
) -> Result<IssueConfigFile, ConfigError> {
    let url = join_path(base, CONFIG_PATH);
    let json = fetcher.fetch_json(&url).await?;
    serde_json::from_value((*json).clone()).map_err(|source| ConfigError::Invalid { url, source })
}

/// Load the manifest entry for one issue.
pub async fn load_issue_config_entry(
    fetcher: &JsonFetcher,
    base: &str,
    issue: &str,
) -> Result<IssueConfigEntry, ConfigError> {
    let config = load_issue_config(fetcher, base).await?;
    config
        .issues
        .get(issue)
        .cloned()
        .ok_or_else(|| ConfigError::IssueNotFound(issue.to_string()))
}

impl IssueConfigEntry {
    /// The legacy file layout, or an error naming the issue.
    pub fn legacy(&self, issue: &str) -> Result<&LegacySourceConfig, ConfigError> {
        self.legacy.as_ref().ok_or_else(|| ConfigError::MissingSection {
            issue: issue.to_string(),
            section: "legacy".to_string(),
        })
    }

    /// The cache-v2 file layout, or an error naming the issue.
    pub fn cache_v2(&self, issue: &str) -> Result<&CacheV2SourceConfig, ConfigError> {
        self.cache_v2.as_ref().ok_or_else(|| ConfigError::MissingSection {
            issue: issue.to_string(),
            section: "cacheV2".to_string(),
        })
    }
}

impl CacheV2SourceConfig {
    /// Required per-mode path; missing modes are a config error.
    pub fn mode_path<'a>(
        by_mode: &'a HashMap<String, String>,
        mode: &str,
    ) -> Result<&'a str, ConfigError> {
        by_mode
            .get(mode)
            .map(String::as_str)
            .ok_or_else(|| ConfigError::MissingModePath(mode.to_string()))
    }

    /// Per-mode path with a fallback to the default file.
    pub fn mode_path_or<'a>(
        by_mode: Option<&'a HashMap<String, String>>,
        mode: &str,
        default: &'a str,
    ) -> &'a str {
        by_mode
            .and_then(|m| m.get(mode))
            .map(String::as_str)
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_json() -> &'static str {
        r#"{
            "issues": {
                "ec2025": {
                    "adapterKind": "legacy",
                    "typeOptions": [
                        {"value": "abstract", "label": "Abstract"},
                        {"value": "title", "label": "Title"}
                    ],
                    "clusterOptions": [16, 32],
                    "legacy": {
                        "bundle": "json/bundle.json",
                        "dataPointsPattern": "json/umap_{type}_edctag-{ver}.json",
                        "clustersPattern": "json/umap_{type}_clusters-{ver}.json"
                    }
                },
                "ec2026si": {
                    "adapterKind": "cache-v2",
                    "typeOptions": [{"value": "grasp", "label": "Grasp"}],
                    "clusterOptions": [32],
                    "cacheV2": {
                        "papers": "json/papers.json",
                        "features": "json/features.json",
                        "pointsByMode": {"grasp": "json/points-grasp.json"},
                        "indexByMode": {"grasp": "json/index-grasp.json"},
                        "clustersByMode": {"grasp": "json/clusters-grasp.json"}
                    }
                }
            }
        }"#
    }

    async fn entry_from_manifest(issue: &str) -> Result<IssueConfigEntry, ConfigError> {
        let dir = tempfile::tempdir().unwrap();
        let json_dir = dir.path().join("json");
        std::fs::create_dir_all(&json_dir).unwrap();
        std::fs::write(json_dir.join("issue-data-config.json"), manifest_json()).unwrap();

        let fetcher = JsonFetcher::new();
        let base = dir.path().to_string_lossy().to_string();
        load_issue_config_entry(&fetcher, &base, issue).await
    }

    #[tokio::test]
    async fn loads_legacy_entry() {
        let entry = entry_from_manifest("ec2025").await.unwrap();
        assert_eq!(entry.adapter_kind, "legacy");
        assert_eq!(entry.cluster_options, vec![16, 32]);
        let legacy = entry.legacy("ec2025").unwrap();
        assert_eq!(legacy.bundle, "json/bundle.json");
        assert!(entry.cache_v2("ec2025").is_err());
    }

    #[tokio::test]
    async fn loads_cache_v2_entry() {
        let entry = entry_from_manifest("ec2026si").await.unwrap();
        let cache = entry.cache_v2("ec2026si").unwrap();
        assert_eq!(
            CacheV2SourceConfig::mode_path(&cache.points_by_mode, "grasp").unwrap(),
            "json/points-grasp.json"
        );
        assert!(matches!(
            CacheV2SourceConfig::mode_path(&cache.points_by_mode, "title"),
            Err(ConfigError::MissingModePath(_))
        ));
        assert_eq!(
            CacheV2SourceConfig::mode_path_or(cache.papers_by_mode.as_ref(), "grasp", &cache.papers),
            "json/papers.json"
        );
    }

    #[tokio::test]
    async fn unknown_issue_is_an_error() {
        let err = entry_from_manifest("nope").await;
        assert!(matches!(err, Err(ConfigError::IssueNotFound(_))));
    }
}
