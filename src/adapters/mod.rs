//! Issue data adapters - one module per upstream file layout
//!
//! Each issue (paper corpus) declares an adapter kind in the manifest;
//! the registry here resolves the kind to an adapter, which knows how to
//! locate and parse that layout into the canonical model:
//! - legacy: three pre-joined files (bundle / clusters / data points)
//! - cache-v2: normalized papers/features/points/index/clusters files,
//!   joined at read time

pub mod cache_v2;
pub mod legacy;

use serde_json::Value;
use thiserror::Error;

use crate::fetch::{FetchError, JsonFetcher};
use crate::issue_config::{load_issue_config_entry, ConfigError, IssueConfigEntry};
use crate::model::{ClusterData, DataPoint, Paper};

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid {context}")]
    Schema { context: String },
}

/// A selectable paper corpus. Unrecognized ids fall back to the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Issue {
    Ec2025,
    Ec2026Si,
}

impl Issue {
    pub const ALL: [Issue; 2] = [Issue::Ec2025, Issue::Ec2026Si];

    pub fn as_str(&self) -> &'static str {
        match self {
            Issue::Ec2025 => "ec2025",
            Issue::Ec2026Si => "ec2026si",
        }
    }

    /// Resolve an issue id, defaulting to ec2025 for unknown values.
    pub fn resolve(id: &str) -> Issue {
        match id {
            "ec2026si" => Issue::Ec2026Si,
            _ => Issue::Ec2025,
        }
    }
}

impl std::fmt::Display for Issue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The clustering-type selector value doubles as the mode key used to
/// pick per-mode file paths out of the cache-v2 config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Title,
    Abstract,
    Grasp,
    Response,
}

impl Mode {
    /// Unrecognized clustering types map to `title`.
    pub fn from_cluster_type(cluster_type: &str) -> Mode {
        match cluster_type {
            "abstract" => Mode::Abstract,
            "grasp" => Mode::Grasp,
            "response" => Mode::Response,
            _ => Mode::Title,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Title => "title",
            Mode::Abstract => "abstract",
            Mode::Grasp => "grasp",
            Mode::Response => "response",
        }
    }
}

/// Adapter selected by the manifest's `adapterKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueAdapter {
    Legacy,
    CacheV2,
}

impl IssueAdapter {
    /// Registry keyed by the config-declared adapter kind.
    pub fn for_kind(kind: &str) -> Option<IssueAdapter> {
        match kind {
            "legacy" => Some(IssueAdapter::Legacy),
            "cache-v2" => Some(IssueAdapter::CacheV2),
            _ => None,
        }
    }

    /// Built-in fallback when the manifest names an unknown kind.
    pub fn fallback_for_issue(issue: Issue) -> IssueAdapter {
        match issue {
            Issue::Ec2025 => IssueAdapter::Legacy,
            Issue::Ec2026Si => IssueAdapter::CacheV2,
        }
    }

    pub async fn fetch_papers(
        &self,
        fetcher: &JsonFetcher,
        base: &str,
        issue: Issue,
    ) -> Result<Vec<Paper>, AdapterError> {
        let entry = load_entry(fetcher, base, issue).await?;
        match self {
            IssueAdapter::Legacy => legacy::fetch_papers(fetcher, base, issue, &entry).await,
            IssueAdapter::CacheV2 => cache_v2::fetch_papers(fetcher, base, issue, &entry).await,
        }
    }

    pub async fn fetch_data_points(
        &self,
        fetcher: &JsonFetcher,
        base: &str,
        issue: Issue,
        cluster_type: &str,
        ver: u32,
    ) -> Result<Vec<DataPoint>, AdapterError> {
        let entry = load_entry(fetcher, base, issue).await?;
        match self {
            IssueAdapter::Legacy => {
                legacy::fetch_data_points(fetcher, base, issue, &entry, cluster_type, ver).await
            }
            IssueAdapter::CacheV2 => {
                cache_v2::fetch_data_points(fetcher, base, issue, &entry, cluster_type).await
            }
        }
    }

    pub async fn fetch_clusters(
        &self,
        fetcher: &JsonFetcher,
        base: &str,
        issue: Issue,
        cluster_type: &str,
        ver: u32,
    ) -> Result<Vec<ClusterData>, AdapterError> {
        let entry = load_entry(fetcher, base, issue).await?;
        match self {
            IssueAdapter::Legacy => {
                legacy::fetch_clusters(fetcher, base, issue, &entry, cluster_type, ver).await
            }
            IssueAdapter::CacheV2 => {
                cache_v2::fetch_clusters(fetcher, base, issue, &entry, cluster_type).await
            }
        }
    }
}

async fn load_entry(
    fetcher: &JsonFetcher,
    base: &str,
    issue: Issue,
) -> Result<IssueConfigEntry, AdapterError> {
    Ok(load_issue_config_entry(fetcher, base, issue.as_str()).await?)
}

/// Resolve the adapter for an issue: manifest kind first, built-in
/// fallback when the kind is unknown.
pub async fn resolve_adapter(
    fetcher: &JsonFetcher,
    base: &str,
    issue: Issue,
) -> Result<IssueAdapter, AdapterError> {
    let entry = load_entry(fetcher, base, issue).await?;
    Ok(IssueAdapter::for_kind(&entry.adapter_kind)
        .unwrap_or_else(|| IssueAdapter::fallback_for_issue(issue)))
}

/// Parse a legacy bundle object keyed by file stem, re-attaching the key
/// as `file_stem`. Any malformed record aborts the parse.
pub fn parse_bundle_json(json: &Value) -> Result<Vec<Paper>, AdapterError> {
    let object = json.as_object().ok_or_else(|| AdapterError::Schema {
        context: "bundle JSON format: expected an object keyed by file stem".to_string(),
    })?;

    let mut papers = Vec::with_capacity(object.len());
    for (key, value) in object {
        let mut paper: Paper =
            serde_json::from_value(value.clone()).map_err(|e| AdapterError::Schema {
                context: format!("paper data format at key: {key} ({e})"),
            })?;
        paper.file_stem = key.clone();
        papers.push(paper);
    }
    Ok(papers)
}

/// Parse a legacy cluster file: either a flat array or an object keyed by
/// cluster id.
pub fn parse_cluster_json(json: &Value) -> Result<Vec<ClusterData>, AdapterError> {
    if let Some(array) = json.as_array() {
        let mut clusters = Vec::with_capacity(array.len());
        for (index, value) in array.iter().enumerate() {
            let cluster: ClusterData =
                serde_json::from_value(value.clone()).map_err(|e| AdapterError::Schema {
                    context: format!("cluster data format at index: {index} ({e})"),
                })?;
            clusters.push(cluster);
        }
        return Ok(clusters);
    }

    let object = json.as_object().ok_or_else(|| AdapterError::Schema {
        context: "cluster JSON format: expected an array or object".to_string(),
    })?;
    let mut clusters = Vec::with_capacity(object.len());
    for (key, value) in object {
        let cluster: ClusterData =
            serde_json::from_value(value.clone()).map_err(|e| AdapterError::Schema {
                context: format!("cluster data format at key: {key} ({e})"),
            })?;
        clusters.push(cluster);
    }
    Ok(clusters)
}

/// Parse a legacy data-points file: a flat array of `DataPoint`.
pub fn parse_data_points_json(json: &Value) -> Result<Vec<DataPoint>, AdapterError> {
    let array = json.as_array().ok_or_else(|| AdapterError::Schema {
        context: "data points JSON format: expected an array".to_string(),
    })?;
    let mut points = Vec::with_capacity(array.len());
    for (index, value) in array.iter().enumerate() {
        let point: DataPoint =
            serde_json::from_value(value.clone()).map_err(|e| AdapterError::Schema {
                context: format!("data point format at index: {index} ({e})"),
            })?;
        points.push(point);
    }
    Ok(points)
}
