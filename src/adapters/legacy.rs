//! Legacy adapter - three pre-joined files per issue
//!
//! The bundle file is an object keyed by paper file stem; cluster and
//! data-point files exist per (clustering type, version) pair, located by
//! substituting `{type}` and `{ver}` into the configured path patterns.

use crate::fetch::{join_path, JsonFetcher};
use crate::issue_config::IssueConfigEntry;
use crate::model::{ClusterData, DataPoint, Paper};

use super::{parse_bundle_json, parse_cluster_json, parse_data_points_json, AdapterError, Issue};

fn apply_pattern(pattern: &str, cluster_type: &str, ver: u32) -> String {
    pattern
        .replace("{type}", cluster_type)
        .replace("{ver}", &ver.to_string())
}

pub async fn fetch_papers(
    fetcher: &JsonFetcher,
    base: &str,
    issue: Issue,
    entry: &IssueConfigEntry,
) -> Result<Vec<Paper>, AdapterError> {
    let legacy = entry.legacy(issue.as_str())?;
    let json = fetcher.fetch_json(&join_path(base, &legacy.bundle)).await?;
    parse_bundle_json(&json)
}

pub async fn fetch_data_points(
    fetcher: &JsonFetcher,
    base: &str,
    issue: Issue,
    entry: &IssueConfigEntry,
    cluster_type: &str,
    ver: u32,
) -> Result<Vec<DataPoint>, AdapterError> {
    let legacy = entry.legacy(issue.as_str())?;
    let path = apply_pattern(&legacy.data_points_pattern, cluster_type, ver);
    let json = fetcher.fetch_json(&join_path(base, &path)).await?;
    parse_data_points_json(&json)
}

pub async fn fetch_clusters(
    fetcher: &JsonFetcher,
    base: &str,
    issue: Issue,
    entry: &IssueConfigEntry,
    cluster_type: &str,
    ver: u32,
) -> Result<Vec<ClusterData>, AdapterError> {
    let legacy = entry.legacy(issue.as_str())?;
    let path = apply_pattern(&legacy.clusters_pattern, cluster_type, ver);
    let json = fetcher.fetch_json(&join_path(base, &path)).await?;
    parse_cluster_json(&json)
}
