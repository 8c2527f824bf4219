//! Landscape store - session-scoped load API over the adapters
//!
//! Owns the fetcher (and with it the per-URL cache and HTTP client) for
//! the lifetime of one session; constructed once and shared by reference.
//! Loads resolve the adapter through the manifest on every call, so an
//! issue can switch layouts without touching callers.

use std::collections::HashMap;

use crate::adapters::{resolve_adapter, AdapterError, Issue};
use crate::fetch::JsonFetcher;
use crate::issue_config::{
    load_issue_config, load_issue_config_entry, IssueConfigEntry, IssueConfigFile,
};
use crate::model::{cluster_type, ClusterData, DataPoint, Paper};
use crate::view::{
    abstract_cluster_mapping, cluster_overlays, point_cloud, ClusterOverlay, PointCloudPoint,
};

/// Version of the abstract clustering used for the filestem-to-cluster
/// coloring map.
const ABSTRACT_MAPPING_VER: u32 = 32;

/// Monotonic counter for in-flight loads. Each request takes a fresh
/// generation; a completed load is applied only while its generation is
/// still the newest one issued, so a superseded load's late response is
/// discarded instead of overwriting newer state.
#[derive(Debug, Default)]
pub struct LoadTracker {
    current: u64,
}

impl LoadTracker {
    /// Start a new load and return its generation. Any generation issued
    /// earlier becomes stale.
    pub fn begin(&mut self) -> u64 {
        self.current += 1;
        self.current
    }

    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.current
    }
}

pub struct LandscapeStore {
    fetcher: JsonFetcher,
    base: String,
}

impl LandscapeStore {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            fetcher: JsonFetcher::new(),
            base: base.into(),
        }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// The full manifest, for listing available issues.
    pub async fn issue_config(&self) -> Result<IssueConfigFile, AdapterError> {
        Ok(load_issue_config(&self.fetcher, &self.base).await?)
    }

    pub async fn issue_entry(&self, issue: Issue) -> Result<IssueConfigEntry, AdapterError> {
        Ok(load_issue_config_entry(&self.fetcher, &self.base, issue.as_str()).await?)
    }

    pub async fn fetch_papers(&self, issue: Issue) -> Result<Vec<Paper>, AdapterError> {
        let adapter = resolve_adapter(&self.fetcher, &self.base, issue).await?;
        adapter.fetch_papers(&self.fetcher, &self.base, issue).await
    }

    pub async fn fetch_data_points(
        &self,
        issue: Issue,
        cluster_type: &str,
        ver: u32,
    ) -> Result<Vec<DataPoint>, AdapterError> {
        let adapter = resolve_adapter(&self.fetcher, &self.base, issue).await?;
        adapter
            .fetch_data_points(&self.fetcher, &self.base, issue, cluster_type, ver)
            .await
    }

    pub async fn fetch_clusters(
        &self,
        issue: Issue,
        cluster_type: &str,
        ver: u32,
    ) -> Result<Vec<ClusterData>, AdapterError> {
        let adapter = resolve_adapter(&self.fetcher, &self.base, issue).await?;
        adapter
            .fetch_clusters(&self.fetcher, &self.base, issue, cluster_type, ver)
            .await
    }

    /// Normalized point cloud for one (issue, clustering type, version).
    pub async fn point_cloud(
        &self,
        issue: Issue,
        cluster_type: &str,
        ver: u32,
    ) -> Result<Vec<PointCloudPoint>, AdapterError> {
        let points = self.fetch_data_points(issue, cluster_type, ver).await?;
        tracing::info!(
            issue = %issue,
            cluster_type,
            ver,
            points = points.len(),
            "point cloud loaded"
        );
        Ok(point_cloud(&points))
    }

    pub async fn cluster_overlays(
        &self,
        issue: Issue,
        cluster_type: &str,
        ver: u32,
    ) -> Result<Vec<ClusterOverlay>, AdapterError> {
        let clusters = self.fetch_clusters(issue, cluster_type, ver).await?;
        Ok(cluster_overlays(&clusters))
    }

    /// Filestem-to-cluster-name map from the abstract clustering, used to
    /// color points.
    pub async fn abstract_cluster_mapping(
        &self,
        issue: Issue,
    ) -> Result<HashMap<String, String>, AdapterError> {
        let clusters = self
            .fetch_clusters(issue, cluster_type::ABSTRACT, ABSTRACT_MAPPING_VER)
            .await?;
        Ok(abstract_cluster_mapping(&clusters))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Minimal legacy dataset on disk: manifest + three data files.
    fn write_legacy_dataset(dir: &std::path::Path) {
        let json_dir = dir.join("json");
        std::fs::create_dir_all(&json_dir).unwrap();
        std::fs::write(
            json_dir.join("issue-data-config.json"),
            serde_json::json!({
                "issues": {
                    "ec2025": {
                        "adapterKind": "legacy",
                        "typeOptions": [{"value": "abstract", "label": "Abstract"}],
                        "clusterOptions": [32],
                        "legacy": {
                            "bundle": "json/bundle.json",
                            "dataPointsPattern": "json/umap_{type}_edctag-{ver}.json",
                            "clustersPattern": "json/umap_{type}_clusters-{ver}.json"
                        }
                    }
                }
            })
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            json_dir.join("bundle.json"),
            serde_json::json!({
                "paper1": {
                    "design-tags": [],
                    "metadata": {
                        "title": "Paper One", "authors": [], "identifier": "1",
                        "publish_date": "2024-01-01", "conference": "EC", "abstract": ""
                    }
                }
            })
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            json_dir.join("umap_abstract_edctag-32.json"),
            serde_json::json!([{
                "filestem": "paper1", "tag_idx": 2,
                "paper_title": "Paper One", "paper_id": "1", "paper_abstract": "",
                "paper_publish_date": "2024-01-01", "edc_title": "t",
                "edc_context": "", "edc_effect": "", "edc_type": "cognition",
                "x": 0.0, "y": 0.0
            }])
            .to_string(),
        )
        .unwrap();
        std::fs::write(
            json_dir.join("umap_abstract_clusters-32.json"),
            serde_json::json!([{
                "name": "joy",
                "members": [{"filestem": "paper1", "tag_idx": 2}],
                "x_min": -1.0, "x_max": 1.0, "y_min": -1.0, "y_max": 1.0
            }])
            .to_string(),
        )
        .unwrap();
    }

    #[tokio::test]
    async fn loads_point_cloud_overlays_and_mapping() {
        let dir = tempfile::tempdir().unwrap();
        write_legacy_dataset(dir.path());
        let store = LandscapeStore::new(dir.path().to_string_lossy().to_string());

        let points = store
            .point_cloud(Issue::Ec2025, cluster_type::ABSTRACT, 32)
            .await
            .unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].point_id, "paper1::2");

        let overlays = store
            .cluster_overlays(Issue::Ec2025, cluster_type::ABSTRACT, 32)
            .await
            .unwrap();
        assert_eq!(overlays.len(), 1);
        assert_eq!(overlays[0].name, "joy");

        let mapping = store.abstract_cluster_mapping(Issue::Ec2025).await.unwrap();
        assert_eq!(mapping.get("paper1").map(String::as_str), Some("joy"));
    }

    #[test]
    fn superseded_load_generation_is_discarded() {
        let mut loads = LoadTracker::default();
        let first = loads.begin();
        let second = loads.begin();

        // The slower first request completes after the second was issued:
        // its result must not be applied, the newer one must.
        assert!(!loads.is_current(first));
        assert!(loads.is_current(second));

        // Issuing another load immediately stales the previous newest,
        // even if its result has not arrived yet.
        let third = loads.begin();
        assert!(!loads.is_current(second));
        assert!(loads.is_current(third));
    }

    #[tokio::test]
    async fn missing_dataset_aborts_the_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = LandscapeStore::new(dir.path().to_string_lossy().to_string());
        let err = store
            .point_cloud(Issue::Ec2025, cluster_type::ABSTRACT, 32)
            .await;
        assert!(err.is_err());
    }
}
