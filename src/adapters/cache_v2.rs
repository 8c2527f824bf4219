//! Cache-v2 adapter - normalized multi-file datasets joined at read time
//!
//! Papers, features, UMAP points, the point index and cluster
//! assignments live in separate files; this adapter joins them back into
//! the canonical model. A point whose index or paper lookup misses is
//! skipped, not an error; missing feature fields fall back to empty
//! strings.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::fetch::{join_path, JsonFetcher};
use crate::issue_config::{CacheV2SourceConfig, IssueConfigEntry};
use crate::model::{ClusterData, ClusterMember, DataPoint, DesignTag, Paper, PaperMetadata};

use super::{AdapterError, Issue, Mode};

#[derive(Debug, Clone, Deserialize)]
struct PaperMeta {
    #[serde(default)]
    title: String,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(default)]
    identifier: String,
    #[serde(default)]
    publish_date: String,
    #[serde(default)]
    conference: String,
    #[serde(default, rename = "abstract")]
    abstract_text: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PaperEntry {
    paper_id: String,
    metadata: PaperMeta,
}

#[derive(Debug, Deserialize)]
struct PapersJson {
    papers: HashMap<String, PaperEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct Feature {
    feature_id: String,
    paper_id: String,
    #[serde(default)]
    title: String,
    #[serde(default, rename = "type")]
    feature_type: String,
    #[serde(default)]
    context: String,
    #[serde(default)]
    effect: String,
}

#[derive(Debug, Deserialize)]
struct FeaturesJson {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct UmapPoint {
    point_id: String,
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct IndexEntry {
    point_id: String,
    feature_id: String,
    paper_id: String,
    feature_idx: u32,
}

#[derive(Debug, Deserialize)]
struct ClusterDef {
    cluster_id: i64,
    #[serde(default)]
    name: String,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
}

#[derive(Debug, Deserialize)]
struct ClusterAssignment {
    point_id: String,
    cluster_id: i64,
}

#[derive(Debug, Deserialize)]
struct ClustersJson {
    clusters: Vec<ClusterDef>,
    assignments: Vec<ClusterAssignment>,
}

fn decode<T: for<'de> Deserialize<'de>>(json: &Value, what: &str) -> Result<T, AdapterError> {
    T::deserialize(json).map_err(|e| AdapterError::Schema {
        context: format!("{what} ({e})"),
    })
}

fn features_by_paper(features: Vec<Feature>) -> HashMap<String, Vec<Feature>> {
    let mut grouped: HashMap<String, Vec<Feature>> = HashMap::new();
    for feature in features {
        grouped.entry(feature.paper_id.clone()).or_default().push(feature);
    }
    grouped
}

fn to_metadata(meta: PaperMeta) -> PaperMetadata {
    PaperMetadata {
        title: meta.title,
        authors: meta.authors,
        identifier: meta.identifier,
        publish_date: meta.publish_date,
        conference: meta.conference,
        abstract_text: meta.abstract_text,
    }
}

/// Join papers and features into the canonical bundle shape.
pub async fn fetch_papers(
    fetcher: &JsonFetcher,
    base: &str,
    issue: Issue,
    entry: &IssueConfigEntry,
) -> Result<Vec<Paper>, AdapterError> {
    let config = entry.cache_v2(issue.as_str())?;
    let papers_url = join_path(base, &config.papers);
    let features_url = join_path(base, &config.features);

    let (papers_json, features_json) = tokio::try_join!(
        fetcher.fetch_json(&papers_url),
        fetcher.fetch_json(&features_url),
    )?;
    let papers: PapersJson = decode(&papers_json, "papers file format")?;
    let features: FeaturesJson = decode(&features_json, "features file format")?;

    let mut grouped = features_by_paper(features.features);
    let mut result: Vec<Paper> = papers
        .papers
        .into_values()
        .map(|paper| {
            let tags = grouped
                .remove(&paper.paper_id)
                .unwrap_or_default()
                .into_iter()
                .map(|f| DesignTag {
                    title: f.title,
                    tag_type: f.feature_type,
                    context: f.context,
                    effect: f.effect,
                })
                .collect();
            Paper {
                file_stem: paper.paper_id,
                design_tags: tags,
                metadata: to_metadata(paper.metadata),
            }
        })
        .collect();
    result.sort_by(|a, b| a.file_stem.cmp(&b.file_stem));
    Ok(result)
}

/// Join points through the index to recover feature and paper identity.
pub async fn fetch_data_points(
    fetcher: &JsonFetcher,
    base: &str,
    issue: Issue,
    entry: &IssueConfigEntry,
    cluster_type: &str,
) -> Result<Vec<DataPoint>, AdapterError> {
    let config = entry.cache_v2(issue.as_str())?;
    let mode = Mode::from_cluster_type(cluster_type);

    let papers_url = join_path(
        base,
        CacheV2SourceConfig::mode_path_or(config.papers_by_mode.as_ref(), mode.as_str(), &config.papers),
    );
    let features_url = join_path(
        base,
        CacheV2SourceConfig::mode_path_or(
            config.features_by_mode.as_ref(),
            mode.as_str(),
            &config.features,
        ),
    );
    let points_url = join_path(
        base,
        CacheV2SourceConfig::mode_path(&config.points_by_mode, mode.as_str())?,
    );
    let index_url = join_path(
        base,
        CacheV2SourceConfig::mode_path(&config.index_by_mode, mode.as_str())?,
    );

    let (papers_json, features_json, points_json, index_json) = tokio::try_join!(
        fetcher.fetch_json(&papers_url),
        fetcher.fetch_json(&features_url),
        fetcher.fetch_json(&points_url),
        fetcher.fetch_json(&index_url),
    )?;
    let papers: PapersJson = decode(&papers_json, "papers file format")?;
    let features: FeaturesJson = decode(&features_json, "features file format")?;
    let points: Vec<UmapPoint> = decode(&points_json, "points file format")?;
    let index: Vec<IndexEntry> = decode(&index_json, "index file format")?;

    let papers_by_id: HashMap<&str, &PaperEntry> = papers
        .papers
        .values()
        .map(|p| (p.paper_id.as_str(), p))
        .collect();
    let feature_by_id: HashMap<&str, &Feature> = features
        .features
        .iter()
        .map(|f| (f.feature_id.as_str(), f))
        .collect();
    let index_by_point: HashMap<&str, &IndexEntry> =
        index.iter().map(|e| (e.point_id.as_str(), e)).collect();

    let mut data_points = Vec::with_capacity(points.len());
    for point in &points {
        let Some(idx) = index_by_point.get(point.point_id.as_str()) else {
            continue;
        };
        let Some(paper) = papers_by_id.get(idx.paper_id.as_str()) else {
            continue;
        };
        let feature = feature_by_id.get(idx.feature_id.as_str());

        let paper_id = if paper.metadata.identifier.is_empty() {
            idx.paper_id.clone()
        } else {
            paper.metadata.identifier.clone()
        };
        data_points.push(DataPoint {
            filestem: idx.paper_id.clone(),
            tag_idx: idx.feature_idx,
            paper_title: paper.metadata.title.clone(),
            paper_id,
            paper_abstract: paper.metadata.abstract_text.clone(),
            paper_publish_date: paper.metadata.publish_date.clone(),
            edc_title: feature.map(|f| f.title.clone()).unwrap_or_default(),
            edc_context: feature.map(|f| f.context.clone()).unwrap_or_default(),
            edc_effect: feature.map(|f| f.effect.clone()).unwrap_or_default(),
            edc_type: feature.map(|f| f.feature_type.clone()).unwrap_or_default(),
            x: point.x,
            y: point.y,
        });
    }
    Ok(data_points)
}

/// Rebuild cluster membership by resolving assignments through the index.
pub async fn fetch_clusters(
    fetcher: &JsonFetcher,
    base: &str,
    issue: Issue,
    entry: &IssueConfigEntry,
    cluster_type: &str,
) -> Result<Vec<ClusterData>, AdapterError> {
    let config = entry.cache_v2(issue.as_str())?;
    let mode = Mode::from_cluster_type(cluster_type);

    let clusters_url = join_path(
        base,
        CacheV2SourceConfig::mode_path(&config.clusters_by_mode, mode.as_str())?,
    );
    let index_url = join_path(
        base,
        CacheV2SourceConfig::mode_path(&config.index_by_mode, mode.as_str())?,
    );

    let (clusters_json, index_json) = tokio::try_join!(
        fetcher.fetch_json(&clusters_url),
        fetcher.fetch_json(&index_url),
    )?;
    let clusters: ClustersJson = decode(&clusters_json, "clusters file format")?;
    let index: Vec<IndexEntry> = decode(&index_json, "index file format")?;

    let index_by_point: HashMap<&str, &IndexEntry> =
        index.iter().map(|e| (e.point_id.as_str(), e)).collect();

    let mut members_by_cluster: HashMap<i64, Vec<ClusterMember>> = HashMap::new();
    for assignment in &clusters.assignments {
        let Some(idx) = index_by_point.get(assignment.point_id.as_str()) else {
            continue;
        };
        members_by_cluster
            .entry(assignment.cluster_id)
            .or_default()
            .push(ClusterMember {
                filestem: idx.paper_id.clone(),
                tag_idx: idx.feature_idx,
            });
    }

    Ok(clusters
        .clusters
        .into_iter()
        .map(|cluster| {
            let name = if cluster.name.is_empty() {
                format!("cluster-{}", cluster.cluster_id)
            } else {
                cluster.name
            };
            ClusterData {
                name,
                members: members_by_cluster
                    .remove(&cluster.cluster_id)
                    .unwrap_or_default(),
                x_min: cluster.x_min,
                x_max: cluster.x_max,
                y_min: cluster.y_min,
                y_max: cluster.y_max,
            }
        })
        .collect())
}
