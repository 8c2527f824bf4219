//! Canonical landscape data model
//!
//! Every upstream layout (legacy pre-joined files, cache-v2 normalized
//! files) is parsed into these shapes. Instances are built fresh on each
//! data load and treated as read-only afterwards.

use serde::{Deserialize, Serialize};

/// Clustering-type selector values shared between the UI and file paths.
pub mod cluster_type {
    pub const ABSTRACT: &str = "abstract";
    pub const TITLE: &str = "title";
    pub const FULL: &str = "full";
}

/// One extracted design-pattern entry (EDC tag) from a paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DesignTag {
    pub title: String,
    #[serde(rename = "type")]
    pub tag_type: String,
    pub context: String,
    pub effect: String,
}

/// Bibliographic metadata for a source paper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperMetadata {
    pub title: String,
    pub authors: Vec<String>,
    pub identifier: String,
    pub publish_date: String,
    pub conference: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

/// One source document with its extracted design tags.
///
/// Legacy bundle files key papers by file stem and omit the stem inside
/// the record, so `file_stem` defaults to empty during deserialization
/// and is re-attached by the bundle parser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    #[serde(default)]
    pub file_stem: String,
    #[serde(rename = "design-tags")]
    pub design_tags: Vec<DesignTag>,
    pub metadata: PaperMetadata,
}

/// One plotted unit: a paper or one of its design tags at a 2-D position.
///
/// `tag_idx` is unique within a `filestem`; an empty `edc_title` marks a
/// point that stands for the bare paper rather than a tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPoint {
    pub filestem: String,
    pub tag_idx: u32,
    pub paper_title: String,
    pub paper_id: String,
    pub paper_abstract: String,
    pub paper_publish_date: String,
    pub edc_title: String,
    pub edc_context: String,
    pub edc_effect: String,
    pub edc_type: String,
    pub x: f64,
    pub y: f64,
}

/// Membership reference from a cluster to a plotted point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterMember {
    pub filestem: String,
    pub tag_idx: u32,
}

/// A named bounding box over a region of the projection, with the points
/// assigned to it by the offline clustering pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterData {
    pub name: String,
    pub members: Vec<ClusterMember>,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}
