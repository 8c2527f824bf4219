//! Renderer-facing projections of the canonical model

use std::collections::HashMap;

use serde::Serialize;

use crate::detail::{DetailDisplayModel, SummaryRow};
use crate::model::{ClusterData, DataPoint};

/// A plotted point with a synthesized globally-unique id. One-to-one with
/// [`DataPoint`].
#[derive(Debug, Clone, Serialize)]
pub struct PointCloudPoint {
    pub point_id: String,
    pub filestem: String,
    pub tag_idx: u32,
    pub x: f64,
    pub y: f64,
    pub paper_id: String,
    pub paper_title: String,
    pub paper_abstract: String,
    pub paper_publish_date: String,
    pub edc_title: String,
    pub edc_context: String,
    pub edc_effect: String,
    pub edc_type: String,
}

impl From<&DataPoint> for PointCloudPoint {
    fn from(point: &DataPoint) -> Self {
        Self {
            point_id: format!("{}::{}", point.filestem, point.tag_idx),
            filestem: point.filestem.clone(),
            tag_idx: point.tag_idx,
            x: point.x,
            y: point.y,
            paper_id: point.paper_id.clone(),
            paper_title: point.paper_title.clone(),
            paper_abstract: point.paper_abstract.clone(),
            paper_publish_date: point.paper_publish_date.clone(),
            edc_title: point.edc_title.clone(),
            edc_context: point.edc_context.clone(),
            edc_effect: point.edc_effect.clone(),
            edc_type: point.edc_type.clone(),
        }
    }
}

pub fn point_cloud(points: &[DataPoint]) -> Vec<PointCloudPoint> {
    points.iter().map(PointCloudPoint::from).collect()
}

/// A labeled bounding box drawn over the projection. Membership is not
/// needed to draw the overlay.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterOverlay {
    pub name: String,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

pub fn cluster_overlays(clusters: &[ClusterData]) -> Vec<ClusterOverlay> {
    clusters
        .iter()
        .map(|cluster| ClusterOverlay {
            name: cluster.name.clone(),
            x_min: cluster.x_min,
            x_max: cluster.x_max,
            y_min: cluster.y_min,
            y_max: cluster.y_max,
        })
        .collect()
}

/// Map each member file stem to its cluster name. Used to color points by
/// the abstract clustering.
pub fn abstract_cluster_mapping(clusters: &[ClusterData]) -> HashMap<String, String> {
    let mut mapping = HashMap::new();
    for cluster in clusters {
        for member in &cluster.members {
            mapping.insert(member.filestem.clone(), cluster.name.clone());
        }
    }
    mapping
}

/// Public record URL for a paper identifier.
pub fn paper_url(paper_id: &str) -> String {
    format!("https://ipsj.ixsq.nii.ac.jp/records/{paper_id}")
}

/// Render-ready description of one point's detail panel.
#[derive(Debug, Clone)]
pub struct DetailViewModel {
    pub title: String,
    pub type_label: String,
    pub paper_title: String,
    pub paper_url: String,
    pub paper_abstract: String,
    pub summary_rows: Vec<SummaryRow>,
    pub context_items: Vec<String>,
    pub approach_text: Option<String>,
}

/// Build the detail panel model for a point under the active display
/// model. A point without a tag is labeled as the bare paper.
pub fn detail_view_model(point: &PointCloudPoint, model: DetailDisplayModel) -> DetailViewModel {
    let raw_label = if point.edc_type.is_empty() {
        "paper"
    } else {
        &point.edc_type
    };
    let title = if point.edc_title.is_empty() {
        point.paper_title.clone()
    } else {
        point.edc_title.clone()
    };
    DetailViewModel {
        title,
        type_label: model.type_label(raw_label),
        paper_title: point.paper_title.clone(),
        paper_url: paper_url(&point.paper_id),
        paper_abstract: point.paper_abstract.clone(),
        summary_rows: model.summary_rows(point),
        context_items: model.context_items(point),
        approach_text: model.approach_text(point),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClusterMember;

    fn data_point(filestem: &str, tag_idx: u32) -> DataPoint {
        DataPoint {
            filestem: filestem.to_string(),
            tag_idx,
            paper_title: "Paper".to_string(),
            paper_id: "9".to_string(),
            paper_abstract: "Abs".to_string(),
            paper_publish_date: "2024-01-01".to_string(),
            edc_title: "Tag".to_string(),
            edc_context: "ctx".to_string(),
            edc_effect: "eff".to_string(),
            edc_type: "perception".to_string(),
            x: 1.0,
            y: 2.0,
        }
    }

    #[test]
    fn point_id_combines_filestem_and_tag_idx() {
        let points = point_cloud(&[data_point("paper1", 3)]);
        assert_eq!(points[0].point_id, "paper1::3");
        assert_eq!(points[0].x, 1.0);
    }

    #[test]
    fn mapping_covers_all_members() {
        let clusters = vec![ClusterData {
            name: "play".to_string(),
            members: vec![
                ClusterMember {
                    filestem: "a".to_string(),
                    tag_idx: 0,
                },
                ClusterMember {
                    filestem: "b".to_string(),
                    tag_idx: 1,
                },
            ],
            x_min: 0.0,
            x_max: 1.0,
            y_min: 0.0,
            y_max: 1.0,
        }];
        let mapping = abstract_cluster_mapping(&clusters);
        assert_eq!(mapping.get("a").map(String::as_str), Some("play"));
        assert_eq!(mapping.get("b").map(String::as_str), Some("play"));
    }

    #[test]
    fn detail_model_labels_untagged_point_as_paper() {
        let mut raw = data_point("p", 0);
        raw.edc_type = String::new();
        raw.edc_title = String::new();
        let point = PointCloudPoint::from(&raw);
        let detail = detail_view_model(&point, DetailDisplayModel::FourStage);
        assert_eq!(detail.type_label, "paper");
        assert_eq!(detail.title, "Paper");
        assert_eq!(detail.paper_url, "https://ipsj.ixsq.nii.ac.jp/records/9");
    }

    #[test]
    fn detail_model_localizes_tag_type() {
        let point = PointCloudPoint::from(&data_point("p", 0));
        let detail = detail_view_model(&point, DetailDisplayModel::FourStage);
        assert_eq!(detail.type_label, "知覚");
        assert_eq!(detail.title, "Tag");
        assert_eq!(detail.approach_text, Some("eff".to_string()));
    }
}
