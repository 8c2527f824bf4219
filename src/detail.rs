//! Detail display models - per-issue vocabulary for the detail panel
//!
//! Two variants: the four-stage cognitive model used by the legacy corpus
//! and the situation/response model used by the special-issue corpus.
//! Unrecognized raw category codes pass through unchanged.

use crate::adapters::Issue;
use crate::view::PointCloudPoint;

/// One labeled row in the detail panel summary.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailDisplayModel {
    /// perception / cognition / emotion / motivation
    FourStage,
    /// grasp / response
    SituationResponse,
}

impl DetailDisplayModel {
    pub fn for_issue(issue: Issue) -> DetailDisplayModel {
        match issue {
            Issue::Ec2025 => DetailDisplayModel::FourStage,
            Issue::Ec2026Si => DetailDisplayModel::SituationResponse,
        }
    }

    /// Localized label for a raw category code; identity fallback.
    pub fn type_label(&self, raw: &str) -> String {
        let mapped = match self {
            DetailDisplayModel::FourStage => match raw {
                "perception" => Some("知覚"),
                "cognition" => Some("認知"),
                "emotion" => Some("情動"),
                "motivation" => Some("動機づけ"),
                _ => None,
            },
            DetailDisplayModel::SituationResponse => match raw {
                "grasp" => Some("状況理解"),
                "response" => Some("反応"),
                _ => None,
            },
        };
        mapped.map(str::to_string).unwrap_or_else(|| raw.to_string())
    }

    pub fn summary_rows(&self, point: &PointCloudPoint) -> Vec<SummaryRow> {
        match self {
            DetailDisplayModel::FourStage => {
                let value = if point.edc_title.is_empty() {
                    point.paper_title.clone()
                } else {
                    point.edc_title.clone()
                };
                vec![SummaryRow {
                    label: "内容".to_string(),
                    value,
                }]
            }
            DetailDisplayModel::SituationResponse => {
                let situation = if point.edc_title.is_empty() {
                    point.paper_title.clone()
                } else {
                    point.edc_title.clone()
                };
                [
                    SummaryRow {
                        label: "状況理解".to_string(),
                        value: situation,
                    },
                    SummaryRow {
                        label: "反応".to_string(),
                        value: point.edc_effect.clone(),
                    },
                ]
                .into_iter()
                .filter(|row| !row.value.is_empty())
                .collect()
            }
        }
    }

    pub fn context_items(&self, point: &PointCloudPoint) -> Vec<String> {
        match self {
            DetailDisplayModel::FourStage => {
                if point.edc_context.is_empty() {
                    vec![]
                } else {
                    vec![point.edc_context.clone()]
                }
            }
            DetailDisplayModel::SituationResponse => split_by_slash(&point.edc_context),
        }
    }

    pub fn approach_text(&self, point: &PointCloudPoint) -> Option<String> {
        match self {
            DetailDisplayModel::FourStage => {
                if point.edc_effect.is_empty() {
                    None
                } else {
                    Some(point.edc_effect.clone())
                }
            }
            DetailDisplayModel::SituationResponse => None,
        }
    }
}

/// Split a context string on `/` separators, trimming and dropping empty
/// segments.
fn split_by_slash(text: &str) -> Vec<String> {
    text.split('/')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(edc_title: &str, edc_context: &str, edc_effect: &str) -> PointCloudPoint {
        PointCloudPoint {
            point_id: "p::0".to_string(),
            filestem: "p".to_string(),
            tag_idx: 0,
            x: 0.0,
            y: 0.0,
            paper_id: "1".to_string(),
            paper_title: "Paper Title".to_string(),
            paper_abstract: String::new(),
            paper_publish_date: String::new(),
            edc_title: edc_title.to_string(),
            edc_context: edc_context.to_string(),
            edc_effect: edc_effect.to_string(),
            edc_type: String::new(),
        }
    }

    #[test]
    fn four_stage_maps_codes_and_passes_unknown_through() {
        let model = DetailDisplayModel::FourStage;
        assert_eq!(model.type_label("perception"), "知覚");
        assert_eq!(model.type_label("motivation"), "動機づけ");
        assert_eq!(model.type_label("mystery"), "mystery");
    }

    #[test]
    fn situation_response_maps_codes() {
        let model = DetailDisplayModel::SituationResponse;
        assert_eq!(model.type_label("grasp"), "状況理解");
        assert_eq!(model.type_label("response"), "反応");
        assert_eq!(model.type_label("paper"), "paper");
    }

    #[test]
    fn slash_split_trims_and_drops_empty_segments() {
        let model = DetailDisplayModel::SituationResponse;
        let p = point("t", "a / b /c", "");
        assert_eq!(model.context_items(&p), vec!["a", "b", "c"]);
        let empty = point("t", " / ", "");
        assert!(model.context_items(&empty).is_empty());
    }

    #[test]
    fn four_stage_context_is_single_item() {
        let model = DetailDisplayModel::FourStage;
        let p = point("t", "a / b", "e");
        assert_eq!(model.context_items(&p), vec!["a / b"]);
        assert_eq!(model.approach_text(&p), Some("e".to_string()));
        assert_eq!(model.approach_text(&point("t", "", "")), None);
    }

    #[test]
    fn situation_response_drops_empty_summary_rows() {
        let model = DetailDisplayModel::SituationResponse;
        let rows = model.summary_rows(&point("situation", "", ""));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "状況理解");

        let rows = model.summary_rows(&point("situation", "", "reaction"));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].value, "reaction");
    }

    #[test]
    fn summary_falls_back_to_paper_title() {
        let model = DetailDisplayModel::FourStage;
        let rows = model.summary_rows(&point("", "", ""));
        assert_eq!(rows[0].value, "Paper Title");
    }
}
