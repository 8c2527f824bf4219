//! Filter engine - free-text AND-search combined with a year-set filter
//!
//! Recomputed against the full unfiltered point set on every change,
//! never incrementally.

use std::collections::HashSet;

use chrono::Datelike;

use crate::view::PointCloudPoint;

#[derive(Debug, Clone, Default)]
pub struct FilterState {
    pub query: String,
    pub selected_years: HashSet<i32>,
}

impl FilterState {
    pub fn new(query: impl Into<String>, selected_years: HashSet<i32>) -> Self {
        Self {
            query: query.into(),
            selected_years,
        }
    }

    /// Combined filter: the publish year must be selected AND every
    /// search term must be a case-insensitive substring of the point's
    /// title + abstract + tag title. An empty year set matches nothing;
    /// an empty query matches everything.
    pub fn matches(&self, point: &PointCloudPoint) -> bool {
        match publish_year(&point.paper_publish_date) {
            Some(year) if self.selected_years.contains(&year) => {}
            _ => return false,
        }

        let terms: Vec<String> = self
            .query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        if terms.is_empty() {
            return true;
        }
        let target = format!(
            "{} {} {}",
            point.paper_title, point.paper_abstract, point.edc_title
        )
        .to_lowercase();
        terms.iter().all(|term| target.contains(term.as_str()))
    }

    pub fn apply<'a>(&self, points: &'a [PointCloudPoint]) -> Vec<&'a PointCloudPoint> {
        points.iter().filter(|p| self.matches(p)).collect()
    }
}

/// Year of an ISO-like date string; falls back to a leading `YYYY` prefix
/// for date-only or otherwise partial values.
pub fn publish_year(date: &str) -> Option<i32> {
    if let Ok(parsed) = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        return Some(parsed.year());
    }
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(date) {
        return Some(parsed.year());
    }
    let prefix: String = date.chars().take_while(char::is_ascii_digit).collect();
    if prefix.len() == 4 {
        prefix.parse().ok()
    } else {
        None
    }
}

/// Sorted unique publish years present in a point set.
pub fn available_years(points: &[PointCloudPoint]) -> Vec<i32> {
    let mut years: Vec<i32> = points
        .iter()
        .filter_map(|p| publish_year(&p.paper_publish_date))
        .collect();
    years.sort_unstable();
    years.dedup();
    years
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(title: &str, abstract_text: &str, edc_title: &str, date: &str) -> PointCloudPoint {
        PointCloudPoint {
            point_id: format!("{title}::0"),
            filestem: title.to_string(),
            tag_idx: 0,
            x: 0.0,
            y: 0.0,
            paper_id: String::new(),
            paper_title: title.to_string(),
            paper_abstract: abstract_text.to_string(),
            paper_publish_date: date.to_string(),
            edc_title: edc_title.to_string(),
            edc_context: String::new(),
            edc_effect: String::new(),
            edc_type: String::new(),
        }
    }

    fn sample_points() -> Vec<PointCloudPoint> {
        vec![
            point("Games and Play", "about fun", "reward loop", "2023-05-01"),
            point("Serious Tools", "about work", "focus aid", "2024-11-20"),
        ]
    }

    #[test]
    fn empty_query_with_all_years_keeps_everything_in_order() {
        let points = sample_points();
        let filter = FilterState::new("", HashSet::from([2023, 2024]));
        let kept = filter.apply(&points);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].paper_title, "Games and Play");
        assert_eq!(kept[1].paper_title, "Serious Tools");
    }

    #[test]
    fn unmatched_query_returns_nothing() {
        let points = sample_points();
        let filter = FilterState::new("zzzznotfound", HashSet::from([2023, 2024]));
        assert!(filter.apply(&points).is_empty());
    }

    #[test]
    fn all_terms_must_match_across_fields() {
        let points = sample_points();
        // One term from the abstract, one from the tag title.
        let filter = FilterState::new("fun reward", HashSet::from([2023, 2024]));
        let kept = filter.apply(&points);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].paper_title, "Games and Play");

        let filter = FilterState::new("fun work", HashSet::from([2023, 2024]));
        assert!(filter.apply(&points).is_empty());
    }

    #[test]
    fn search_is_case_insensitive() {
        let points = sample_points();
        let filter = FilterState::new("GAMES", HashSet::from([2023]));
        assert_eq!(filter.apply(&points).len(), 1);
    }

    #[test]
    fn empty_year_set_matches_nothing() {
        let points = sample_points();
        let filter = FilterState::new("", HashSet::new());
        assert!(filter.apply(&points).is_empty());
    }

    #[test]
    fn year_filter_drops_unselected_years() {
        let points = sample_points();
        let filter = FilterState::new("", HashSet::from([2024]));
        let kept = filter.apply(&points);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].paper_title, "Serious Tools");
    }

    #[test]
    fn publish_year_handles_partial_dates() {
        assert_eq!(publish_year("2023-05-01"), Some(2023));
        assert_eq!(publish_year("2023-05-01T12:00:00+09:00"), Some(2023));
        assert_eq!(publish_year("2023"), Some(2023));
        assert_eq!(publish_year("unknown"), None);
        assert_eq!(publish_year(""), None);
    }

    #[test]
    fn available_years_are_sorted_and_unique() {
        let points = vec![
            point("a", "", "", "2024-01-01"),
            point("b", "", "", "2023-01-01"),
            point("c", "", "", "2024-06-01"),
        ];
        assert_eq!(available_years(&points), vec![2023, 2024]);
    }
}
