//! K-nearest-neighbor query over the loaded point cloud

use crate::view::PointCloudPoint;

/// One query result: index into the original (pre-filter) array plus the
/// Euclidean distance to the target.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub idx: usize,
    pub dist: f64,
}

/// Return the `k` closest points to `target` by Euclidean distance.
///
/// Points at distance exactly zero (the target itself and exact
/// coordinate duplicates) are excluded. Ties at equal nonzero distance
/// keep original array order. Returns fewer than `k` items when the
/// input is small.
pub fn k_nearest(points: &[PointCloudPoint], target: &PointCloudPoint, k: usize) -> Vec<Neighbor> {
    let mut neighbors: Vec<Neighbor> = points
        .iter()
        .enumerate()
        .map(|(idx, p)| Neighbor {
            idx,
            dist: (p.x - target.x).hypot(p.y - target.y),
        })
        .filter(|n| n.dist > 0.0)
        .collect();
    neighbors.sort_by(|a, b| a.dist.total_cmp(&b.dist));
    neighbors.truncate(k);
    neighbors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, x: f64, y: f64) -> PointCloudPoint {
        PointCloudPoint {
            point_id: id.to_string(),
            filestem: id.to_string(),
            tag_idx: 0,
            x,
            y,
            paper_id: String::new(),
            paper_title: String::new(),
            paper_abstract: String::new(),
            paper_publish_date: String::new(),
            edc_title: String::new(),
            edc_context: String::new(),
            edc_effect: String::new(),
            edc_type: String::new(),
        }
    }

    #[test]
    fn excludes_target_and_exact_duplicates() {
        let points = vec![
            point("a", 0.0, 0.0),
            point("dup", 0.0, 0.0),
            point("b", 1.0, 0.0),
            point("c", 0.0, 2.0),
        ];
        let result = k_nearest(&points, &points[0], 10);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].idx, 2);
        assert_eq!(result[1].idx, 3);
    }

    #[test]
    fn sorted_ascending_and_bounded_by_k() {
        let points = vec![
            point("a", 0.0, 0.0),
            point("b", 3.0, 0.0),
            point("c", 1.0, 0.0),
            point("d", 2.0, 0.0),
        ];
        let result = k_nearest(&points, &points[0], 2);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].idx, 2);
        assert_eq!(result[1].idx, 3);
        assert!(result[0].dist <= result[1].dist);
    }

    #[test]
    fn ties_keep_original_order() {
        let points = vec![
            point("target", 0.0, 0.0),
            point("right", 1.0, 0.0),
            point("up", 0.0, 1.0),
            point("left", -1.0, 0.0),
        ];
        let result = k_nearest(&points, &points[0], 3);
        assert_eq!(
            result.iter().map(|n| n.idx).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn small_input_returns_fewer_than_k() {
        let points = vec![point("a", 0.0, 0.0)];
        let target = point("t", 5.0, 5.0);
        let result = k_nearest(&points, &target, 5);
        assert_eq!(result.len(), 1);
    }
}
