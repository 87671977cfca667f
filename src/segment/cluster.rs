//! Label clustering
//!
//! Groups label blocks into spatially contiguous clusters by vertical-gap
//! thresholding. Each cluster later seeds one candidate region.

use crate::page::Block;

/// Vertical-gap label clusterer
pub struct LabelClusterer;

impl LabelClusterer {
    /// Cluster label blocks by vertical proximity.
    ///
    /// Labels are sorted by `y0` ascending with a stable tie-break on id;
    /// a new cluster starts whenever the vertical gap to the previous
    /// label exceeds `gap_threshold`. Clusters come back in top-to-bottom
    /// order. Clustering the members of one produced cluster again yields
    /// exactly that cluster.
    pub fn cluster<'a>(labels: &[&'a Block], gap_threshold: f64) -> Vec<Vec<&'a Block>> {
        if labels.is_empty() {
            return Vec::new();
        }

        let mut sorted: Vec<&Block> = labels.to_vec();
        sorted.sort_by(|a, b| a.bbox.y0.total_cmp(&b.bbox.y0).then(a.id.cmp(&b.id)));

        let mut clusters: Vec<Vec<&Block>> = Vec::new();
        let mut current: Vec<&Block> = vec![sorted[0]];

        for pair in sorted.windows(2) {
            let (previous, next) = (pair[0], pair[1]);
            if next.bbox.y0 - previous.bbox.y1 > gap_threshold {
                clusters.push(std::mem::take(&mut current));
            }
            current.push(next);
        }
        clusters.push(current);

        clusters
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::{BBox, BlockCategory, BlockKind};

    fn make_label(id: u32, y0: f64, y1: f64) -> Block {
        Block {
            id,
            kind: BlockKind::Text,
            bbox: BBox::new(100.0, y0, 160.0, y1),
            category: BlockCategory::VisualContentLabel,
            text: format!("label {id}"),
            page_number: 1,
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(LabelClusterer::cluster(&[], 20.0).is_empty());
    }

    #[test]
    fn test_single_label() {
        let label = make_label(0, 100.0, 120.0);
        let clusters = LabelClusterer::cluster(&[&label], 20.0);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].len(), 1);
    }

    #[test]
    fn test_splits_on_large_gap() {
        // Gaps: 10 (kept together), 50 (split)
        let a = make_label(0, 100.0, 120.0);
        let b = make_label(1, 130.0, 150.0);
        let c = make_label(2, 200.0, 220.0);

        let clusters = LabelClusterer::cluster(&[&a, &b, &c], 20.0);
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].len(), 2);
        assert_eq!(clusters[1].len(), 1);
        assert_eq!(clusters[1][0].id, 2);
    }

    #[test]
    fn test_gap_exactly_at_threshold_keeps_cluster() {
        // Split requires gap strictly greater than the threshold
        let a = make_label(0, 100.0, 120.0);
        let b = make_label(1, 140.0, 160.0);

        let clusters = LabelClusterer::cluster(&[&a, &b], 20.0);
        assert_eq!(clusters.len(), 1);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let a = make_label(0, 100.0, 120.0);
        let b = make_label(1, 130.0, 150.0);
        let c = make_label(2, 300.0, 320.0);

        let forward = LabelClusterer::cluster(&[&a, &b, &c], 20.0);
        let backward = LabelClusterer::cluster(&[&c, &b, &a], 20.0);

        let ids = |clusters: &[Vec<&Block>]| -> Vec<Vec<u32>> {
            clusters
                .iter()
                .map(|c| c.iter().map(|b| b.id).collect())
                .collect()
        };
        assert_eq!(ids(&forward), ids(&backward));
    }

    #[test]
    fn test_tie_break_on_id() {
        let a = make_label(4, 100.0, 120.0);
        let b = make_label(1, 100.0, 120.0);

        let clusters = LabelClusterer::cluster(&[&a, &b], 20.0);
        assert_eq!(clusters.len(), 1);
        let ids: Vec<u32> = clusters[0].iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![1, 4]);
    }

    #[test]
    fn test_idempotent_on_cluster_output() {
        let a = make_label(0, 100.0, 120.0);
        let b = make_label(1, 125.0, 145.0);
        let c = make_label(2, 150.0, 170.0);

        let clusters = LabelClusterer::cluster(&[&a, &b, &c], 20.0);
        assert_eq!(clusters.len(), 1);

        // Re-clustering a produced cluster yields exactly one cluster
        let again = LabelClusterer::cluster(&clusters[0], 20.0);
        assert_eq!(again.len(), 1);
        assert_eq!(again[0].len(), 3);
    }

    #[test]
    fn test_clusters_in_top_to_bottom_order() {
        let top = make_label(3, 50.0, 70.0);
        let middle = make_label(1, 200.0, 220.0);
        let bottom = make_label(2, 500.0, 520.0);

        let clusters = LabelClusterer::cluster(&[&bottom, &top, &middle], 20.0);
        assert_eq!(clusters.len(), 3);
        assert_eq!(clusters[0][0].id, 3);
        assert_eq!(clusters[1][0].id, 1);
        assert_eq!(clusters[2][0].id, 2);
    }
}
