//! Distributional distance between a tile and its region.

use crate::histogram::ClassHistogram;

/// Class counts are scaled by this before the class-count penalty is squared.
pub const CLASS_COUNT_SCALE: f64 = 20.0;

/// Sum of squared differences between region and tile class fractions:
///
/// `F = Σ_j (G_j/ΣG − L_j/ΣL)²` over every class `j` of the region.
///
/// Classes the tile lacks contribute their full region fraction; classes only
/// the tile has are ignored. Both histograms must be non-empty (checked by the
/// callers, which report which one was empty).
pub(crate) fn objective(region: &ClassHistogram, tile: &ClassHistogram) -> f64 {
    let g_total = region.total() as f64;
    let l_total = tile.total() as f64;
    region
        .iter()
        .map(|(class, g)| {
            let d = g as f64 / g_total - tile.count(class) as f64 / l_total;
            d * d
        })
        .sum()
}

/// `(|classes(G)|/20 − |classes(L)|/20)²`, multiplied by the sweep weight.
pub(crate) fn class_count_penalty(region: &ClassHistogram, tile: &ClassHistogram) -> f64 {
    let d = region.class_count() as f64 / CLASS_COUNT_SCALE - tile.class_count() as f64 / CLASS_COUNT_SCALE;
    d * d
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn identical_distributions_score_zero() {
        let g = ClassHistogram::from_counts([(1, 80), (2, 20)]);
        assert_eq!(objective(&g, &g.clone()), 0.0);
    }

    #[test]
    fn proportional_histograms_score_zero() {
        let g = ClassHistogram::from_counts([(1, 800), (2, 200)]);
        let l = ClassHistogram::from_counts([(1, 4), (2, 1)]);
        assert_abs_diff_eq!(objective(&g, &l), 0.0, epsilon = 1e-15);
    }

    #[test]
    fn missing_tile_class_counts_as_zero_fraction() {
        let g = ClassHistogram::from_counts([(1, 50), (2, 50)]);
        let l = ClassHistogram::from_counts([(1, 10)]);
        // (0.5 - 1.0)² + (0.5 - 0)²
        assert_abs_diff_eq!(objective(&g, &l), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn tile_only_classes_are_ignored() {
        let g = ClassHistogram::from_counts([(1, 10)]);
        let l = ClassHistogram::from_counts([(1, 5), (9, 5)]);
        // Only class 1 is summed: (1.0 - 0.5)²
        assert_abs_diff_eq!(objective(&g, &l), 0.25, epsilon = 1e-12);
    }

    #[test]
    fn penalty_uses_class_counts() {
        let g = ClassHistogram::from_counts([(1, 1), (2, 1), (3, 1), (4, 1)]);
        let l = ClassHistogram::from_counts([(1, 1), (2, 1)]);
        // (4/20 - 2/20)² = 0.01
        assert_abs_diff_eq!(class_count_penalty(&g, &l), 0.01, epsilon = 1e-12);
        assert_eq!(class_count_penalty(&g, &g), 0.0);
    }
}
