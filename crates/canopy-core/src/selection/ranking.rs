//! Unweighted ranking.

use serde::{Deserialize, Serialize};

use super::objective::objective;
use super::{ensure_non_empty, map_candidates, TileCandidate};
use crate::error::Result;
use crate::histogram::ClassHistogram;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileScore {
    pub id: String,
    pub score: f64,
}

/// Tile scores in ascending order; equal scores keep ascending id order.
/// Deserialised entries are re-sorted into that order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<TileScore>", into = "Vec<TileScore>")]
pub struct ScoreTable {
    entries: Vec<TileScore>,
}

impl ScoreTable {
    /// Sort arbitrary entries into table order.
    pub fn from_entries(mut entries: Vec<TileScore>) -> Self {
        entries.sort_by(|a, b| a.score.total_cmp(&b.score).then_with(|| a.id.cmp(&b.id)));
        Self { entries }
    }

    /// Lowest-scoring tile.
    pub fn best(&self) -> Option<&TileScore> {
        self.entries.first()
    }

    pub fn score_of(&self, id: &str) -> Option<f64> {
        self.entries.iter().find(|e| e.id == id).map(|e| e.score)
    }

    /// Zero-based rank of `id` (0 = best).
    pub fn rank_of(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TileScore> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<TileScore>> for ScoreTable {
    fn from(entries: Vec<TileScore>) -> Self {
        Self::from_entries(entries)
    }
}

impl From<ScoreTable> for Vec<TileScore> {
    fn from(table: ScoreTable) -> Self {
        table.entries
    }
}

impl<'a> IntoIterator for &'a ScoreTable {
    type Item = &'a TileScore;
    type IntoIter = std::slice::Iter<'a, TileScore>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Score every candidate against the region distribution and rank ascending.
///
/// Fails with `EmptyHistogram` if the region or any candidate has no counts.
pub fn score_unweighted(region: &ClassHistogram, candidates: &[TileCandidate]) -> Result<ScoreTable> {
    ensure_non_empty(region, candidates)?;
    let entries = map_candidates(candidates, |c| TileScore {
        id: c.id.clone(),
        score: objective(region, &c.histogram),
    });
    Ok(ScoreTable::from_entries(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tile(id: &str, pairs: &[(i32, u64)]) -> TileCandidate {
        TileCandidate::new(id, ClassHistogram::from_counts(pairs.iter().copied()))
    }

    #[test]
    fn identical_tile_scores_zero() {
        let region = ClassHistogram::from_counts([(1, 80), (2, 20)]);
        let table = score_unweighted(&region, &[tile("t", &[(1, 80), (2, 20)])]).unwrap();
        assert_eq!(table.score_of("t"), Some(0.0));
    }

    #[test]
    fn closer_distribution_ranks_strictly_better() {
        let region = ClassHistogram::from_counts([(1, 80), (2, 20)]);
        let table = score_unweighted(
            &region,
            &[tile("even", &[(1, 50), (2, 50)]), tile("match", &[(1, 80), (2, 20)])],
        )
        .unwrap();
        assert_eq!(table.ids().collect::<Vec<_>>(), vec!["match", "even"]);
        assert!(table.score_of("match").unwrap() < table.score_of("even").unwrap());
    }

    #[test]
    fn district_scenario_ranks_a_before_b() {
        let region = ClassHistogram::from_counts([(10, 100), (20, 50), (30, 0)]);
        let table = score_unweighted(
            &region,
            &[tile("B", &[(10, 90), (20, 10)]), tile("A", &[(10, 60), (20, 40)])],
        )
        .unwrap();
        assert_eq!(table.ids().collect::<Vec<_>>(), vec!["A", "B"]);
        // (2/3 - 0.6)² + (1/3 - 0.4)² = 2/225
        assert_abs_diff_eq!(table.score_of("A").unwrap(), 2.0 / 225.0, epsilon = 1e-12);
        // (2/3 - 0.9)² + (1/3 - 0.1)² = 0.98/9
        assert_abs_diff_eq!(table.score_of("B").unwrap(), 0.98 / 9.0, epsilon = 1e-12);
        assert_abs_diff_eq!(table.score_of("A").unwrap(), 0.0089, epsilon = 1e-4);
        assert_abs_diff_eq!(table.score_of("B").unwrap(), 0.1089, epsilon = 1e-4);
    }

    #[test]
    fn ties_are_broken_by_ascending_id() {
        let region = ClassHistogram::from_counts([(1, 50), (2, 50)]);
        let tiles = [
            tile("q3", &[(1, 1), (2, 3)]),
            tile("q1", &[(1, 3), (2, 1)]),
            tile("q2", &[(1, 30), (2, 10)]),
            tile("q0", &[(1, 1), (2, 1)]),
        ];
        let table = score_unweighted(&region, &tiles).unwrap();
        // q1, q2, q3 all sit 0.25 away from 0.5 on both classes.
        assert_eq!(table.ids().collect::<Vec<_>>(), vec!["q0", "q1", "q2", "q3"]);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let region = ClassHistogram::from_counts([(1, 37), (2, 11), (5, 52), (9, 3)]);
        let tiles: Vec<TileCandidate> = (0..50u64)
            .map(|i| tile(&format!("t{i:02}"), &[(1, 1 + i % 7), (2, 1 + i % 3), (5, 10 + i % 11), (9, i % 2)]))
            .collect();
        let first = score_unweighted(&region, &tiles).unwrap();
        let second = score_unweighted(&region, &tiles).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 50);
        let scores: Vec<f64> = first.iter().map(|e| e.score).collect();
        assert!(scores.windows(2).all(|w| w[0] <= w[1]));
        assert!(scores.iter().all(|&s| s >= 0.0));
    }

    #[test]
    fn no_candidates_gives_empty_table() {
        let region = ClassHistogram::from_counts([(1, 1)]);
        let table = score_unweighted(&region, &[]).unwrap();
        assert!(table.is_empty());
        assert!(table.best().is_none());
    }

    #[test]
    fn rank_lookup() {
        let region = ClassHistogram::from_counts([(1, 1), (2, 1)]);
        let table = score_unweighted(&region, &[tile("x", &[(1, 1)]), tile("y", &[(1, 1), (2, 1)])]).unwrap();
        assert_eq!(table.rank_of("y"), Some(0));
        assert_eq!(table.rank_of("x"), Some(1));
        assert_eq!(table.rank_of("z"), None);
        assert_eq!(table.best().map(|e| e.id.as_str()), Some("y"));
    }

    #[test]
    fn deserialised_table_is_put_in_rank_order() {
        let json = r#"[{"id":"b","score":0.5},{"id":"c","score":0.1},{"id":"a","score":0.5}]"#;
        let table: ScoreTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.ids().collect::<Vec<_>>(), vec!["c", "a", "b"]);
        assert_eq!(table.best().map(|e| e.id.as_str()), Some("c"));

        let back = serde_json::to_string(&table).unwrap();
        assert_eq!(back, r#"[{"id":"c","score":0.1},{"id":"a","score":0.5},{"id":"b","score":0.5}]"#);
    }
}
