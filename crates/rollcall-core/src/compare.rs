//! Encoding comparison: distances plus a per-reference match decision.

use crate::types::Encoding;

/// Default Euclidean tolerance for L2-normalized ArcFace encodings.
///
/// For unit vectors `d² = 2 − 2·cos`, so 1.10 corresponds to a cosine
/// similarity of roughly 0.40.
pub const DEFAULT_TOLERANCE: f32 = 1.10;

/// Distances from a candidate to every reference, and whether each one counts as a match.
///
/// `distances[i]` and `matches[i]` both refer to `references[i]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparison {
    pub distances: Vec<f32>,
    pub matches: Vec<bool>,
}

impl Comparison {
    /// Index of the smallest distance. Ties resolve to the lowest index.
    pub fn closest(&self) -> Option<usize> {
        self.distances
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
    }

    pub fn is_match(&self, index: usize) -> bool {
        self.matches.get(index).copied().unwrap_or(false)
    }
}

/// Strategy for comparing a candidate encoding against reference encodings.
pub trait Comparator {
    fn compare(&self, references: &[Encoding], candidate: &Encoding) -> Comparison;
}

/// Euclidean distance with a fixed tolerance: a reference matches when
/// its distance is at most `tolerance`.
#[derive(Debug, Clone, Copy)]
pub struct EuclideanComparator {
    pub tolerance: f32,
}

impl Default for EuclideanComparator {
    fn default() -> Self {
        Self { tolerance: DEFAULT_TOLERANCE }
    }
}

impl Comparator for EuclideanComparator {
    fn compare(&self, references: &[Encoding], candidate: &Encoding) -> Comparison {
        let distances: Vec<f32> = references.iter().map(|r| r.distance(candidate)).collect();
        let matches = distances.iter().map(|&d| d <= self.tolerance).collect();
        Comparison { distances, matches }
    }
}
