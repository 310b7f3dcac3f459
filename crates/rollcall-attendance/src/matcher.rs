//! Identification of one face against the session snapshot.

use crate::dataset::DatasetSnapshot;
use rollcall_core::{Comparator, Encoding};

pub const UNKNOWN_LABEL: &str = "Unknown";

#[derive(Debug, Clone, PartialEq)]
pub enum Identification {
    Known {
        index: usize,
        name: String,
        distance: f32,
    },
    Unknown,
}

impl Identification {
    pub fn label(&self) -> &str {
        match self {
            Identification::Known { name, .. } => name,
            Identification::Unknown => UNKNOWN_LABEL,
        }
    }
}

/// Identify `candidate` as the closest reference, provided the comparator
/// also flags that same reference as a match.
///
/// The closest reference and the match flags are two separate answers from
/// the comparator; a match needs both to agree.
pub fn identify(comparator: &dyn Comparator, snapshot: &DatasetSnapshot, candidate: &Encoding) -> Identification {
    if snapshot.is_empty() {
        return Identification::Unknown;
    }

    let comparison = comparator.compare(snapshot.encodings(), candidate);
    let Some(index) = comparison.closest() else {
        return Identification::Unknown;
    };
    if !comparison.is_match(index) {
        return Identification::Unknown;
    }

    match snapshot.name(index) {
        Some(name) => Identification::Known {
            index,
            name: name.to_string(),
            distance: comparison.distances[index],
        },
        None => Identification::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::StudentReference;
    use rollcall_core::{Comparison, EuclideanComparator};

    fn snapshot(refs: &[(&str, Vec<f32>)]) -> DatasetSnapshot {
        DatasetSnapshot::new(
            refs.iter()
                .map(|(name, v)| StudentReference {
                    name: name.to_string(),
                    encoding: Encoding::new(v.clone()),
                    source: format!("{name}.jpg").into(),
                })
                .collect(),
        )
    }

    /// Returns canned distances and flags regardless of input.
    struct Canned(Comparison);

    impl Comparator for Canned {
        fn compare(&self, _references: &[Encoding], _candidate: &Encoding) -> Comparison {
            self.0.clone()
        }
    }

    #[test]
    fn test_empty_snapshot_is_unknown() {
        let snap = DatasetSnapshot::new(Vec::new());
        let result = identify(&EuclideanComparator::default(), &snap, &Encoding::new(vec![1.0, 0.0]));
        assert_eq!(result, Identification::Unknown);
        assert_eq!(result.label(), "Unknown");
    }

    #[test]
    fn test_closest_match_wins() {
        let snap = snapshot(&[("Alice", vec![1.0, 0.0]), ("Bob", vec![0.8, 0.2])]);
        let cmp = EuclideanComparator { tolerance: 0.5 };
        let result = identify(&cmp, &snap, &Encoding::new(vec![0.82, 0.18]));
        match result {
            Identification::Known { index, ref name, .. } => {
                assert_eq!(index, 1);
                assert_eq!(name, "Bob");
            }
            Identification::Unknown => panic!("expected Bob"),
        }
    }

    #[test]
    fn test_nothing_within_tolerance() {
        let snap = snapshot(&[("Alice", vec![1.0, 0.0])]);
        let cmp = EuclideanComparator { tolerance: 0.1 };
        assert_eq!(identify(&cmp, &snap, &Encoding::new(vec![0.0, 1.0])), Identification::Unknown);
    }

    #[test]
    fn test_closest_without_flag_is_unknown() {
        // Another reference is flagged, but not the closest one.
        let snap = snapshot(&[("Alice", vec![0.0]), ("Bob", vec![0.0])]);
        let cmp = Canned(Comparison { distances: vec![0.30, 0.31], matches: vec![false, true] });
        assert_eq!(identify(&cmp, &snap, &Encoding::new(vec![0.0])), Identification::Unknown);
    }

    #[test]
    fn test_flag_on_closest_is_known() {
        let snap = snapshot(&[("Alice", vec![0.0]), ("Bob", vec![0.0])]);
        let cmp = Canned(Comparison { distances: vec![0.9, 0.4], matches: vec![true, true] });
        assert_eq!(identify(&cmp, &snap, &Encoding::new(vec![0.0])).label(), "Bob");
    }
}
