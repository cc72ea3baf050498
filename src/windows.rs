use serde::{Deserialize, Serialize};

use crate::geometry::round2;

/// A maximal run of consecutive frames, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub t0: f64,
    pub t1: f64,
}

impl TimeWindow {
    pub fn duration(&self) -> f64 {
        self.t1 - self.t0
    }
}

/// Collapses frame indices into inclusive `(first, last)` runs of
/// consecutive frames. Input order and duplicates do not matter.
pub fn frame_runs(frames: &[usize]) -> Vec<(usize, usize)> {
    let mut sorted = frames.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut runs: Vec<(usize, usize)> = Vec::new();
    for frame in sorted {
        match runs.last_mut() {
            Some((_, last)) if frame == *last + 1 => *last = frame,
            _ => runs.push((frame, frame)),
        }
    }
    runs
}

/// Sorted, non-overlapping windows covering `frames`, with both ends
/// converted to seconds and rounded to two decimals
pub fn build_windows(frames: &[usize], fps: f64) -> Vec<TimeWindow> {
    frame_runs(frames)
        .into_iter()
        .map(|(first, last)| TimeWindow {
            t0: round2(first as f64 / fps),
            t1: round2(last as f64 / fps),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_two_runs_at_ten_fps() {
        let windows = build_windows(&[10, 11, 12, 20, 21], 10.0);
        assert_eq!(
            windows,
            vec![TimeWindow { t0: 1.0, t1: 1.2 }, TimeWindow { t0: 2.0, t1: 2.1 }]
        );
    }

    #[test]
    fn test_unsorted_with_duplicates() {
        assert_eq!(frame_runs(&[5, 3, 4, 4, 9]), vec![(3, 5), (9, 9)]);
    }

    #[test]
    fn test_single_frame_window_has_no_duration() {
        let windows = build_windows(&[7], 24.0);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].duration(), 0.0);
    }

    #[test]
    fn test_empty() {
        assert!(build_windows(&[], 24.0).is_empty());
    }

    proptest! {
        #[test]
        fn prop_runs_reconstruct_the_input(frames in proptest::collection::vec(0usize..500, 0..120)) {
            let runs = frame_runs(&frames);
            let rebuilt: BTreeSet<usize> = runs.iter().flat_map(|&(a, b)| a..=b).collect();
            let expected: BTreeSet<usize> = frames.iter().copied().collect();
            prop_assert_eq!(rebuilt, expected);

            // minimal: consecutive runs never touch
            for pair in runs.windows(2) {
                prop_assert!(pair[1].0 > pair[0].1 + 1);
            }
        }
    }
}
