//! Per-move accuracy derived from consecutive WDL evaluations

use shakmaty::Color;

use crate::wdl::Wdl;

/// Probability in `[0, 1]` that `side` scores, counting a draw as half.
#[inline]
pub fn win_probability(wdl: Wdl, side: Color) -> f64 {
    let wdl = match side {
        Color::White => wdl,
        Color::Black => wdl.flipped(),
    };
    (wdl.win as f64 + wdl.draw as f64 * 0.5) / 1000.0
}

/// Scores a move in `[0, 100]` from the mover's win probability before and
/// after it. Any non-losing move is 100; a drop of 0.5 or more is 0.
#[inline]
pub fn move_accuracy(before: f64, after: f64) -> f64 {
    if after >= before {
        100.0
    } else {
        (100.0 * (1.0 - (before - after) * 2.0)).max(0.0)
    }
}

/// Mean of a side's move accuracies, 0 when the side never moved.
pub fn mean(accuracies: &[f64]) -> f64 {
    if accuracies.is_empty() {
        0.0
    } else {
        accuracies.iter().sum::<f64>() / accuracies.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_win_probability_extremes() {
        assert_eq!(win_probability(Wdl::new(1000, 0, 0), Color::White), 1.0);
        assert_eq!(win_probability(Wdl::new(0, 0, 1000), Color::White), 0.0);
        assert_eq!(win_probability(Wdl::new(0, 1000, 0), Color::White), 0.5);
        assert_eq!(win_probability(Wdl::new(0, 1000, 0), Color::Black), 0.5);
        assert_eq!(win_probability(Wdl::new(1000, 0, 0), Color::Black), 0.0);
    }

    #[test]
    fn test_black_is_white_with_swapped_triple() {
        for (w, d) in [(0, 0), (120, 380), (500, 0), (333, 334), (1000, 0), (0, 1000)] {
            let l = 1000 - w - d;
            assert_eq!(
                win_probability(Wdl::new(w, d, l), Color::Black),
                win_probability(Wdl::new(l, d, w), Color::White),
            );
        }
    }

    #[test]
    fn test_unknown_is_almost_even() {
        assert!((win_probability(Wdl::UNKNOWN, Color::White) - 0.5).abs() < EPS);
        assert!((win_probability(Wdl::UNKNOWN, Color::Black) - 0.5).abs() < EPS);
    }

    #[test]
    fn test_no_loss_is_perfect() {
        for p in [0.0, 0.25, 0.5, 0.999, 1.0] {
            assert_eq!(move_accuracy(p, p), 100.0);
        }
        assert_eq!(move_accuracy(0.2, 0.9), 100.0);
    }

    #[test]
    fn test_linear_penalty() {
        assert!((move_accuracy(0.6, 0.5) - 80.0).abs() < EPS);
        assert!((move_accuracy(0.5, 0.25) - 50.0).abs() < EPS);
    }

    #[test]
    fn test_zero_floor() {
        assert_eq!(move_accuracy(0.9, 0.3), 0.0);
        assert_eq!(move_accuracy(1.0, 0.5), 0.0);
        assert_eq!(move_accuracy(1.0, 0.0), 0.0);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[100.0, 50.0]), 75.0);
    }
}
