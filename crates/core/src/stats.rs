// crates/core/src/stats.rs
//! Statistics engine: raw sessions in, one [`DomainPerformance`] out.
//!
//! Pure and deterministic. The caller supplies the computation timestamp and
//! the sessions, already filtered to the window. Input order never matters:
//! float reductions run over values sorted into a canonical order, and
//! integer reductions are exact, so any permutation of the same multiset
//! yields bit-identical output.

use chrono::{DateTime, Utc};

use crate::types::{DomainPerformance, GameSession, SummaryKey};

/// Reduce one user's sessions for one domain and window into a summary.
///
/// Zero sessions is a valid input and produces the "computed, empty"
/// summary: counts and sums are zero, `average_accuracy` and `last_played`
/// are `None`.
pub fn compute(
    key: SummaryKey,
    sessions: &[GameSession],
    computed_at: DateTime<Utc>,
) -> DomainPerformance {
    let mut scores: Vec<i64> = sessions.iter().map(|s| s.score).collect();
    scores.sort_unstable();

    let mut accuracies: Vec<f64> = sessions.iter().filter_map(|s| s.accuracy).collect();
    accuracies.sort_unstable_by(f64::total_cmp);

    let total_playtime_seconds = sessions
        .iter()
        .map(|s| s.duration.unwrap_or(0))
        .fold(0i64, i64::saturating_add);

    let last_played = sessions.iter().map(|s| s.played_at).max();

    DomainPerformance {
        user_id: key.user_id,
        domain: key.domain,
        period: key.period,
        total_sessions: scores.len() as i64,
        average_score: mean_of_sorted(&scores),
        median_score: median_of_sorted(&scores),
        best_score: scores.last().copied().unwrap_or(0),
        score_stddev: population_stddev_of_sorted(&scores),
        average_accuracy: mean_f64(&accuracies),
        total_playtime_seconds,
        last_played,
        last_updated: computed_at,
    }
}

/// Arithmetic mean; 0 for an empty slice.
fn mean_of_sorted(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: i128 = values.iter().map(|&v| v as i128).sum();
    sum as f64 / values.len() as f64
}

/// Standard median, averaging the two middle values for even counts.
/// Expects ascending input; 0 for an empty slice.
fn median_of_sorted(values: &[i64]) -> f64 {
    let n = values.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => values[n / 2] as f64,
        _ => (values[n / 2 - 1] as f64 + values[n / 2] as f64) / 2.0,
    }
}

/// Population standard deviation (divide by N); 0 when fewer than two values.
fn population_stddev_of_sorted(values: &[i64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let mean = mean_of_sorted(values);
    let sum_sq: f64 = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum();
    (sum_sq / values.len() as f64).sqrt()
}

/// Mean of already-sorted floats, or `None` when there are none.
fn mean_f64(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    Some(sum / values.len() as f64)
}
