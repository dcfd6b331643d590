use serde::Serialize;

use super::totals::totals;
use crate::model::Snapshot;

/// Progress from the last reached unlock threshold toward the next one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UnlockProgress {
    /// Smallest enabled threshold above lifetime earnings, if any.
    pub next_threshold: Option<u32>,
    /// In `[0, 100]`.
    pub percent: f64,
}

#[must_use]
pub fn unlock_progress(snapshot: &Snapshot, user_id: &str) -> UnlockProgress {
    let earned = totals(snapshot, user_id).earned_total;
    let mut thresholds: Vec<u32> = snapshot
        .rewards_for(user_id)
        .iter()
        .filter(|r| r.enabled)
        .map(|r| r.unlock_at_total)
        .collect();
    thresholds.sort_unstable();
    thresholds.dedup();

    let Some(next) = thresholds
        .iter()
        .copied()
        .find(|t| i64::from(*t) > earned)
    else {
        return UnlockProgress {
            next_threshold: None,
            percent: 100.0,
        };
    };
    let previous = thresholds
        .iter()
        .rev()
        .copied()
        .find(|t| i64::from(*t) <= earned)
        .unwrap_or(0);

    let span = (i64::from(next) - i64::from(previous)).max(1);
    #[allow(clippy::cast_precision_loss)]
    let percent = ((earned - i64::from(previous)) as f64 / span as f64 * 100.0).clamp(0.0, 100.0);
    UnlockProgress {
        next_threshold: Some(next),
        percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::ops::quick_adjust;

    fn earned(points: i64) -> Snapshot {
        let clock = FixedClock::at(0);
        quick_adjust(&Snapshot::default(), &clock, "will", points, "")
            .expect("adjust")
            .state
    }

    #[test]
    fn fresh_user_heads_for_first_nonzero_threshold() {
        let progress = unlock_progress(&Snapshot::default(), "will");
        assert_eq!(progress.next_threshold, Some(10));
        assert!(progress.percent.abs() < f64::EPSILON);
    }

    #[test]
    fn partial_progress_between_thresholds() {
        let progress = unlock_progress(&earned(15), "will");
        assert_eq!(progress.next_threshold, Some(20));
        assert!((progress.percent - 50.0).abs() < 1e-9);
    }

    #[test]
    fn reaching_a_threshold_restarts_at_zero() {
        let progress = unlock_progress(&earned(20), "will");
        assert_eq!(progress.next_threshold, Some(50));
        assert!(progress.percent.abs() < f64::EPSILON);
    }

    #[test]
    fn past_highest_threshold_is_complete() {
        let progress = unlock_progress(&earned(50), "will");
        assert_eq!(progress.next_threshold, None);
        assert!((progress.percent - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn disabled_rewards_do_not_set_thresholds() {
        let rewards = Snapshot::default()
            .rewards_for("will")
            .iter()
            .cloned()
            .map(|mut r| {
                r.enabled = r.unlock_at_total < 50;
                r
            })
            .collect();
        let snapshot = earned(30).with_rewards("will", rewards);
        assert_eq!(unlock_progress(&snapshot, "will").next_threshold, None);
    }
}
