use serde::Serialize;

use crate::clock::local_start_of_day_ms;
use crate::model::{EntryKind, LedgerEntry, Snapshot};

/// Lifetime sums for one user. `balance` is always `earned_total - spent_total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub earned_total: i64,
    pub spent_total: i64,
    pub balance: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub today_earned: i64,
    pub today_spent: i64,
}

fn sum_rows<'a>(rows: impl Iterator<Item = &'a LedgerEntry>) -> (i64, i64) {
    rows.fold((0, 0), |(earned, spent), row| match row.kind {
        EntryKind::Earn => (earned + i64::from(row.points), spent),
        EntryKind::Spend => (earned, spent + i64::from(row.points)),
    })
}

#[must_use]
pub fn totals(snapshot: &Snapshot, user_id: &str) -> Totals {
    let (earned_total, spent_total) = sum_rows(snapshot.ledger_for(user_id));
    Totals {
        earned_total,
        spent_total,
        balance: earned_total - spent_total,
    }
}

/// Sums for rows stamped at or after `day_start_ms`.
#[must_use]
pub fn today_summary_at(snapshot: &Snapshot, user_id: &str, day_start_ms: i64) -> DaySummary {
    let (today_earned, today_spent) = sum_rows(
        snapshot
            .ledger_for(user_id)
            .filter(|row| row.timestamp_ms >= day_start_ms),
    );
    DaySummary {
        today_earned,
        today_spent,
    }
}

/// Sums since local midnight of the day containing `now_ms`.
#[must_use]
pub fn today_summary(snapshot: &Snapshot, user_id: &str, now_ms: i64) -> DaySummary {
    today_summary_at(snapshot, user_id, local_start_of_day_ms(now_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock, MS_PER_DAY};
    use crate::ops::quick_adjust;

    #[test]
    fn totals_track_earn_and_spend_per_user() {
        let clock = FixedClock::at(0);
        let mut snapshot = Snapshot::default();
        for (user, amount) in [("will", 10), ("will", -4), ("mom", 3)] {
            snapshot = quick_adjust(&snapshot, &clock, user, amount, "")
                .expect("adjust")
                .state;
        }
        assert_eq!(
            totals(&snapshot, "will"),
            Totals {
                earned_total: 10,
                spent_total: 4,
                balance: 6
            }
        );
        assert_eq!(totals(&snapshot, "mom").balance, 3);
        assert_eq!(totals(&snapshot, "dad"), Totals::default());
    }

    #[test]
    fn today_summary_excludes_earlier_days() {
        let clock = FixedClock::at(10 * MS_PER_DAY);
        let mut snapshot = quick_adjust(&Snapshot::default(), &clock, "will", 5, "")
            .expect("yesterday")
            .state;
        clock.advance(MS_PER_DAY);
        let day_start = clock.now_ms();
        clock.advance(1_000);
        snapshot = quick_adjust(&snapshot, &clock, "will", 2, "").expect("today").state;
        snapshot = quick_adjust(&snapshot, &clock, "will", -1, "").expect("today").state;

        let summary = today_summary_at(&snapshot, "will", day_start);
        assert_eq!(summary.today_earned, 2);
        assert_eq!(summary.today_spent, 1);
        assert_eq!(totals(&snapshot, "will").earned_total, 7);
    }
}
