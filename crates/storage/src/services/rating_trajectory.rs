use crate::dto::rating::RatingTrajectoryEntry;
use crate::error::{DomainError, DomainResult};
use crate::models::RatingHistory;
use crate::store::{ContestPlayerStore, ContestStore, RatingCalculationStore, RatingHistoryStore};

/// A rating history row joined with the contest it was computed for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCheckpoint {
    pub contest_title: String,
    pub rating_after: i32,
    pub rank: i32,
    pub participants: i64,
}

/// Builds the rating trajectory shown on a user's profile.
pub struct RatingTrajectoryBuilder<'a, S> {
    store: &'a S,
    default_rating: i32,
}

impl<'a, S> RatingTrajectoryBuilder<'a, S>
where
    S: RatingHistoryStore + RatingCalculationStore + ContestStore + ContestPlayerStore,
{
    pub fn new(store: &'a S, default_rating: i32) -> Self {
        Self {
            store,
            default_rating,
        }
    }

    /// Most recent contest first, the `initial` entry last.
    ///
    /// Fails with [`DomainError::Integrity`] as soon as one history row points
    /// at a calculation or contest that no longer exists.
    pub async fn build(&self, user_id: i32) -> DomainResult<Vec<RatingTrajectoryEntry>> {
        let mut history = RatingHistoryStore::find_by_user(self.store, user_id).await?;
        history.sort_by_key(|record| record.rating_calculation_id);

        let mut checkpoints = Vec::with_capacity(history.len());
        for record in &history {
            checkpoints.push(self.resolve(record).await?);
        }

        Ok(fold_trajectory(self.default_rating, checkpoints))
    }

    async fn resolve(&self, record: &RatingHistory) -> DomainResult<ResolvedCheckpoint> {
        let calculation =
            RatingCalculationStore::find_by_id(self.store, record.rating_calculation_id)
                .await?
                .ok_or_else(|| {
                    DomainError::Integrity(format!(
                        "rating history of user {} references missing rating calculation {}",
                        record.user_id, record.rating_calculation_id
                    ))
                })?;

        let contest = ContestStore::find_by_id(self.store, calculation.contest_id)
            .await?
            .ok_or_else(|| {
                DomainError::Integrity(format!(
                    "rating calculation {} references missing contest {}",
                    calculation.id, calculation.contest_id
                ))
            })?;

        let participants = ContestPlayerStore::count(self.store, contest.id).await?;

        Ok(ResolvedCheckpoint {
            contest_title: contest.title,
            rating_after: record.rating_after,
            rank: record.rank,
            participants,
        })
    }
}

/// Folds checkpoints in calculation order into a trajectory, then reverses it.
///
/// Deltas are taken against the previous entry before the reversal, so the
/// first real checkpoint is compared to `default_rating`.
pub fn fold_trajectory(
    default_rating: i32,
    checkpoints: impl IntoIterator<Item = ResolvedCheckpoint>,
) -> Vec<RatingTrajectoryEntry> {
    let mut entries = vec![RatingTrajectoryEntry::initial(default_rating)];

    for checkpoint in checkpoints {
        let previous = entries.last().map_or(default_rating, |entry| entry.value);
        entries.push(RatingTrajectoryEntry {
            label: checkpoint.contest_title,
            value: checkpoint.rating_after,
            delta: Some(checkpoint.rating_after.saturating_sub(previous)),
            rank: Some(checkpoint.rank),
            participants: Some(checkpoint.participants),
        });
    }

    entries.reverse();
    entries
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;

    use super::*;
    use crate::dto::rating::INITIAL_LABEL;
    use crate::error::Result;
    use crate::models::{Contest, RatingCalculation};

    #[derive(Default)]
    struct FakeRatingStore {
        history: Vec<RatingHistory>,
        calculations: HashMap<i32, RatingCalculation>,
        contests: HashMap<i32, Contest>,
        players: HashMap<i32, i64>,
    }

    impl FakeRatingStore {
        /// Registers contest `id` rated by calculation `id`.
        fn with_contest(mut self, id: i32, title: &str, players: i64) -> Self {
            self.calculations.insert(id, RatingCalculation { id, contest_id: id });
            self.contests.insert(
                id,
                Contest {
                    id,
                    title: title.to_string(),
                },
            );
            self.players.insert(id, players);
            self
        }

        fn with_result(mut self, user_id: i32, calculation_id: i32, rating: i32, rank: i32) -> Self {
            self.history.push(RatingHistory {
                rating_calculation_id: calculation_id,
                user_id,
                rating_after: rating,
                rank,
            });
            self
        }
    }

    #[async_trait]
    impl RatingHistoryStore for FakeRatingStore {
        async fn find_by_user(&self, user_id: i32) -> Result<Vec<RatingHistory>> {
            Ok(self
                .history
                .iter()
                .filter(|record| record.user_id == user_id)
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl RatingCalculationStore for FakeRatingStore {
        async fn find_by_id(&self, id: i32) -> Result<Option<RatingCalculation>> {
            Ok(self.calculations.get(&id).cloned())
        }
    }

    #[async_trait]
    impl ContestStore for FakeRatingStore {
        async fn find_by_id(&self, id: i32) -> Result<Option<Contest>> {
            Ok(self.contests.get(&id).cloned())
        }
    }

    #[async_trait]
    impl ContestPlayerStore for FakeRatingStore {
        async fn count(&self, contest_id: i32) -> Result<i64> {
            Ok(self.players.get(&contest_id).copied().unwrap_or(0))
        }
    }

    #[tokio::test]
    async fn test_no_history_yields_seed_only() {
        let store = FakeRatingStore::default();
        let trajectory = RatingTrajectoryBuilder::new(&store, 1500)
            .build(7)
            .await
            .unwrap();

        assert_eq!(trajectory, vec![RatingTrajectoryEntry::initial(1500)]);
        assert_eq!(trajectory[0].label, INITIAL_LABEL);
        assert_eq!(trajectory[0].delta, None);
    }

    #[tokio::test]
    async fn test_most_recent_first_with_deltas() {
        let store = FakeRatingStore::default()
            .with_contest(1, "Round 1", 40)
            .with_contest(2, "Round 2", 35)
            .with_result(7, 1, 1540, 3)
            .with_result(7, 2, 1510, 12);

        let trajectory = RatingTrajectoryBuilder::new(&store, 1500)
            .build(7)
            .await
            .unwrap();

        let labels: Vec<&str> = trajectory.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Round 2", "Round 1", INITIAL_LABEL]);

        assert_eq!(trajectory[0].value, 1510);
        assert_eq!(trajectory[0].delta, Some(-30));
        assert_eq!(trajectory[0].rank, Some(12));
        assert_eq!(trajectory[0].participants, Some(35));

        assert_eq!(trajectory[1].delta, Some(40));
        assert_eq!(trajectory[1].participants, Some(40));

        for pair in trajectory.windows(2) {
            assert_eq!(pair[0].delta, Some(pair[0].value - pair[1].value));
        }
    }

    #[tokio::test]
    async fn test_orders_by_calculation_not_insertion() {
        // Contest 9 was rated after contest 3 even though its row came first.
        let store = FakeRatingStore::default()
            .with_contest(3, "Early", 10)
            .with_contest(9, "Backfilled", 10)
            .with_result(1, 9, 1600, 1)
            .with_result(1, 3, 1450, 8);

        let trajectory = RatingTrajectoryBuilder::new(&store, 1500)
            .build(1)
            .await
            .unwrap();

        assert_eq!(trajectory[0].label, "Backfilled");
        assert_eq!(trajectory[0].delta, Some(150));
        assert_eq!(trajectory[1].label, "Early");
        assert_eq!(trajectory[1].delta, Some(-50));
    }

    #[tokio::test]
    async fn test_ignores_other_users() {
        let store = FakeRatingStore::default()
            .with_contest(1, "Round 1", 2)
            .with_result(1, 1, 1520, 1)
            .with_result(2, 1, 1480, 2);

        let trajectory = RatingTrajectoryBuilder::new(&store, 1500)
            .build(2)
            .await
            .unwrap();

        assert_eq!(trajectory.len(), 2);
        assert_eq!(trajectory[0].value, 1480);
    }

    #[tokio::test]
    async fn test_missing_calculation_is_integrity_fault() {
        let store = FakeRatingStore::default()
            .with_contest(1, "Round 1", 2)
            .with_result(1, 1, 1520, 1)
            .with_result(1, 5, 1530, 1);

        let result = RatingTrajectoryBuilder::new(&store, 1500).build(1).await;

        assert!(matches!(result, Err(DomainError::Integrity(_))));
    }

    #[tokio::test]
    async fn test_missing_contest_is_integrity_fault() {
        let mut store = FakeRatingStore::default()
            .with_contest(1, "Round 1", 2)
            .with_result(1, 1, 1520, 1);
        store.contests.clear();

        let result = RatingTrajectoryBuilder::new(&store, 1500).build(1).await;

        assert!(matches!(result, Err(DomainError::Integrity(_))));
    }

    #[test]
    fn test_extreme_ratings_saturate_delta() {
        let checkpoints = vec![
            ResolvedCheckpoint {
                contest_title: "Broken".to_string(),
                rating_after: i32::MIN,
                rank: 1,
                participants: 1,
            },
            ResolvedCheckpoint {
                contest_title: "Recovered".to_string(),
                rating_after: i32::MAX,
                rank: 1,
                participants: 1,
            },
        ];

        let trajectory = fold_trajectory(1500, checkpoints);

        assert_eq!(trajectory[0].delta, Some(i32::MAX));
        assert_eq!(trajectory[1].delta, Some(i32::MIN));
    }

    #[test]
    fn test_fold_without_checkpoints() {
        let trajectory = fold_trajectory(1200, Vec::new());
        assert_eq!(trajectory, vec![RatingTrajectoryEntry::initial(1200)]);
    }
}
