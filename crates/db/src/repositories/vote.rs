//! Vote repository.

use std::sync::Arc;

use chrono::Utc;
use polls_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, Set,
    sea_query::OnConflict,
};

use crate::entities::{Vote, vote};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the current vote of a voter on a question.
    pub async fn find_by_question_and_voter(
        &self,
        question_id: i32,
        voter_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::QuestionId.eq(question_id))
            .filter(vote::Column::VoterId.eq(voter_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a vote, overwriting the voter's previous choice on this question.
    ///
    /// Runs as one `INSERT ... ON CONFLICT (question_id, voter_id) DO UPDATE`
    /// statement, so two concurrent votes by the same voter cannot both
    /// insert. Anonymous votes (`voter_id = None`) never conflict and are
    /// always inserted.
    pub async fn upsert(
        &self,
        question_id: i32,
        choice_id: i32,
        voter_id: Option<&str>,
    ) -> AppResult<vote::Model> {
        let now = Utc::now();
        let model = vote::ActiveModel {
            question_id: Set(question_id),
            choice_id: Set(choice_id),
            voter_id: Set(voter_id.map(str::to_string)),
            created_at: Set(now),
            updated_at: Set(Some(now)),
            ..Default::default()
        };

        Vote::insert(model)
            .on_conflict(
                OnConflict::columns([vote::Column::QuestionId, vote::Column::VoterId])
                    .update_columns([vote::Column::ChoiceId, vote::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_with_returning(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count live votes pointing at a choice.
    pub async fn count_by_choice(&self, choice_id: i32) -> AppResult<u64> {
        Vote::find()
            .filter(vote::Column::ChoiceId.eq(choice_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all votes on a question.
    pub async fn find_by_question(&self, question_id: i32) -> AppResult<Vec<vote::Model>> {
        Vote::find()
            .filter(vote::Column::QuestionId.eq(question_id))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_vote(id: i32, choice_id: i32, voter: Option<&str>) -> vote::Model {
        vote::Model {
            id,
            question_id: 1,
            choice_id,
            voter_id: voter.map(str::to_string),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_question_and_voter_found() {
        let vote = create_test_vote(1, 2, Some("kitty"));

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote.clone()]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let found = repo.find_by_question_and_voter(1, "kitty").await.unwrap();

        assert_eq!(found, Some(vote));
    }

    #[tokio::test]
    async fn test_find_by_question_and_voter_absent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<vote::Model>::new()])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let found = repo.find_by_question_and_voter(1, "dicky").await.unwrap();

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_count_by_choice() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(2))
                }]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let count = repo.count_by_choice(1).await.unwrap();

        assert_eq!(count, 2);
    }
}
