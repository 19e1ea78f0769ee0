//! Choice repository.

use std::sync::Arc;

use polls_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    sea_query::Expr,
};

use crate::entities::{Choice, choice};

/// Choice repository for database operations.
#[derive(Clone)]
pub struct ChoiceRepository {
    db: Arc<DatabaseConnection>,
}

impl ChoiceRepository {
    /// Create a new choice repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a choice by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<choice::Model>> {
        Choice::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a choice by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i32) -> AppResult<choice::Model> {
        self.find_by_id(id).await?.ok_or(AppError::ChoiceNotFound(id))
    }

    /// Find a choice only if it belongs to the given question.
    pub async fn find_in_question(
        &self,
        question_id: i32,
        choice_id: i32,
    ) -> AppResult<Option<choice::Model>> {
        Choice::find_by_id(choice_id)
            .filter(choice::Column::QuestionId.eq(question_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Choices of a question in insertion order.
    pub async fn find_by_question(&self, question_id: i32) -> AppResult<Vec<choice::Model>> {
        Choice::find()
            .filter(choice::Column::QuestionId.eq(question_id))
            .order_by_asc(choice::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new choice.
    pub async fn create(&self, model: choice::ActiveModel) -> AppResult<choice::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a choice.
    pub async fn update(&self, model: choice::ActiveModel) -> AppResult<choice::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Overwrite the cached vote count (single UPDATE query, no fetch).
    pub async fn set_vote_count(&self, choice_id: i32, count: i32) -> AppResult<()> {
        Choice::update_many()
            .col_expr(choice::Column::VoteCount, Expr::value(count))
            .filter(choice::Column::Id.eq(choice_id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a choice. Votes for it go with it.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = Choice::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::ChoiceNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_choice(id: i32, question_id: i32, text: &str, votes: i32) -> choice::Model {
        choice::Model {
            id,
            question_id,
            text: text.to_string(),
            vote_count: votes,
        }
    }

    #[tokio::test]
    async fn test_find_by_question_returns_choices() {
        let a = create_test_choice(1, 1, "choice_a", 0);
        let b = create_test_choice(2, 1, "choice_b", 3);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[a.clone(), b.clone()]])
                .into_connection(),
        );

        let repo = ChoiceRepository::new(db);
        let results = repo.find_by_question(1).await.unwrap();

        assert_eq!(results, vec![a, b]);
    }

    #[tokio::test]
    async fn test_find_in_question_absent() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<choice::Model>::new()])
                .into_connection(),
        );

        let repo = ChoiceRepository::new(db);
        let result = repo.find_in_question(1, 99).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<choice::Model>::new()])
                .into_connection(),
        );

        let repo = ChoiceRepository::new(db);
        let result = repo.get_by_id(5).await;

        assert!(matches!(result, Err(AppError::ChoiceNotFound(5))));
    }

    #[tokio::test]
    async fn test_set_vote_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = ChoiceRepository::new(db);
        assert!(repo.set_vote_count(1, 2).await.is_ok());
    }
}
