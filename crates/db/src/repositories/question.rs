//! Question repository.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use polls_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
    sea_query::{Expr, Func},
};

use crate::entities::{Question, question};

/// Question repository for database operations.
#[derive(Clone)]
pub struct QuestionRepository {
    db: Arc<DatabaseConnection>,
}

impl QuestionRepository {
    /// Create a new question repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a question by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<question::Model>> {
        Question::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a question by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i32) -> AppResult<question::Model> {
        self.find_by_id(id)
            .await?
            .ok_or(AppError::QuestionNotFound(id))
    }

    /// Questions published at or before `now`, most recently published first.
    ///
    /// Equal publish times keep insertion order.
    pub async fn find_published(&self, now: DateTime<Utc>) -> AppResult<Vec<question::Model>> {
        Question::find()
            .filter(question::Column::PublishAt.lte(now))
            .order_by_desc(question::Column::PublishAt)
            .order_by_asc(question::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All questions for the admin listing, optionally filtered by a
    /// case-insensitive substring of the text.
    pub async fn search(
        &self,
        query: Option<&str>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<question::Model>> {
        let mut select = Question::find();

        if let Some(query) = query.map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = format!(
                "%{}%",
                query
                    .to_lowercase()
                    .replace('%', "\\%")
                    .replace('_', "\\_")
            );
            select = select
                .filter(Expr::expr(Func::lower(Expr::col(question::Column::Text))).like(pattern));
        }

        select
            .order_by_desc(question::Column::PublishAt)
            .order_by_asc(question::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new question.
    pub async fn create(&self, model: question::ActiveModel) -> AppResult<question::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a question.
    pub async fn update(&self, model: question::ActiveModel) -> AppResult<question::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a question. Choices and votes go with it.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let result = Question::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::QuestionNotFound(id));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_question(id: i32, text: &str, days: i64) -> question::Model {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let publish_at = now + Duration::days(days);
        question::Model {
            id,
            text: text.to_string(),
            publish_at,
            close_at: publish_at + Duration::days(365),
            created_at: now,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_returns_question() {
        let question = create_test_question(1, "What's up?", -1);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question.clone()]])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let found = repo.get_by_id(1).await.unwrap();

        assert_eq!(found, question);
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<question::Model>::new()])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let result = repo.get_by_id(42).await;

        assert!(matches!(result, Err(AppError::QuestionNotFound(42))));
    }

    #[tokio::test]
    async fn test_find_published_orders_newest_first() {
        let recent = create_test_question(2, "Recent", -5);
        let older = create_test_question(1, "Older", -30);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[recent.clone(), older.clone()]])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
        let results = repo.find_published(now).await.unwrap();
        assert_eq!(results, vec![recent, older]);
    }

    #[tokio::test]
    async fn test_delete_missing_question() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = QuestionRepository::new(db);
        let result = repo.delete(7).await;

        assert!(matches!(result, Err(AppError::QuestionNotFound(7))));
    }
}
