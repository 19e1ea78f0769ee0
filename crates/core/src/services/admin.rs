//! Poll administration service.

use chrono::{DateTime, Utc};
use polls_common::{AppError, AppResult};
use polls_db::{
    entities::{choice, question},
    repositories::{ChoiceRepository, QuestionRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::lifecycle::VotingWindow;

/// Longest question or choice text accepted.
const MAX_TEXT_LEN: usize = 200;

/// Poll administration service for business logic.
#[derive(Clone)]
pub struct PollAdminService {
    question_repo: QuestionRepository,
    choice_repo: ChoiceRepository,
}

/// Input for creating a question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionInput {
    #[validate(length(min = 1, max = 200))]
    pub text: String,
    pub publish_at: DateTime<Utc>,
    pub close_at: DateTime<Utc>,
    /// Initial choice texts, in display order.
    #[serde(default)]
    pub choices: Vec<String>,
}

/// Input for updating a question. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionInput {
    #[validate(length(min = 1, max = 200))]
    pub text: Option<String>,
    pub publish_at: Option<DateTime<Utc>>,
    pub close_at: Option<DateTime<Utc>>,
}

/// Input for adding or renaming a choice.
#[derive(Debug, Deserialize, Validate)]
pub struct ChoiceInput {
    #[validate(length(min = 1, max = 200))]
    pub text: String,
}

/// One row of the admin question list.
#[derive(Debug, Clone)]
pub struct QuestionSummary {
    pub question: question::Model,
    pub is_published: bool,
    pub was_closed: bool,
    pub was_published_recently: bool,
    pub was_closed_recently: bool,
}

impl QuestionSummary {
    fn at(question: question::Model, now: DateTime<Utc>) -> Self {
        let window = VotingWindow::from(&question);
        Self {
            is_published: window.is_published(now),
            was_closed: window.is_closed(now),
            was_published_recently: window.was_published_recently(now),
            was_closed_recently: window.was_closed_recently(now),
            question,
        }
    }
}

impl PollAdminService {
    /// Create a new admin service.
    #[must_use]
    pub const fn new(question_repo: QuestionRepository, choice_repo: ChoiceRepository) -> Self {
        Self {
            question_repo,
            choice_repo,
        }
    }

    /// List questions, newest first, optionally filtered by text.
    pub async fn list_questions(
        &self,
        query: Option<&str>,
        limit: u64,
        offset: u64,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<QuestionSummary>> {
        let questions = self.question_repo.search(query, limit, offset).await?;
        Ok(questions
            .into_iter()
            .map(|q| QuestionSummary::at(q, now))
            .collect())
    }

    /// Create a question together with its initial choices.
    pub async fn create_question(
        &self,
        input: CreateQuestionInput,
        now: DateTime<Utc>,
    ) -> AppResult<(question::Model, Vec<choice::Model>)> {
        input.validate()?;
        validate_window(input.publish_at, input.close_at)?;
        for text in &input.choices {
            validate_choice_text(text)?;
        }

        let question = self
            .question_repo
            .create(question::ActiveModel {
                text: Set(input.text),
                publish_at: Set(input.publish_at),
                close_at: Set(input.close_at),
                created_at: Set(now),
                updated_at: Set(None),
                ..Default::default()
            })
            .await?;

        let mut choices = Vec::with_capacity(input.choices.len());
        for text in input.choices {
            choices.push(self.insert_choice(question.id, text).await?);
        }

        info!(
            question_id = question.id,
            choices = choices.len(),
            "Question created"
        );

        Ok((question, choices))
    }

    /// Update a question's text or dates.
    pub async fn update_question(
        &self,
        id: i32,
        input: UpdateQuestionInput,
        now: DateTime<Utc>,
    ) -> AppResult<question::Model> {
        input.validate()?;

        let question = self.question_repo.get_by_id(id).await?;
        validate_window(
            input.publish_at.unwrap_or(question.publish_at),
            input.close_at.unwrap_or(question.close_at),
        )?;

        let mut active: question::ActiveModel = question.into();
        if let Some(text) = input.text {
            active.text = Set(text);
        }
        if let Some(publish_at) = input.publish_at {
            active.publish_at = Set(publish_at);
        }
        if let Some(close_at) = input.close_at {
            active.close_at = Set(close_at);
        }
        active.updated_at = Set(Some(now));

        let question = self.question_repo.update(active).await?;
        info!(question_id = id, "Question updated");
        Ok(question)
    }

    /// Delete a question with its choices and votes.
    pub async fn delete_question(&self, id: i32) -> AppResult<()> {
        self.question_repo.delete(id).await?;
        info!(question_id = id, "Question deleted");
        Ok(())
    }

    /// Add a choice to an existing question.
    pub async fn add_choice(&self, question_id: i32, input: ChoiceInput) -> AppResult<choice::Model> {
        input.validate()?;
        let question = self.question_repo.get_by_id(question_id).await?;
        let choice = self.insert_choice(question.id, input.text).await?;
        info!(question_id, choice_id = choice.id, "Choice added");
        Ok(choice)
    }

    /// Rename a choice.
    pub async fn rename_choice(&self, id: i32, input: ChoiceInput) -> AppResult<choice::Model> {
        input.validate()?;
        let choice = self.choice_repo.get_by_id(id).await?;

        let mut active: choice::ActiveModel = choice.into();
        active.text = Set(input.text);
        self.choice_repo.update(active).await
    }

    /// Delete a choice and the votes cast for it.
    pub async fn delete_choice(&self, id: i32) -> AppResult<()> {
        self.choice_repo.delete(id).await?;
        info!(choice_id = id, "Choice deleted");
        Ok(())
    }

    async fn insert_choice(&self, question_id: i32, text: String) -> AppResult<choice::Model> {
        self.choice_repo
            .create(choice::ActiveModel {
                question_id: Set(question_id),
                text: Set(text),
                vote_count: Set(0),
                ..Default::default()
            })
            .await
    }
}

fn validate_window(publish_at: DateTime<Utc>, close_at: DateTime<Utc>) -> AppResult<()> {
    if close_at <= publish_at {
        return Err(AppError::Validation(
            "closeAt must be later than publishAt".to_string(),
        ));
    }
    Ok(())
}

fn validate_choice_text(text: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::Validation(
            "Choice text cannot be empty".to_string(),
        ));
    }
    if text.chars().count() > MAX_TEXT_LEN {
        return Err(AppError::Validation(format!(
            "Choice text is too long (max {MAX_TEXT_LEN} chars)"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn service() -> PollAdminService {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());
        PollAdminService::new(QuestionRepository::new(db.clone()), ChoiceRepository::new(db))
    }

    #[test]
    fn test_validate_window() {
        assert!(validate_window(now(), now() + Duration::seconds(1)).is_ok());
        assert!(matches!(
            validate_window(now(), now()),
            Err(AppError::Validation(_))
        ));
        assert!(validate_window(now(), now() - Duration::days(1)).is_err());
    }

    #[test]
    fn test_validate_choice_text() {
        assert!(validate_choice_text("cat").is_ok());
        assert!(validate_choice_text("   ").is_err());
        assert!(validate_choice_text(&"x".repeat(MAX_TEXT_LEN + 1)).is_err());
    }

    #[test]
    fn test_summary_flags() {
        let question = question::Model {
            id: 1,
            text: "Closed an hour ago".to_string(),
            publish_at: now() - Duration::days(3),
            close_at: now() - Duration::hours(1),
            created_at: now(),
            updated_at: None,
        };

        let summary = QuestionSummary::at(question, now());

        assert!(summary.is_published);
        assert!(summary.was_closed);
        assert!(!summary.was_published_recently);
        assert!(summary.was_closed_recently);
    }

    #[tokio::test]
    async fn test_create_rejects_inverted_window() {
        let input = CreateQuestionInput {
            text: "Backwards?".to_string(),
            publish_at: now(),
            close_at: now() - Duration::days(1),
            choices: vec!["yes".to_string()],
        };

        let result = service().create_question(input, now()).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_rejects_empty_text() {
        let input = CreateQuestionInput {
            text: String::new(),
            publish_at: now(),
            close_at: now() + Duration::days(1),
            choices: vec![],
        };

        let result = service().create_question(input, now()).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
