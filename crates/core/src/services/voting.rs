//! Voting service.
//!
//! Listing, vote recording and the cached per-choice counts. The publish
//! window is checked by [`VotingService::get_votable_question`] and
//! [`VotingService::cast_vote`]; [`VotingService::record_vote`] assumes the
//! caller already did so.

use chrono::{DateTime, Utc};
use polls_common::{AppError, AppResult};
use polls_db::{
    entities::{choice, question},
    repositories::{ChoiceRepository, QuestionRepository, VoteRepository},
};
use tracing::{debug, info};

use crate::lifecycle::VotingWindow;

/// Message shown when a vote names no choice of the question.
pub const NO_CHOICE_SELECTED: &str = "You didn't select a choice.";

/// Voting service for business logic.
#[derive(Clone)]
pub struct VotingService {
    question_repo: QuestionRepository,
    choice_repo: ChoiceRepository,
    vote_repo: VoteRepository,
}

/// A question with its choices and their counts.
#[derive(Debug, Clone)]
pub struct PollResults {
    /// The question being reported.
    pub question: question::Model,
    /// Choices in insertion order, counts freshly read.
    pub choices: Vec<choice::Model>,
    /// Sum of the choice counts.
    pub total_votes: i64,
}

impl VotingService {
    /// Create a new voting service.
    #[must_use]
    pub const fn new(
        question_repo: QuestionRepository,
        choice_repo: ChoiceRepository,
        vote_repo: VoteRepository,
    ) -> Self {
        Self {
            question_repo,
            choice_repo,
            vote_repo,
        }
    }

    /// Questions visible at `now`, most recently published first.
    pub async fn list_visible(&self, now: DateTime<Utc>) -> AppResult<Vec<question::Model>> {
        self.question_repo.find_published(now).await
    }

    /// Get a question by ID.
    pub async fn get_question(&self, id: i32) -> AppResult<question::Model> {
        self.question_repo.get_by_id(id).await
    }

    /// Get a question that is open for voting at `now`.
    pub async fn get_votable_question(
        &self,
        id: i32,
        now: DateTime<Utc>,
    ) -> AppResult<question::Model> {
        let question = self.question_repo.get_by_id(id).await?;

        if !VotingWindow::from(&question).can_vote(now) {
            debug!(question_id = id, "Question outside its voting window");
            return Err(AppError::NotVotable(format!(
                "Poll: \"{}\" is no longer published.",
                question.text
            )));
        }

        Ok(question)
    }

    /// Choices of a question in insertion order.
    pub async fn choices(&self, question_id: i32) -> AppResult<Vec<choice::Model>> {
        self.choice_repo.find_by_question(question_id).await
    }

    /// Record `voter`'s vote for `choice`, replacing any earlier vote of
    /// theirs on this question. `None` records an anonymous vote.
    ///
    /// Counts are stale until [`Self::recompute_counts`] runs.
    pub async fn record_vote(
        &self,
        question: &question::Model,
        choice: &choice::Model,
        voter: Option<&str>,
    ) -> AppResult<()> {
        if choice.question_id != question.id {
            return Err(AppError::InvalidSelection(NO_CHOICE_SELECTED.to_string()));
        }

        let vote = self
            .vote_repo
            .upsert(question.id, choice.id, voter)
            .await?;

        info!(
            question_id = question.id,
            choice_id = choice.id,
            vote_id = vote.id,
            voter = voter.unwrap_or("anonymous"),
            "Vote recorded"
        );

        Ok(())
    }

    /// Set every choice's `vote_count` to the number of votes pointing at it.
    pub async fn recompute_counts(&self, question: &question::Model) -> AppResult<()> {
        let choices = self.choice_repo.find_by_question(question.id).await?;

        for choice in choices {
            let count = self.vote_repo.count_by_choice(choice.id).await?;
            let count = i32::try_from(count)
                .map_err(|_| AppError::Internal(format!("Vote count overflow: {count}")))?;

            if choice.vote_count != count {
                self.choice_repo.set_vote_count(choice.id, count).await?;
            }
        }

        debug!(question_id = question.id, "Vote counts recomputed");
        Ok(())
    }

    /// The choice `voter` currently has recorded on `question`, if any.
    pub async fn current_choice(
        &self,
        question: &question::Model,
        voter: Option<&str>,
    ) -> AppResult<Option<choice::Model>> {
        let Some(voter) = voter else {
            return Ok(None);
        };

        match self
            .vote_repo
            .find_by_question_and_voter(question.id, voter)
            .await?
        {
            Some(vote) => self.choice_repo.find_by_id(vote.choice_id).await,
            None => Ok(None),
        }
    }

    /// One-line description of `username`'s vote on `question`.
    pub async fn voted_status(
        &self,
        question: &question::Model,
        username: &str,
        voter: Option<&str>,
    ) -> AppResult<String> {
        Ok(match self.current_choice(question, voter).await? {
            Some(choice) => format!("{username} have voted for {}", choice.text),
            None => format!("{username} have never voted for this question before"),
        })
    }

    /// Handle a vote submission: window check, selection check, record and
    /// recount.
    pub async fn cast_vote(
        &self,
        question_id: i32,
        choice_id: Option<i32>,
        voter: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<question::Model> {
        let question = self.get_votable_question(question_id, now).await?;

        let choice = match choice_id {
            Some(choice_id) => {
                self.choice_repo
                    .find_in_question(question.id, choice_id)
                    .await?
            }
            None => None,
        }
        .ok_or_else(|| AppError::InvalidSelection(NO_CHOICE_SELECTED.to_string()))?;

        self.record_vote(&question, &choice, voter).await?;
        self.recompute_counts(&question).await?;

        Ok(question)
    }

    /// A question's choices with their counts.
    pub async fn results(&self, question_id: i32) -> AppResult<PollResults> {
        let question = self.question_repo.get_by_id(question_id).await?;
        let choices = self.choice_repo.find_by_question(question.id).await?;
        let total_votes = choices.iter().map(|c| i64::from(c.vote_count)).sum();

        Ok(PollResults {
            question,
            choices,
            total_votes,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase};
    use std::sync::Arc;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn create_test_question(id: i32, publish_days: i64, close_days: i64) -> question::Model {
        question::Model {
            id,
            text: "Best pet?".to_string(),
            publish_at: now() + Duration::days(publish_days),
            close_at: now() + Duration::days(close_days),
            created_at: now(),
            updated_at: None,
        }
    }

    fn create_test_choice(id: i32, question_id: i32, text: &str) -> choice::Model {
        choice::Model {
            id,
            question_id,
            text: text.to_string(),
            vote_count: 0,
        }
    }

    fn service(db: DatabaseConnection) -> VotingService {
        let db = Arc::new(db);
        VotingService::new(
            QuestionRepository::new(db.clone()),
            ChoiceRepository::new(db.clone()),
            VoteRepository::new(db),
        )
    }

    #[tokio::test]
    async fn test_closed_question_is_not_votable() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_question(1, -10, -1)]])
            .into_connection();

        let result = service(db).get_votable_question(1, now()).await;

        match result {
            Err(AppError::NotVotable(msg)) => {
                assert_eq!(msg, "Poll: \"Best pet?\" is no longer published.");
            }
            other => panic!("expected NotVotable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_record_vote_rejects_foreign_choice() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let question = create_test_question(1, -1, 1);
        let foreign = create_test_choice(9, 2, "elsewhere");

        let result = service(db).record_vote(&question, &foreign, Some("u1")).await;

        assert!(matches!(result, Err(AppError::InvalidSelection(_))));
    }

    #[tokio::test]
    async fn test_current_choice_without_voter_is_absent() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let question = create_test_question(1, -1, 1);

        let choice = service(db).current_choice(&question, None).await.unwrap();

        assert!(choice.is_none());
    }

    #[tokio::test]
    async fn test_cast_vote_without_choice() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_test_question(1, -1, 1)]])
            .into_connection();

        let result = service(db).cast_vote(1, None, Some("u1"), now()).await;

        match result {
            Err(AppError::InvalidSelection(msg)) => assert_eq!(msg, NO_CHOICE_SELECTED),
            other => panic!("expected InvalidSelection, got {other:?}"),
        }
    }
}
