//! Poll endpoints.

use axum::{
    Json, Router,
    extract::{Path, State, rejection::JsonRejection},
    response::Redirect,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use polls_common::AppResult;
use polls_core::VotingWindow;
use polls_db::entities::{choice, question};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    API_PREFIX,
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Question response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    /// Database id.
    pub id: i32,
    /// Display text.
    pub text: String,
    /// Visible from this instant.
    pub publish_at: DateTime<Utc>,
    /// Voting closes at this instant.
    pub close_at: DateTime<Utc>,
    /// Open for voting at response time.
    pub can_vote: bool,
}

impl QuestionResponse {
    fn at(question: question::Model, now: DateTime<Utc>) -> Self {
        let can_vote = VotingWindow::from(&question).can_vote(now);
        Self {
            id: question.id,
            text: question.text,
            publish_at: question.publish_at,
            close_at: question.close_at,
            can_vote,
        }
    }
}

/// Choice response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceResponse {
    /// Database id.
    pub id: i32,
    /// Display text.
    pub text: String,
}

impl From<choice::Model> for ChoiceResponse {
    fn from(choice: choice::Model) -> Self {
        Self {
            id: choice.id,
            text: choice.text,
        }
    }
}

/// Index response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollListResponse {
    /// Signed-in username, if any.
    pub username: Option<String>,
    /// Published questions, newest first.
    pub questions: Vec<QuestionResponse>,
}

/// List visible questions, newest first.
async fn list_polls(
    MaybeAuthUser(maybe_user): MaybeAuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<PollListResponse>> {
    let now = Utc::now();
    let questions = state.voting_service.list_visible(now).await?;

    Ok(ApiResponse::ok(PollListResponse {
        username: maybe_user.map(|u| u.username),
        questions: questions
            .into_iter()
            .map(|q| QuestionResponse::at(q, now))
            .collect(),
    }))
}

/// Detail response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollDetailResponse {
    /// The question itself.
    pub question: QuestionResponse,
    /// Choices in insertion order.
    pub choices: Vec<ChoiceResponse>,
    /// Choice id the caller currently votes for.
    pub current_choice: Option<i32>,
    /// Human-readable summary of the caller's vote.
    pub voted_status: String,
}

/// Show a votable question with the caller's current vote.
async fn show_poll(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<PollDetailResponse>> {
    let now = Utc::now();
    let question = state.voting_service.get_votable_question(id, now).await?;
    let choices = state.voting_service.choices(question.id).await?;
    let current = state
        .voting_service
        .current_choice(&question, Some(&user.id))
        .await?;
    let voted_status = state
        .voting_service
        .voted_status(&question, &user.username, Some(&user.id))
        .await?;

    Ok(ApiResponse::ok(PollDetailResponse {
        question: QuestionResponse::at(question, now),
        choices: choices.into_iter().map(ChoiceResponse::from).collect(),
        current_choice: current.map(|c| c.id),
        voted_status,
    }))
}

/// Vote request.
#[derive(Debug, Default, Deserialize)]
pub struct VoteRequest {
    /// Selected choice id.
    #[serde(default)]
    pub choice: Option<i32>,
}

/// Record the caller's vote and send them to the results.
///
/// A body that is missing or does not parse counts as no selection.
async fn vote(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> AppResult<Redirect> {
    let choice = match payload {
        Ok(Json(req)) => req.choice,
        Err(rejection) => {
            debug!(question_id = id, error = %rejection, "Unreadable vote body");
            None
        }
    };

    let question = state
        .voting_service
        .cast_vote(id, choice, Some(&user.id), Utc::now())
        .await?;

    Ok(Redirect::to(&results_url(question.id)))
}

/// Result row.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceResultResponse {
    /// Database id.
    pub id: i32,
    /// Display text.
    pub text: String,
    /// Recounted votes for this choice.
    pub votes: i32,
}

/// Results response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollResultsResponse {
    /// The question itself.
    pub question: QuestionResponse,
    /// Choices in insertion order.
    pub choices: Vec<ChoiceResultResponse>,
    /// Sum over all choices.
    pub total_votes: i64,
}

/// Show a question's counts.
async fn results(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<PollResultsResponse>> {
    let results = state.voting_service.results(id).await?;

    Ok(ApiResponse::ok(PollResultsResponse {
        question: QuestionResponse::at(results.question, Utc::now()),
        choices: results
            .choices
            .into_iter()
            .map(|c| ChoiceResultResponse {
                id: c.id,
                text: c.text,
                votes: c.vote_count,
            })
            .collect(),
        total_votes: results.total_votes,
    }))
}

fn results_url(question_id: i32) -> String {
    format!("{API_PREFIX}/polls/{question_id}/results")
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_polls))
        .route("/{id}", get(show_poll))
        .route("/{id}/vote", post(vote))
        .route("/{id}/results", get(results))
}
