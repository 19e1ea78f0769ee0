//! Admin endpoints for questions and choices.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::{DateTime, Utc};
use polls_common::AppResult;
use polls_core::{ChoiceInput, CreateQuestionInput, QuestionSummary, UpdateQuestionInput};
use polls_db::entities::{choice, question};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::AdminUser,
    middleware::AppState,
    response::{self, ApiResponse},
};

const DEFAULT_LIMIT: u64 = 100;
const MAX_LIMIT: u64 = 500;

/// Admin list row.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminQuestionResponse {
    pub id: i32,
    pub text: String,
    pub publish_at: DateTime<Utc>,
    pub close_at: DateTime<Utc>,
    pub is_published: bool,
    pub was_closed: bool,
    pub was_published_recently: bool,
    pub was_closed_recently: bool,
}

impl From<QuestionSummary> for AdminQuestionResponse {
    fn from(summary: QuestionSummary) -> Self {
        Self {
            id: summary.question.id,
            text: summary.question.text,
            publish_at: summary.question.publish_at,
            close_at: summary.question.close_at,
            is_published: summary.is_published,
            was_closed: summary.was_closed,
            was_published_recently: summary.was_published_recently,
            was_closed_recently: summary.was_closed_recently,
        }
    }
}

/// Question as stored.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminQuestionDetail {
    pub id: i32,
    pub text: String,
    pub publish_at: DateTime<Utc>,
    pub close_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<AdminChoiceResponse>>,
}

impl From<question::Model> for AdminQuestionDetail {
    fn from(question: question::Model) -> Self {
        Self {
            id: question.id,
            text: question.text,
            publish_at: question.publish_at,
            close_at: question.close_at,
            choices: None,
        }
    }
}

/// Choice as stored.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminChoiceResponse {
    pub id: i32,
    pub question_id: i32,
    pub text: String,
    pub votes: i32,
}

impl From<choice::Model> for AdminChoiceResponse {
    fn from(choice: choice::Model) -> Self {
        Self {
            id: choice.id,
            question_id: choice.question_id,
            text: choice.text,
            votes: choice.vote_count,
        }
    }
}

/// List query.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Case-insensitive text search.
    pub q: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// List questions with their window flags.
async fn list_questions(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<AdminQuestionResponse>>> {
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let summaries = state
        .admin_service
        .list_questions(
            query.q.as_deref(),
            limit,
            query.offset.unwrap_or(0),
            Utc::now(),
        )
        .await?;

    Ok(ApiResponse::ok(
        summaries.into_iter().map(Into::into).collect(),
    ))
}

/// Create a question with its choices.
async fn create_question(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Json(input): Json<CreateQuestionInput>,
) -> AppResult<ApiResponse<AdminQuestionDetail>> {
    let (question, choices) = state
        .admin_service
        .create_question(input, Utc::now())
        .await?;

    let mut detail = AdminQuestionDetail::from(question);
    detail.choices = Some(choices.into_iter().map(Into::into).collect());
    Ok(ApiResponse::ok(detail))
}

/// Update a question.
async fn update_question(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<UpdateQuestionInput>,
) -> AppResult<ApiResponse<AdminQuestionDetail>> {
    let question = state
        .admin_service
        .update_question(id, input, Utc::now())
        .await?;

    Ok(ApiResponse::ok(question.into()))
}

/// Delete a question.
async fn delete_question(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    state.admin_service.delete_question(id).await?;
    Ok(response::no_content())
}

/// Add a choice to a question.
async fn add_choice(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(question_id): Path<i32>,
    Json(input): Json<ChoiceInput>,
) -> AppResult<ApiResponse<AdminChoiceResponse>> {
    let choice = state.admin_service.add_choice(question_id, input).await?;
    Ok(ApiResponse::ok(choice.into()))
}

/// Rename a choice.
async fn rename_choice(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<ChoiceInput>,
) -> AppResult<ApiResponse<AdminChoiceResponse>> {
    let choice = state.admin_service.rename_choice(id, input).await?;
    Ok(ApiResponse::ok(choice.into()))
}

/// Delete a choice.
async fn delete_choice(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    state.admin_service.delete_choice(id).await?;
    Ok(response::no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/questions", get(list_questions).post(create_question))
        .route(
            "/questions/{id}",
            patch(update_question).delete(delete_question),
        )
        .route("/questions/{id}/choices", post(add_choice))
        .route("/choices/{id}", patch(rename_choice).delete(delete_choice))
}
