//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; logs carry ids and lengths, never raw answers.

use std::sync::Arc;
use axum::{extract::{State, Query}, Json, response::IntoResponse};
use tracing::{info, instrument};

use crate::error::{AppError, Result};
use crate::grading::GradingResult;
use crate::protocol::*;
use crate::state::AppState;
use crate::logic::*;
use crate::util::learner_or_default;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_get_decks(State(state): State<Arc<AppState>>) -> Json<Vec<DeckOut>> {
  Json(state.decks().into_iter().map(|(deck, cards)| DeckOut { deck, cards }).collect())
}

#[instrument(level = "info", skip(state), fields(deck = %q.deck))]
pub async fn http_get_card(
  State(state): State<Arc<AppState>>,
  Query(q): Query<CardQuery>,
) -> Result<Json<CardOut>> {
  let learner = learner_or_default(q.learner.as_deref());
  let card = state
    .choose_card(&q.deck, &learner)
    .await
    .ok_or_else(|| AppError::NotFound(format!("No cards in deck: {}", q.deck)))?;
  info!(target: "studyhall_backend", deck = %q.deck, id = %card.id, %learner, "HTTP card served");
  Ok(Json(to_out(&card)))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_grade(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GradingRequest>,
) -> Result<Json<GradingResult>> {
  Ok(Json(grade_request(&state, &body)?))
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_post_keywords(
  State(state): State<Arc<AppState>>,
  Json(body): Json<KeywordsIn>,
) -> Result<Json<KeywordsOut>> {
  let matched = check_key_words(&state, &body.user_input, &body.correct_answer, body.min_word_match)?;
  Ok(Json(KeywordsOut { matched }))
}

#[instrument(level = "info", skip(state, body), fields(card_id = %body.card_id, answer_len = body.answer.len()))]
pub async fn http_post_write(
  State(state): State<Arc<AppState>>,
  Json(body): Json<WriteIn>,
) -> Result<Json<WriteOut>> {
  let learner = learner_or_default(body.learner.as_deref());
  let out = submit_write_answer(&state, &learner, &body.card_id, &body.answer, body.options.as_ref()).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(card_id = %body.card_id, answer_len = body.answer.len()))]
pub async fn http_post_explain(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ExplainIn>,
) -> Result<Json<ExplainOut>> {
  let text = explain_answer(&state, &body.card_id, &body.answer).await?;
  Ok(Json(ExplainOut { text }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_progress(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LearnerQuery>,
) -> impl IntoResponse {
  let learner = learner_or_default(q.learner.as_deref());
  Json(state.progress.list(&learner).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_progress(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LearnerQuery>,
) -> impl IntoResponse {
  let learner = learner_or_default(q.learner.as_deref());
  let removed = state.progress.reset(&learner).await;
  info!(target: "studyhall_backend", %learner, removed, "HTTP progress reset");
  Json(ResetOut { removed })
}
