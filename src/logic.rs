//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Grading a free-text answer with service defaults + per-request overrides
//!   - The key-word coverage check
//!   - Write-mode submissions (grade a card answer, then record progress)
//!   - Explaining a wrong answer (AI when available, local fallback otherwise)

use tracing::{error, debug, info, instrument};

use crate::error::{AppError, Result};
use crate::grading::{contains_key_words, grade, GradingOptions, GradingOverrides, GradingResult};
use crate::protocol::{GradingRequest, WriteOut};
use crate::state::AppState;

/// Service defaults merged with request overrides, rejecting values the grader can't use.
pub fn effective_options(state: &AppState, overrides: Option<&GradingOverrides>) -> Result<GradingOptions> {
  let base = state.grading.options();
  let opts = overrides.map(|o| o.apply(base)).unwrap_or(base);
  if !(0.0..=1.0).contains(&opts.min_similarity) {
    return Err(AppError::BadRequest(format!("minSimilarity must be within [0, 1], got {}", opts.min_similarity)));
  }
  Ok(opts)
}

#[instrument(level = "info", skip(state, req), fields(input_len = req.user_input.len(), answer_len = req.correct_answer.len()))]
pub fn grade_request(state: &AppState, req: &GradingRequest) -> Result<GradingResult> {
  let opts = effective_options(state, req.options.as_ref())?;
  let result = grade(&req.user_input, &req.correct_answer, &opts);
  debug!(target: "grading", correct = result.is_correct, similarity = result.similarity, strict = opts.strict_mode, "Answer graded");
  Ok(result)
}

pub fn check_key_words(state: &AppState, user_input: &str, correct_answer: &str, min_word_match: Option<f64>) -> Result<bool> {
  let min = min_word_match.unwrap_or(state.grading.key_word_min_match);
  if !(0.0..=1.0).contains(&min) {
    return Err(AppError::BadRequest(format!("minWordMatch must be within [0, 1], got {}", min)));
  }
  Ok(contains_key_words(user_input, correct_answer, min))
}

/// Grade `answer` against the card's definition and record the attempt for `learner`.
#[instrument(level = "info", skip(state, answer, overrides), fields(%card_id, %learner, answer_len = answer.len()))]
pub async fn submit_write_answer(
  state: &AppState,
  learner: &str,
  card_id: &str,
  answer: &str,
  overrides: Option<&GradingOverrides>,
) -> Result<WriteOut> {
  let card = state
    .get_card(card_id)
    .ok_or_else(|| AppError::NotFound(format!("Unknown cardId: {}", card_id)))?;
  let opts = effective_options(state, overrides)?;

  let result = grade(answer, &card.definition, &opts);
  let mastery = state.progress.record(learner, &card.id, result.is_correct, result.similarity).await;
  info!(target: "grading", id = %card.id, correct = result.is_correct, similarity = %format!("{:.2}", result.similarity), mastered = mastery.mastered, "Write answer graded");

  Ok(WriteOut {
    is_correct: result.is_correct,
    similarity: result.similarity,
    feedback: result.feedback,
    expected: card.definition,
    mastery,
  })
}

/// Short explanation of why `answer` misses the card's definition.
#[instrument(level = "info", skip(state, answer), fields(%card_id, answer_len = answer.len()))]
pub async fn explain_answer(state: &AppState, card_id: &str, answer: &str) -> Result<String> {
  let card = state
    .get_card(card_id)
    .ok_or_else(|| AppError::NotFound(format!("Unknown cardId: {}", card_id)))?;

  if let Some(oa) = &state.openai {
    match oa.explain_mistake(&state.prompts, &card.term, &card.definition, answer).await {
      Ok(text) => return Ok(text),
      Err(e) => error!(target: "studyhall_backend", id = %card.id, error = %e, "AI explanation failed; using local feedback."),
    }
  }
  Ok(explain_local(state, &card.definition, answer))
}

// -------- Local fallback --------

fn explain_local(state: &AppState, expected: &str, answer: &str) -> String {
  let result = grade(answer, expected, &state.grading.options());
  if result.is_correct {
    return result.feedback;
  }
  let coverage = if contains_key_words(answer, expected, state.grading.key_word_min_match) {
    "You have the key words; check spelling and word order."
  } else {
    "Key words from the answer are missing."
  };
  format!("{} {} (similarity {:.0}%)", result.feedback, coverage, result.similarity * 100.0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  use crate::config::StudyConfig;
  use crate::progress::InMemoryProgressStore;

  fn state() -> AppState {
    AppState::from_config(StudyConfig::default(), Arc::new(InMemoryProgressStore::new(2)), None)
  }

  #[test]
  fn request_overrides_apply_on_top_of_defaults() {
    let st = state();
    let req = GradingRequest {
      user_input: "Pari".into(),
      correct_answer: "Paris".into(),
      options: Some(GradingOverrides { strict_mode: Some(true), ..Default::default() }),
    };
    let r = grade_request(&st, &req).expect("graded");
    assert!(!r.is_correct);

    let lenient = GradingRequest { options: None, ..req };
    assert!(grade_request(&st, &lenient).expect("graded").is_correct);
  }

  #[test]
  fn out_of_range_similarity_is_rejected() {
    let st = state();
    let bad = GradingOverrides { min_similarity: Some(1.5), ..Default::default() };
    assert!(matches!(effective_options(&st, Some(&bad)), Err(AppError::BadRequest(_))));
    assert!(matches!(check_key_words(&st, "a", "b", Some(-0.1)), Err(AppError::BadRequest(_))));
  }

  #[test]
  fn key_words_default_threshold_comes_from_config() {
    let st = state();
    let input = "the mitochondria is the powerhouse";
    assert!(!check_key_words(&st, input, "mitochondria powerhouse cell", None).expect("ok"));
    assert!(check_key_words(&st, input, "mitochondria powerhouse cell", Some(0.5)).expect("ok"));
  }

  #[tokio::test]
  async fn write_answers_update_mastery() {
    let st = state();
    let first = submit_write_answer(&st, "ana", "geo-1", "paris", None).await.expect("first");
    assert!(first.is_correct);
    assert_eq!(first.expected, "Paris");
    assert!(!first.mastery.mastered);

    let second = submit_write_answer(&st, "ana", "geo-1", "Pariss", None).await.expect("second");
    assert!(second.is_correct);
    assert!(second.mastery.mastered);

    let miss = submit_write_answer(&st, "ana", "geo-1", "Lyon", None).await.expect("miss");
    assert!(!miss.is_correct);
    assert!(miss.feedback.contains("Paris"));
    assert_eq!((miss.mastery.attempts, miss.mastery.streak, miss.mastery.mastered), (3, 0, false));
  }

  #[tokio::test]
  async fn unknown_card_is_not_found() {
    let st = state();
    let err = submit_write_answer(&st, "ana", "nope", "x", None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(st.progress.list("ana").await.is_empty());
  }

  #[tokio::test]
  async fn local_explanation_mentions_key_words() {
    let st = state();
    let text = explain_answer(&st, "geo-3", "Atlantic ocean").await.expect("explained");
    assert!(text.contains("Pacific Ocean"), "{text}");
    assert!(text.contains("Key words"), "{text}");

    let near = explain_answer(&st, "geo-3", "ocean pacific").await.expect("explained");
    assert!(near.contains("You have the key words"), "{near}");

    let ok = explain_answer(&st, "geo-1", "Paris").await.expect("explained");
    assert_eq!(ok, "Perfect!");
  }
}
