//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::error::AppError;
use crate::protocol::{to_out, ClientWsMessage, ServerWsMessage};
use crate::logic::*;
use crate::state::AppState;
use crate::util::{learner_or_default, DEFAULT_LEARNER};

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "studyhall_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "studyhall_backend", "WebSocket connected");
  let mut learner = DEFAULT_LEARNER.to_string();
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "studyhall_backend", kind = message_kind(&incoming), "WS received");
            handle_client_ws(incoming, &state, &mut learner).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "studyhall_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "studyhall_backend", %learner, "WebSocket disconnected");
}

fn message_kind(msg: &ClientWsMessage) -> &'static str {
  match msg {
    ClientWsMessage::Ping => "ping",
    ClientWsMessage::Hello { .. } => "hello",
    ClientWsMessage::NextCard { .. } => "next_card",
    ClientWsMessage::SubmitAnswer { .. } => "submit_answer",
    ClientWsMessage::Explain { .. } => "explain",
    ClientWsMessage::Grade(_) => "grade",
    ClientWsMessage::Keywords(_) => "keywords",
    ClientWsMessage::ResetProgress => "reset_progress",
  }
}

fn error_reply(e: AppError) -> ServerWsMessage {
  ServerWsMessage::Error { message: e.to_string() }
}

async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, learner: &mut String) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Hello { learner: name } => {
      *learner = learner_or_default(Some(name.as_str()));
      ServerWsMessage::Hello { learner: learner.clone() }
    }

    ClientWsMessage::NextCard { deck } => match state.choose_card(&deck, learner).await {
      Some(card) => {
        info!(target: "studyhall_backend", %deck, id = %card.id, "WS next_card served");
        ServerWsMessage::Card { card: to_out(&card) }
      }
      None => error_reply(AppError::NotFound(format!("No cards in deck: {}", deck))),
    },

    ClientWsMessage::SubmitAnswer { card_id, answer, options } => {
      match submit_write_answer(state, learner, &card_id, &answer, options.as_ref()).await {
        Ok(out) => ServerWsMessage::AnswerResult(out),
        Err(e) => error_reply(e),
      }
    }

    ClientWsMessage::Explain { card_id, answer } => match explain_answer(state, &card_id, &answer).await {
      Ok(text) => ServerWsMessage::Explanation { text },
      Err(e) => error_reply(e),
    },

    ClientWsMessage::Grade(req) => match grade_request(state, &req) {
      Ok(result) => ServerWsMessage::GradeResult(result),
      Err(e) => error_reply(e),
    },

    ClientWsMessage::Keywords(k) => match check_key_words(state, &k.user_input, &k.correct_answer, k.min_word_match) {
      Ok(matched) => ServerWsMessage::KeywordsResult { matched },
      Err(e) => error_reply(e),
    },

    ClientWsMessage::ResetProgress => {
      let removed = state.progress.reset(learner).await;
      ServerWsMessage::ProgressReset { removed }
    }
  }
}
