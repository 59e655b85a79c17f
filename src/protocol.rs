//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Field names are camelCase on the wire.

use serde::{Deserialize, Serialize};

use crate::domain::{Flashcard, Mastery};
use crate::grading::{GradingOverrides, GradingResult};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    /// Sets the learner for the rest of the connection.
    Hello {
        learner: String,
    },
    NextCard {
        deck: String,
    },
    SubmitAnswer {
        #[serde(rename = "cardId")]
        card_id: String,
        answer: String,
        #[serde(default)]
        options: Option<GradingOverrides>,
    },
    Explain {
        #[serde(rename = "cardId")]
        card_id: String,
        answer: String,
    },
    Grade(GradingRequest),
    Keywords(KeywordsIn),
    ResetProgress,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Hello {
        learner: String,
    },
    Card {
        card: CardOut,
    },
    AnswerResult(WriteOut),
    Explanation {
        text: String,
    },
    GradeResult(GradingResult),
    KeywordsResult {
        matched: bool,
    },
    ProgressReset {
        removed: usize,
    },
    Error {
        message: String,
    },
}

/// DTO used by both WS and HTTP for card delivery. The definition stays server-side.
#[derive(Debug, Serialize)]
pub struct CardOut {
    pub id: String,
    pub deck: String,
    pub term: String,
}

pub fn to_out(c: &Flashcard) -> CardOut {
    CardOut {
        id: c.id.clone(),
        deck: c.deck.clone(),
        term: c.term.clone(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingRequest {
    pub user_input: String,
    pub correct_answer: String,
    #[serde(default)]
    pub options: Option<GradingOverrides>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordsIn {
    pub user_input: String,
    pub correct_answer: String,
    #[serde(default)]
    pub min_word_match: Option<f64>,
}
#[derive(Serialize)]
pub struct KeywordsOut {
    pub matched: bool,
}

#[derive(Debug, Deserialize)]
pub struct CardQuery {
    pub deck: String,
    #[serde(default)]
    pub learner: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LearnerQuery {
    #[serde(default)]
    pub learner: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteIn {
    pub card_id: String,
    pub answer: String,
    #[serde(default)]
    pub learner: Option<String>,
    #[serde(default)]
    pub options: Option<GradingOverrides>,
}

/// Outcome of a Write-mode submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOut {
    pub is_correct: bool,
    pub similarity: f64,
    pub feedback: String,
    pub expected: String,
    pub mastery: Mastery,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainIn {
    pub card_id: String,
    pub answer: String,
}
#[derive(Serialize)]
pub struct ExplainOut {
    pub text: String,
}

#[derive(Serialize)]
pub struct DeckOut {
    pub deck: String,
    pub cards: usize,
}

#[derive(Serialize)]
pub struct ResetOut {
    pub removed: usize,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ws_messages_parse_by_type_tag() {
        let m: ClientWsMessage = serde_json::from_str(
            r#"{"type":"grade","userInput":"Pari","correctAnswer":"Paris","options":{"strictMode":true}}"#,
        )
        .expect("grade");
        match m {
            ClientWsMessage::Grade(req) => {
                assert_eq!(req.user_input, "Pari");
                assert_eq!(req.options.and_then(|o| o.strict_mode), Some(true));
            }
            other => panic!("unexpected {:?}", other),
        }

        let m: ClientWsMessage = serde_json::from_str(r#"{"type":"submit_answer","cardId":"geo-1","answer":"paris"}"#).expect("submit");
        assert!(matches!(m, ClientWsMessage::SubmitAnswer { options: None, .. }));

        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"reset_progress"}"#).is_ok());
        assert!(serde_json::from_str::<ClientWsMessage>(r#"{"type":"launch_rockets"}"#).is_err());
    }

    #[test]
    fn grade_result_is_tagged_and_flattened() {
        let msg = ServerWsMessage::GradeResult(GradingResult { is_correct: true, similarity: 1.0, feedback: "Perfect!".into() });
        let v = serde_json::to_value(&msg).expect("serialize");
        assert_eq!(v["type"], "grade_result");
        assert_eq!(v["isCorrect"], true);
        assert_eq!(v["feedback"], "Perfect!");
    }
}
