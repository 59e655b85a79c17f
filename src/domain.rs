//! Domain models used by the backend: flashcards, where they come from, and per-card mastery.

use serde::{Deserialize, Serialize};

/// Where did we get the card from?
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CardSource {
  LocalBank, // from user-provided TOML bank
  Seed,      // built-in seeds
}

/// A flashcard. The Write study mode shows `term` and grades typed answers against `definition`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Flashcard {
  pub id: String,
  pub deck: String,
  pub term: String,
  pub definition: String,
  pub source: CardSource,
}

/// A learner's standing on one card.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mastery {
  pub card_id: String,
  pub attempts: u32,
  pub correct: u32,
  /// Consecutive correct answers; a wrong answer resets it.
  pub streak: u32,
  pub mastered: bool,
  pub last_similarity: f64,
}

impl Mastery {
  pub fn new(card_id: &str) -> Self {
    Self { card_id: card_id.to_string(), ..Default::default() }
  }

  /// Apply one graded attempt. `mastery_streak` is the streak needed to master the card.
  pub fn apply(&mut self, is_correct: bool, similarity: f64, mastery_streak: u32) {
    self.attempts += 1;
    if is_correct {
      self.correct += 1;
      self.streak += 1;
    } else {
      self.streak = 0;
    }
    self.mastered = self.streak >= mastery_streak;
    self.last_similarity = similarity;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn streak_masters_and_a_miss_unmasters() {
    let mut m = Mastery::new("c1");
    m.apply(true, 1.0, 2);
    assert!(!m.mastered);
    m.apply(true, 0.9, 2);
    assert!(m.mastered);
    assert_eq!((m.attempts, m.correct, m.streak), (2, 2, 2));

    m.apply(false, 0.4, 2);
    assert!(!m.mastered);
    assert_eq!((m.attempts, m.correct, m.streak), (3, 2, 0));
    assert_eq!(m.last_similarity, 0.4);
  }
}
