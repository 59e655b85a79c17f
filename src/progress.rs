//! Study progress: per-learner, per-card mastery behind an injected store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::domain::Mastery;

/// Repository for learner progress. The service only talks to this trait.
#[async_trait]
pub trait ProgressStore: Send + Sync {
  /// Record one graded attempt and return the updated mastery.
  async fn record(&self, learner: &str, card_id: &str, is_correct: bool, similarity: f64) -> Mastery;
  async fn get(&self, learner: &str, card_id: &str) -> Option<Mastery>;
  /// All mastery entries of a learner, sorted by card id.
  async fn list(&self, learner: &str) -> Vec<Mastery>;
  /// Forget a learner's progress; returns how many entries were removed.
  async fn reset(&self, learner: &str) -> usize;
}

pub struct InMemoryProgressStore {
  mastery_streak: u32,
  by_learner: RwLock<HashMap<String, HashMap<String, Mastery>>>,
}

impl InMemoryProgressStore {
  pub fn new(mastery_streak: u32) -> Self {
    Self { mastery_streak, by_learner: RwLock::new(HashMap::new()) }
  }
}

#[async_trait]
impl ProgressStore for InMemoryProgressStore {
  #[instrument(level = "debug", skip(self), fields(%learner, %card_id))]
  async fn record(&self, learner: &str, card_id: &str, is_correct: bool, similarity: f64) -> Mastery {
    let mut by_learner = self.by_learner.write().await;
    let m = by_learner
      .entry(learner.to_string())
      .or_default()
      .entry(card_id.to_string())
      .or_insert_with(|| Mastery::new(card_id));
    m.apply(is_correct, similarity, self.mastery_streak);
    debug!(target: "progress", attempts = m.attempts, streak = m.streak, mastered = m.mastered, "Progress recorded");
    m.clone()
  }

  async fn get(&self, learner: &str, card_id: &str) -> Option<Mastery> {
    let by_learner = self.by_learner.read().await;
    by_learner.get(learner).and_then(|cards| cards.get(card_id)).cloned()
  }

  async fn list(&self, learner: &str) -> Vec<Mastery> {
    let by_learner = self.by_learner.read().await;
    let mut out: Vec<Mastery> = by_learner
      .get(learner)
      .map(|cards| cards.values().cloned().collect())
      .unwrap_or_default();
    out.sort_by(|a, b| a.card_id.cmp(&b.card_id));
    out
  }

  #[instrument(level = "debug", skip(self), fields(%learner))]
  async fn reset(&self, learner: &str) -> usize {
    let mut by_learner = self.by_learner.write().await;
    by_learner.remove(learner).map(|cards| cards.len()).unwrap_or(0)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn records_are_kept_per_learner() {
    let store = InMemoryProgressStore::new(2);
    store.record("ana", "geo-1", true, 1.0).await;
    let m = store.record("ana", "geo-1", true, 0.9).await;
    assert!(m.mastered);
    store.record("ben", "geo-1", false, 0.2).await;

    assert_eq!(store.get("ana", "geo-1").await.map(|m| m.attempts), Some(2));
    assert_eq!(store.get("ben", "geo-1").await.map(|m| m.mastered), Some(false));
    assert!(store.get("cy", "geo-1").await.is_none());
  }

  #[tokio::test]
  async fn list_is_sorted_and_reset_clears() {
    let store = InMemoryProgressStore::new(1);
    store.record("ana", "geo-2", true, 1.0).await;
    store.record("ana", "bio-1", false, 0.1).await;
    store.record("ana", "chem-1", true, 1.0).await;

    let ids: Vec<String> = store.list("ana").await.into_iter().map(|m| m.card_id).collect();
    assert_eq!(ids, vec!["bio-1", "chem-1", "geo-2"]);

    assert_eq!(store.reset("ana").await, 3);
    assert!(store.list("ana").await.is_empty());
    assert_eq!(store.reset("ana").await, 0);
  }
}
