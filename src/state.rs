//! Application state: card stores, grading defaults, progress store, and the optional AI client.
//!
//! This module owns:
//!   - flashcards (by id, by deck in insertion order)
//!   - the last card served per (learner, deck), to avoid immediate repeats
//!   - the progress store (injected, in-memory by default)
//!   - grading defaults and prompts (from TOML or defaults)
//!
//! Card selection prefers cards the learner has not mastered yet.

use std::{collections::HashMap, sync::Arc};

use rand::seq::SliceRandom;
use tokio::sync::RwLock;
use tracing::{error, info, instrument, debug};
use uuid::Uuid;

use crate::config::{load_study_config_from_env, GradingConfig, Prompts, StudyConfig};
use crate::domain::{CardSource, Flashcard};
use crate::openai::OpenAI;
use crate::progress::{InMemoryProgressStore, ProgressStore};
use crate::seeds::seed_cards;

#[derive(Clone)]
pub struct AppState {
    pub by_id: Arc<HashMap<String, Flashcard>>,
    pub by_deck: Arc<HashMap<String, Vec<String>>>,
    pub last_served: Arc<RwLock<HashMap<(String, String), String>>>,
    pub progress: Arc<dyn ProgressStore>,
    pub openai: Option<OpenAI>,
    pub grading: GradingConfig,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from env: load config, index cards, init the AI client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_study_config_from_env().unwrap_or_default();

        let openai = OpenAI::from_env();
        if let Some(oa) = &openai {
            info!(target: "studyhall_backend", base_url = %oa.base_url, model = %oa.model, "AI explanations enabled.");
        } else {
            info!(target: "studyhall_backend", "AI explanations disabled (no OPENAI_API_KEY). Using local feedback.");
        }

        let progress = Arc::new(InMemoryProgressStore::new(cfg.study.mastery_streak));
        Self::from_config(cfg, progress, openai)
    }

    /// Build state from an already-loaded config and an injected progress store.
    pub fn from_config(cfg: StudyConfig, progress: Arc<dyn ProgressStore>, openai: Option<OpenAI>) -> Self {
        let mut id_map = HashMap::<String, Flashcard>::new();
        let mut deck_map = HashMap::<String, Vec<String>>::new();

        // Config-bank cards first.
        for cc in &cfg.cards {
            let id = cc.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
            if cc.term.trim().is_empty() || cc.definition.trim().is_empty() {
                error!(target: "studyhall_backend", %id, deck = %cc.deck, "Skipping bank card: missing term or definition.");
                continue;
            }
            if id_map.contains_key(&id) {
                error!(target: "studyhall_backend", %id, "Skipping bank card: duplicate id.");
                continue;
            }
            deck_map.entry(cc.deck.clone()).or_default().push(id.clone());
            id_map.insert(id.clone(), Flashcard {
                id,
                deck: cc.deck.clone(),
                term: cc.term.clone(),
                definition: cc.definition.clone(),
                source: CardSource::LocalBank,
            });
        }

        // Built-in seeds never overwrite bank ids.
        for c in seed_cards() {
            if id_map.contains_key(&c.id) {
                continue;
            }
            deck_map.entry(c.deck.clone()).or_default().push(c.id.clone());
            id_map.insert(c.id.clone(), c);
        }

        for (deck, ids) in &deck_map {
            info!(target: "studyhall_backend", %deck, cards = ids.len(), "Startup deck inventory");
        }

        Self {
            by_id: Arc::new(id_map),
            by_deck: Arc::new(deck_map),
            last_served: Arc::new(RwLock::new(HashMap::new())),
            progress,
            openai,
            grading: cfg.grading,
            prompts: cfg.prompts,
        }
    }

    /// Read-only access to a card by id.
    pub fn get_card(&self, id: &str) -> Option<Flashcard> {
        self.by_id.get(id).cloned()
    }

    /// Deck names with their card counts, sorted by name.
    pub fn decks(&self) -> Vec<(String, usize)> {
        let mut out: Vec<(String, usize)> = self
            .by_deck
            .iter()
            .map(|(deck, ids)| (deck.clone(), ids.len()))
            .collect();
        out.sort();
        out
    }

    /// Selection policy:
    /// pick at random among the learner's unmastered cards of `deck` (or all
    /// cards once everything is mastered), avoiding the card served last.
    #[instrument(level = "info", skip(self), fields(%deck, %learner))]
    pub async fn choose_card(&self, deck: &str, learner: &str) -> Option<Flashcard> {
        let ids = self.by_deck.get(deck)?;
        if ids.is_empty() {
            return None;
        }

        let mut unmastered = Vec::with_capacity(ids.len());
        for id in ids {
            let mastered = self
                .progress
                .get(learner, id)
                .await
                .map(|m| m.mastered)
                .unwrap_or(false);
            if !mastered {
                unmastered.push(id.clone());
            }
        }
        let pool: Vec<String> = if unmastered.is_empty() { ids.clone() } else { unmastered };

        // One write guard for read-filter-insert, so concurrent picks see each other.
        let key = (learner.to_string(), deck.to_string());
        let chosen_id = {
            let mut last_served = self.last_served.write().await;
            let last = last_served.get(&key);
            let candidates: Vec<&String> = pool
                .iter()
                .filter(|id| pool.len() == 1 || last != Some(*id))
                .collect();
            let chosen_id = candidates.choose(&mut rand::thread_rng()).map(|id| (*id).clone())?;
            last_served.insert(key, chosen_id.clone());
            chosen_id
        };
        debug!(target: "studyhall_backend", chosen = %chosen_id, pool = pool.len(), "Card chosen");
        self.get_card(&chosen_id)
    }
}
