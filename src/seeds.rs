//! Seed data: a small built-in deck so the app is useful without external config.

use crate::domain::{CardSource, Flashcard};

fn seed(id: &str, deck: &str, term: &str, definition: &str) -> Flashcard {
  Flashcard {
    id: id.into(),
    deck: deck.into(),
    term: term.into(),
    definition: definition.into(),
    source: CardSource::Seed,
  }
}

/// Minimal set of built-in cards, grouped in a few decks.
pub fn seed_cards() -> Vec<Flashcard> {
  vec![
    seed("geo-1", "geography", "Capital of France", "Paris"),
    seed("geo-2", "geography", "Longest river in Africa", "The Nile"),
    seed("geo-3", "geography", "Largest ocean on Earth", "Pacific Ocean"),
    seed("bio-1", "biology", "Powerhouse of the cell", "Mitochondria"),
    seed("bio-2", "biology", "Process plants use to turn light into chemical energy", "Photosynthesis"),
    seed("bio-3", "biology", "Molecule that carries genetic information", "DNA (deoxyribonucleic acid)"),
    seed("chem-1", "chemistry", "Chemical symbol for gold", "Au"),
    seed("chem-2", "chemistry", "pH of pure water at 25 °C", "7"),
  ]
}
