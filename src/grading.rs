//! Free-text answer grading with typo tolerance.
//!
//! `grade` normalizes both strings, then accepts an answer when it is an exact
//! (normalized) match, or close enough by Levenshtein distance / similarity ratio.
//! The distance tolerance widens with the length of the correct answer.
//!
//! Everything here is pure: no state, no I/O, no errors. Every input maps to a
//! well-formed `GradingResult`.

use serde::{Deserialize, Serialize};

pub const DEFAULT_MAX_DISTANCE: usize = 2;
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.85;
pub const DEFAULT_KEY_WORD_MIN_MATCH: f64 = 0.7;

/// Share of the correct answer's length tolerated as edits, in percent.
const SCALED_DISTANCE_PERCENT: usize = 15;

const MINOR_TYPO_SIMILARITY: f64 = 0.95;
const ALMOST_SIMILARITY: f64 = 0.7;

const STRIPPED_PUNCTUATION: &[char] = &['.', ',', '!', '?', ';', ':', '\'', '"', '(', ')', '[', ']', '{', '}'];

/// Tolerances used by `grade`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingOptions {
  pub max_distance: usize,
  pub min_similarity: f64,
  pub strict_mode: bool,
}

impl Default for GradingOptions {
  fn default() -> Self {
    Self {
      max_distance: DEFAULT_MAX_DISTANCE,
      min_similarity: DEFAULT_MIN_SIMILARITY,
      strict_mode: false,
    }
  }
}

/// Per-request overrides; absent fields keep the base options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingOverrides {
  #[serde(default)] pub max_distance: Option<usize>,
  #[serde(default)] pub min_similarity: Option<f64>,
  #[serde(default)] pub strict_mode: Option<bool>,
}

impl GradingOverrides {
  pub fn apply(&self, base: GradingOptions) -> GradingOptions {
    GradingOptions {
      max_distance: self.max_distance.unwrap_or(base.max_distance),
      min_similarity: self.min_similarity.unwrap_or(base.min_similarity),
      strict_mode: self.strict_mode.unwrap_or(base.strict_mode),
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingResult {
  pub is_correct: bool,
  /// Always within `[0, 1]`.
  pub similarity: f64,
  pub feedback: String,
}

/// Lowercase, trim, collapse whitespace runs, then strip answer punctuation.
///
/// Stripping runs last, so "paris !" keeps a trailing space ("paris ").
pub fn normalize_answer(s: &str) -> String {
  let lowered = s.to_lowercase();
  let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
  collapsed.chars().filter(|c| !STRIPPED_PUNCTUATION.contains(c)).collect()
}

/// Classic edit distance (insert/delete/substitute cost 1), over chars.
/// Uses two rolling rows sized by the shorter string.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
  let a_chars: Vec<char> = a.chars().collect();
  let b_chars: Vec<char> = b.chars().collect();
  let (long, short) = if a_chars.len() >= b_chars.len() { (&a_chars, &b_chars) } else { (&b_chars, &a_chars) };

  if short.is_empty() {
    return long.len();
  }

  let mut prev: Vec<usize> = (0..=short.len()).collect();
  let mut curr = vec![0usize; short.len() + 1];

  for (i, lc) in long.iter().enumerate() {
    curr[0] = i + 1;
    for (j, sc) in short.iter().enumerate() {
      let cost = if lc == sc { 0 } else { 1 };
      curr[j + 1] = (prev[j + 1] + 1)
        .min(curr[j] + 1)
        .min(prev[j] + cost);
    }
    std::mem::swap(&mut prev, &mut curr);
  }

  prev[short.len()]
}

/// `1 - distance / max_len`; 1.0 when both strings are empty.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
  let max_len = a.chars().count().max(b.chars().count());
  if max_len == 0 {
    return 1.0;
  }
  let distance = levenshtein_distance(a, b);
  (1.0 - distance as f64 / max_len as f64).clamp(0.0, 1.0)
}

/// Edit budget for a normalized correct answer: the base budget, widened to
/// 15% of its length (floored) for longer answers.
pub fn scaled_max_distance(normalized_correct: &str, max_distance: usize) -> usize {
  let scaled = normalized_correct.chars().count() * SCALED_DISTANCE_PERCENT / 100;
  max_distance.max(scaled)
}

pub fn grade(user_input: &str, correct_answer: &str, options: &GradingOptions) -> GradingResult {
  let user = normalize_answer(user_input);
  let correct = normalize_answer(correct_answer);

  if user.is_empty() {
    return GradingResult { is_correct: false, similarity: 0.0, feedback: "Please enter an answer".into() };
  }
  if user == correct {
    return GradingResult { is_correct: true, similarity: 1.0, feedback: "Perfect!".into() };
  }

  let similarity = similarity_ratio(&user, &correct);
  if options.strict_mode {
    return rejected(similarity, correct_answer);
  }

  let distance = levenshtein_distance(&user, &correct);
  let budget = scaled_max_distance(&correct, options.max_distance);

  if distance <= budget || similarity >= options.min_similarity {
    let feedback = if similarity >= MINOR_TYPO_SIMILARITY { "Correct! (minor typo)" } else { "Correct! (close enough)" };
    GradingResult { is_correct: true, similarity, feedback: feedback.into() }
  } else {
    rejected(similarity, correct_answer)
  }
}

fn rejected(similarity: f64, correct_answer: &str) -> GradingResult {
  let feedback = if similarity >= ALMOST_SIMILARITY {
    format!("Almost! The correct answer was: {}", correct_answer)
  } else {
    format!("Incorrect. The correct answer was: {}", correct_answer)
  };
  GradingResult { is_correct: false, similarity, feedback }
}

/// True iff at least `min_word_match` of the correct answer's significant words
/// (tokens longer than 2 chars) appear verbatim among the user's tokens.
pub fn contains_key_words(user_input: &str, correct_answer: &str, min_word_match: f64) -> bool {
  let user = normalize_answer(user_input);
  let correct = normalize_answer(correct_answer);

  let user_tokens: std::collections::HashSet<&str> = user.split(' ').collect();
  let significant: Vec<&str> = correct.split(' ').filter(|w| w.chars().count() > 2).collect();
  if significant.is_empty() {
    return false;
  }

  let found = significant.iter().filter(|w| user_tokens.contains(*w)).count();
  found as f64 / significant.len() as f64 >= min_word_match
}
