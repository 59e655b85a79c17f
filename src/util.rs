//! Small utility helpers used across modules.

/// Learner id used when a request does not name one.
pub const DEFAULT_LEARNER: &str = "anonymous";

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = tpl.to_string();
  for (k, v) in pairs {
    let needle = format!("{{{}}}", k);
    out = out.replace(&needle, v);
  }
  out
}

/// Trimmed learner id, or `DEFAULT_LEARNER` when missing/blank.
pub fn learner_or_default(learner: Option<&str>) -> String {
  match learner.map(str::trim) {
    Some(l) if !l.is_empty() => l.to_string(),
    _ => DEFAULT_LEARNER.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn template_replaces_every_occurrence() {
    let out = fill_template("{a} and {a}, not {b}", &[("a", "x")]);
    assert_eq!(out, "x and x, not {b}");
  }

  #[test]
  fn blank_learner_falls_back() {
    assert_eq!(learner_or_default(None), DEFAULT_LEARNER);
    assert_eq!(learner_or_default(Some("   ")), DEFAULT_LEARNER);
    assert_eq!(learner_or_default(Some(" ana ")), "ana");
  }
}
