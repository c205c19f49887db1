//! Small utility helpers used across modules.

/// Whitespace-separated word count. Both sides of the fluency ratio use this,
/// so the exact tokenization matters less than it being identical.
pub fn word_count(s: &str) -> usize {
  s.split_whitespace().count()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max { s.to_string() } else { format!("{}… ({} bytes total)", &s[..max], s.len()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn word_count_ignores_extra_whitespace() {
    assert_eq!(word_count("  I   take the\tbus "), 4);
    assert_eq!(word_count(""), 0);
  }
}
