//! Pure scoring: responses -> raw score (0-100) -> proficiency level,
//! plus the per-category breakdown.
//!
//! Two modes, selected by prompt kind:
//!   - choice: exact index match, unanswered counts as incorrect
//!   - speech: keyword coverage (70%) + utterance-length fluency (30%),
//!     case-insensitive substring matching, no fuzzy/edit-distance credit
//!
//! Every prompt yields a per-prompt score in 0..=100 (choice: 100 or 0);
//! the raw score is the rounded mean, so a pure choice catalog reduces to
//! `correct / total * 100` exactly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Level, Prompt};
use crate::error::EngineError;
use crate::util::word_count;

/// Keyword coverage dominates (content correctness); fluency is a secondary
/// signal (completeness of utterance).
const KEYWORD_WEIGHT: f32 = 0.7;
const FLUENCY_WEIGHT: f32 = 0.3;

/// A per-prompt score at or above this counts as "correct" in the section
/// breakdown. Choice prompts only ever score 100 or 0, so this matters for
/// speech prompts.
const CORRECT_THRESHOLD: f32 = 60.0;

/// One user answer, keyed externally by prompt id. Immutable once recorded;
/// a retry discards and recreates it.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
  Choice { selected_index: usize },
  Speech { transcript: String },
}

/// `{correct, total}` tally for one category.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionTally {
  pub correct: u32,
  pub total: u32,
}

/// Scored, leveled outcome of a completed session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssessmentResult {
  pub raw_score: u8,
  pub level: Level,
  /// Only populated for catalogs whose prompts carry categories.
  pub section_breakdown: BTreeMap<String, SectionTally>,
}

/// Map a percentage score to its level bucket. Pure and total over 0..=100;
/// anything outside that range is a bucketing bug, not user input.
pub fn level_for_score(score: i64) -> Result<Level, EngineError> {
  match score {
    0..=20 => Ok(Level::A1),
    21..=40 => Ok(Level::A2),
    41..=55 => Ok(Level::B1),
    56..=70 => Ok(Level::B2),
    71..=85 => Ok(Level::C1),
    86..=100 => Ok(Level::C2),
    other => Err(EngineError::ScoreOutOfRange(other)),
  }
}

/// Keyword + fluency heuristic for one speech prompt. Returns 0..=100.
///
/// Known limitation, accepted as-is: nothing stops a user from reading an
/// unrelated sentence that happens to contain the keywords, or from repeating
/// a keyword; coverage is boolean per keyword and capped, so the damage is
/// bounded but not zero.
pub fn speech_score(reference_text: &str, keywords: &[String], transcript: &str) -> f32 {
  let haystack = transcript.to_lowercase();
  let hits = keywords
    .iter()
    .filter(|k| haystack.contains(&k.to_lowercase()))
    .count();
  let keyword_score = if keywords.is_empty() {
    0.0
  } else {
    hits as f32 / keywords.len() as f32 * 100.0
  };

  let ref_words = word_count(reference_text);
  let fluency_score = if ref_words == 0 {
    0.0
  } else {
    // Capped at 1 so over-long transcripts do not inflate the score.
    (word_count(transcript) as f32 / ref_words as f32).min(1.0) * 100.0
  };

  keyword_score * KEYWORD_WEIGHT + fluency_score * FLUENCY_WEIGHT
}

/// Per-prompt score. Unanswered or wrong-modality responses score zero.
fn prompt_score(prompt: &Prompt, response: Option<&Response>) -> f32 {
  match (prompt.is_choice(), response) {
    (true, Some(Response::Choice { selected_index })) => {
      if Some(*selected_index) == prompt.correct_index {
        100.0
      } else {
        0.0
      }
    }
    (false, Some(Response::Speech { transcript })) => {
      speech_score(&prompt.reference_text, &prompt.keywords, transcript)
    }
    _ => 0.0,
  }
}

/// Score a full response set against its catalog.
///
/// Iterates the catalog's prompt order (not response insertion order), so the
/// result is reproducible from catalog + responses alone.
pub fn score_responses(
  catalog: &Catalog,
  responses: &[(String, Response)],
) -> Result<AssessmentResult, EngineError> {
  let total = catalog.prompt_count();
  let mut sum = 0.0f32;
  let mut breakdown: BTreeMap<String, SectionTally> = BTreeMap::new();

  for prompt in &catalog.prompts {
    let response = responses
      .iter()
      .find(|(id, _)| id == &prompt.id)
      .map(|(_, r)| r);
    let score = prompt_score(prompt, response);
    sum += score;

    if let Some(category) = &prompt.category {
      let tally = breakdown.entry(category.clone()).or_default();
      tally.total += 1;
      if score >= CORRECT_THRESHOLD {
        tally.correct += 1;
      }
    }
  }

  // f32::round is half-away-from-zero, i.e. half-up for non-negative scores.
  let raw = (sum / total as f32).round() as i64;
  let level = level_for_score(raw)?;

  Ok(AssessmentResult {
    raw_score: raw as u8,
    level,
    section_breakdown: breakdown,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::PromptKind;

  fn choice_prompt(id: &str, category: &str) -> Prompt {
    Prompt {
      id: id.into(),
      kind: PromptKind::MultipleChoice,
      difficulty: Level::A2,
      category: Some(category.into()),
      text: "Pick one.".into(),
      options: vec!["a".into(), "b".into(), "c".into()],
      correct_index: Some(1),
      reference_text: String::new(),
      keywords: vec![],
    }
  }

  fn choice_catalog(n: usize) -> Catalog {
    Catalog {
      id: "quiz".into(),
      title: "Quiz".into(),
      assessment_kind: "placement".into(),
      allow_revision: false,
      prompts: (0..n).map(|i| choice_prompt(&format!("p{i}"), "grammar")).collect(),
    }
  }

  fn answer(id: &str, index: usize) -> (String, Response) {
    (id.to_string(), Response::Choice { selected_index: index })
  }

  #[test]
  fn bucket_boundaries_land_in_documented_levels() {
    let cases = [
      (0, Level::A1),
      (20, Level::A1),
      (21, Level::A2),
      (40, Level::A2),
      (41, Level::B1),
      (55, Level::B1),
      (56, Level::B2),
      (70, Level::B2),
      (71, Level::C1),
      (85, Level::C1),
      (86, Level::C2),
      (100, Level::C2),
    ];
    for (score, expected) in cases {
      assert_eq!(level_for_score(score).unwrap(), expected, "score {score}");
    }
  }

  #[test]
  fn bucketing_is_pure() {
    for score in 0..=100 {
      let a = level_for_score(score).unwrap();
      let b = level_for_score(score).unwrap();
      assert_eq!(a, b);
    }
  }

  #[test]
  fn out_of_range_scores_are_a_bucketing_error() {
    assert!(matches!(level_for_score(-1), Err(EngineError::ScoreOutOfRange(-1))));
    assert!(matches!(level_for_score(101), Err(EngineError::ScoreOutOfRange(101))));
  }

  #[test]
  fn all_correct_choice_set_scores_100_and_c2() {
    let catalog = choice_catalog(4);
    let responses: Vec<_> = (0..4).map(|i| answer(&format!("p{i}"), 1)).collect();
    let result = score_responses(&catalog, &responses).unwrap();
    assert_eq!(result.raw_score, 100);
    assert_eq!(result.level, Level::C2);
  }

  #[test]
  fn all_incorrect_choice_set_scores_0_and_a1() {
    let catalog = choice_catalog(4);
    let responses: Vec<_> = (0..4).map(|i| answer(&format!("p{i}"), 0)).collect();
    let result = score_responses(&catalog, &responses).unwrap();
    assert_eq!(result.raw_score, 0);
    assert_eq!(result.level, Level::A1);
  }

  #[test]
  fn one_of_three_rounds_to_33_and_a2() {
    let catalog = choice_catalog(3);
    let responses = vec![answer("p0", 1), answer("p1", 0), answer("p2", 2)];
    let result = score_responses(&catalog, &responses).unwrap();
    assert_eq!(result.raw_score, 33);
    assert_eq!(result.level, Level::A2);
  }

  #[test]
  fn unanswered_prompts_count_as_incorrect() {
    let catalog = choice_catalog(2);
    let responses = vec![answer("p0", 1)];
    let result = score_responses(&catalog, &responses).unwrap();
    assert_eq!(result.raw_score, 50);
  }

  #[test]
  fn half_scores_round_up() {
    // 1 correct of 8 => 12.5 => 13
    let catalog = choice_catalog(8);
    let responses = vec![answer("p0", 1)];
    let result = score_responses(&catalog, &responses).unwrap();
    assert_eq!(result.raw_score, 13);
  }

  #[test]
  fn section_breakdown_tallies_per_category() {
    let mut catalog = choice_catalog(3);
    catalog.prompts[2].category = Some("vocabulary".into());
    let responses = vec![answer("p0", 1), answer("p1", 0), answer("p2", 1)];
    let result = score_responses(&catalog, &responses).unwrap();
    assert_eq!(
      result.section_breakdown.get("grammar"),
      Some(&SectionTally { correct: 1, total: 2 })
    );
    assert_eq!(
      result.section_breakdown.get("vocabulary"),
      Some(&SectionTally { correct: 1, total: 1 })
    );
  }

  #[test]
  fn full_keyword_and_length_match_scores_100() {
    let reference = "I usually take the bus to the office every morning";
    assert_eq!(word_count(reference), 10);
    let keywords = vec!["bus".to_string(), "office".to_string(), "morning".to_string()];
    let score = speech_score(reference, &keywords, reference);
    assert_eq!(score.round() as u8, 100);
  }

  #[test]
  fn empty_transcript_scores_0() {
    let keywords = vec!["bus".to_string()];
    let score = speech_score("I take the bus", &keywords, "");
    assert_eq!(score, 0.0);
  }

  #[test]
  fn keyword_matching_is_case_insensitive() {
    let keywords = vec!["Bus".to_string()];
    let score = speech_score("the bus", &keywords, "THE BUS");
    assert_eq!(score.round() as u8, 100);
  }

  #[test]
  fn over_long_transcript_does_not_inflate_fluency() {
    let reference = "short sentence here";
    let keywords = vec!["sentence".to_string()];
    let exact = speech_score(reference, &keywords, reference);
    let padded = speech_score(
      reference,
      &keywords,
      "short sentence here with a great many extra words appended on",
    );
    assert_eq!(exact.round(), padded.round());
  }
}
