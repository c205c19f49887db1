//! Built-in catalogs that guarantee the engine is useful even without an
//! external TOML bank. Content mirrors the quiz variants the marketing site
//! runs: a general placement test, a business fill-in set, and a short
//! speaking check.

use crate::catalog::{Catalog, Level, Prompt, PromptKind};

fn choice(id: &str, difficulty: Level, category: &str, text: &str, options: &[&str], correct: usize) -> Prompt {
  Prompt {
    id: id.into(),
    kind: PromptKind::MultipleChoice,
    difficulty,
    category: Some(category.into()),
    text: text.into(),
    options: options.iter().map(|s| s.to_string()).collect(),
    correct_index: Some(correct),
    reference_text: String::new(),
    keywords: vec![],
  }
}

fn blank(id: &str, difficulty: Level, category: &str, text: &str, options: &[&str], correct: usize) -> Prompt {
  Prompt {
    kind: PromptKind::FillBlank,
    ..choice(id, difficulty, category, text, options, correct)
  }
}

fn speech(id: &str, difficulty: Level, reference: &str, keywords: &[&str]) -> Prompt {
  Prompt {
    id: id.into(),
    kind: PromptKind::KeywordSpeech,
    difficulty,
    category: Some("speaking".into()),
    text: "Read the sentence aloud, clearly and at a natural pace.".into(),
    options: vec![],
    correct_index: None,
    reference_text: reference.into(),
    keywords: keywords.iter().map(|s| s.to_string()).collect(),
  }
}

/// The catalogs shipped with the binary.
pub fn seed_catalogs() -> Vec<Catalog> {
  vec![
    Catalog {
      id: "general-placement".into(),
      title: "General English placement".into(),
      assessment_kind: "placement".into(),
      allow_revision: false,
      prompts: vec![
        choice("gp01", Level::A1, "grammar", "She ___ to work every day.",
          &["go", "goes", "going", "gone"], 1),
        choice("gp02", Level::A1, "vocabulary", "The opposite of 'cheap' is ___.",
          &["expensive", "small", "early", "empty"], 0),
        choice("gp03", Level::A2, "grammar", "I ___ TV when the phone rang.",
          &["watch", "watched", "was watching", "have watched"], 2),
        choice("gp04", Level::A2, "vocabulary", "We arrived ___ the airport two hours early.",
          &["on", "at", "in", "to"], 1),
        choice("gp05", Level::B1, "grammar", "If I ___ more time, I would learn another language.",
          &["have", "had", "will have", "would have"], 1),
        choice("gp06", Level::B1, "reading", "'The meeting has been pushed back' means it was ___.",
          &["cancelled", "moved earlier", "postponed", "shortened"], 2),
        choice("gp07", Level::B2, "grammar", "By next June she ___ here for ten years.",
          &["will work", "will have worked", "is working", "has worked"], 1),
        choice("gp08", Level::B2, "vocabulary", "His argument was hard to follow; it kept going off on a ___.",
          &["tangent", "summary", "premise", "margin"], 0),
        choice("gp09", Level::C1, "grammar", "___ had the train left than the announcement was corrected.",
          &["No sooner", "Hardly", "Scarcely", "Only when"], 0),
        choice("gp10", Level::C1, "reading", "A 'tacit agreement' is one that is ___.",
          &["written and signed", "understood without being stated", "legally binding", "temporary"], 1),
        choice("gp11", Level::C2, "vocabulary", "Her praise was so ___ that it bordered on mockery.",
          &["effusive", "reticent", "oblique", "perfunctory"], 0),
        choice("gp12", Level::C2, "grammar", "Little ___ that the decision had already been made.",
          &["they knew", "did they know", "they did know", "knew they"], 1),
      ],
    },
    Catalog {
      id: "business-writing".into(),
      title: "Business English quick check".into(),
      assessment_kind: "business".into(),
      // Shorter form-style quiz; users may go back and revise before scoring.
      allow_revision: true,
      prompts: vec![
        blank("bw01", Level::A2, "register", "Dear Ms Alvarez, I am writing to ___ about the invoice.",
          &["ask you a thing", "enquire", "shout", "chat"], 1),
        blank("bw02", Level::B1, "register", "Please find the report ___ to this email.",
          &["attached", "stapled", "glued", "held"], 0),
        blank("bw03", Level::B1, "error-correction", "We look forward to ___ from you soon.",
          &["hear", "hearing", "heard", "be heard"], 1),
        blank("bw04", Level::B2, "error-correction", "The figures ___ reviewed before the board meeting.",
          &["needs to be", "need to be", "need be to", "needing to be"], 1),
        blank("bw05", Level::C1, "register", "I would be grateful if you could ___ the matter at your earliest convenience.",
          &["look into", "look up", "look out", "look over there"], 0),
        blank("bw06", Level::C1, "error-correction", "Had we known about the delay, we ___ the shipment.",
          &["would reroute", "would have rerouted", "will have rerouted", "had rerouted"], 1),
      ],
    },
    Catalog {
      id: "speaking-check".into(),
      title: "Spoken fluency check".into(),
      assessment_kind: "speaking".into(),
      allow_revision: false,
      prompts: vec![
        speech("sp01", Level::A2,
          "I usually take the bus to the office every single morning",
          &["bus", "office", "morning"]),
        speech("sp02", Level::B1,
          "Last summer we travelled through the mountains and camped beside a quiet lake",
          &["summer", "mountains", "camped", "lake"]),
        speech("sp03", Level::B2,
          "Although the presentation ran long, the audience stayed engaged until the final question",
          &["presentation", "audience", "engaged", "question"]),
      ],
    },
  ]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn all_seed_catalogs_validate() {
    let catalogs = seed_catalogs();
    assert!(!catalogs.is_empty());
    for c in catalogs {
      c.validate().unwrap_or_else(|e| panic!("seed catalog {} invalid: {e}", c.id));
    }
  }
}
