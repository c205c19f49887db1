//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Level, Prompt, PromptKind};
use crate::scoring::SectionTally;
use crate::session::Stage;
use crate::stt::AcquisitionReason;
use std::collections::BTreeMap;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartAssessment {
        #[serde(rename = "catalogId")]
        catalog_id: String,
    },
    SubmitChoice {
        #[serde(rename = "promptId")]
        prompt_id: String,
        #[serde(rename = "selectedIndex")]
        selected_index: usize,
    },
    SubmitTranscript {
        #[serde(rename = "promptId")]
        prompt_id: String,
        transcript: String,
    },
    /// Server-side transcription of client-captured audio. Does not touch the
    /// session; the client follows up with SubmitTranscript.
    TranscribeAudio {
        #[serde(rename = "audioBase64")]
        audio_base64: String,
        mime: String,
    },
    /// The client UI reports a capture failure (e.g. microphone permission).
    AcquisitionFailure {
        reason: AcquisitionReason,
    },
    Advance,
    Revisit {
        index: usize,
    },
    SubmitContact {
        name: String,
        #[serde(default)]
        email: String,
        #[serde(default)]
        phone: String,
    },
    Abandon,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Prompt {
        prompt: PromptOut,
        index: usize,
        total: usize,
        progress: f32,
    },
    Recorded {
        #[serde(rename = "promptId")]
        prompt_id: String,
        progress: f32,
    },
    /// All prompts answered and scored; the result stays withheld until a
    /// valid contact record arrives.
    ContactRequired {
        stage: Stage,
    },
    Result {
        level: Level,
        #[serde(rename = "rawScore")]
        raw_score: u8,
        #[serde(rename = "sectionBreakdown")]
        section_breakdown: BTreeMap<String, SectionTally>,
    },
    Transcript {
        text: String,
    },
    Abandoned,
    // Recoverable, rendered inline so the user can retry without losing progress.
    AcquisitionError {
        reason: AcquisitionReason,
        message: String,
    },
    ContactError {
        fields: Vec<String>,
        message: String,
    },
    Error {
        message: String,
    },
}

/// Prompt DTO for clients. Deliberately omits the answer key
/// (`correct_index`, `keywords`) so it can never leak to the UI.
#[derive(Debug, Serialize)]
pub struct PromptOut {
    pub id: String,
    pub kind: PromptKind,
    pub difficulty: Level,
    pub category: Option<String>,
    pub text: String,
    pub options: Vec<String>,
    #[serde(rename = "referenceText")]
    pub reference_text: String,
}

/// Convert full `Prompt` (internal) to the public DTO.
pub fn to_out(p: &Prompt) -> PromptOut {
    PromptOut {
        id: p.id.clone(),
        kind: p.kind,
        difficulty: p.difficulty,
        category: p.category.clone(),
        text: p.text.clone(),
        options: p.options.clone(),
        reference_text: p.reference_text.clone(),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[derive(Serialize)]
pub struct CatalogSummary {
    pub id: String,
    pub title: String,
    #[serde(rename = "assessmentKind")]
    pub assessment_kind: String,
    #[serde(rename = "promptCount")]
    pub prompt_count: usize,
    #[serde(rename = "allowRevision")]
    pub allow_revision: bool,
}

pub fn to_summary(c: &Catalog) -> CatalogSummary {
    CatalogSummary {
        id: c.id.clone(),
        title: c.title.clone(),
        assessment_kind: c.assessment_kind.clone(),
        prompt_count: c.prompt_count(),
        allow_revision: c.allow_revision,
    }
}

#[derive(Deserialize)]
pub struct TranscribeIn {
    #[serde(rename = "audioBase64")]
    pub audio_base64: String,
    pub mime: String,
}

#[derive(Serialize)]
pub struct TranscribeOut {
    pub text: String,
}
