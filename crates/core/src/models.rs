use crate::chunking::DEFAULT_MIN_PARAGRAPH_CHARS;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub id: String,
    pub title: String,
    pub session_number: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub collection: String,
    #[serde(default)]
    pub topic: String,
}

/// One citable passage, cut from a single paragraph of a lecture transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub lecture_id: String,
    pub lecture_title: String,
    pub session_number: u32,
    pub paragraph: String,
    pub tokens: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredChunk<'a> {
    pub chunk: &'a Chunk,
    pub score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Citation {
    pub lecture_id: String,
    pub lecture_title: String,
    pub session_number: u32,
    pub excerpt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalAnswer {
    pub text: String,
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    Local,
    #[default]
    #[serde(alias = "ai")]
    Smart,
}

impl std::str::FromStr for AnswerMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "local" => Ok(AnswerMode::Local),
            "smart" | "ai" => Ok(AnswerMode::Smart),
            other => Err(format!("unknown answer mode `{other}` (expected local or smart)")),
        }
    }
}

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub mode: AnswerMode,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
}

impl Settings {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mode: AnswerMode::default(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
        }
    }
}

// Keeps the credential out of logs and panic messages.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("mode", &self.mode)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &if self.has_api_key() { "<set>" } else { "<empty>" })
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalOptions {
    pub top_k: usize,
    pub coverage_weight: f64,
    pub density_weight: f64,
    pub density_floor: usize,
    pub min_paragraph_chars: usize,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_k: 4,
            coverage_weight: 0.85,
            density_weight: 0.15,
            density_floor: 20,
            min_paragraph_chars: DEFAULT_MIN_PARAGRAPH_CHARS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnswerLimits {
    pub primary_chars: usize,
    pub supplementary_chars: usize,
    pub citation_chars: usize,
    pub supplementary_count: usize,
    pub context_chars: usize,
}

impl Default for AnswerLimits {
    fn default() -> Self {
        Self {
            primary_chars: 420,
            supplementary_chars: 180,
            citation_chars: 170,
            supplementary_count: 2,
            context_chars: 900,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConversationOptions {
    pub history_window: usize,
    pub history_capacity: usize,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub error_chars: usize,
}

impl Default for ConversationOptions {
    fn default() -> Self {
        Self {
            history_window: 8,
            history_capacity: 200,
            timeout_secs: 30,
            temperature: 0.2,
            error_chars: 220,
        }
    }
}
