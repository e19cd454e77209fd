use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The AI-generated profile shown on the dashboard persona card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub id: i64,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub daily_challenges_input: String,
    #[serde(default)]
    pub goals_input: String,
    #[serde(default)]
    pub ai_generated_persona_summary: String,
    #[serde(default)]
    pub ai_personality_traits: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Persona {
    /// The summary has not been generated yet.
    pub fn is_pending(&self) -> bool {
        self.ai_generated_persona_summary.trim().is_empty()
    }
}
