use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    Vi,
    En,
    Unknown,
}

impl Locale {
    pub fn as_code(self) -> &'static str {
        match self {
            Self::Vi => "vi",
            Self::En => "en",
            Self::Unknown => "unknown",
        }
    }
}

/// One known place a flight can depart from or arrive at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub code: String,
    pub city: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Location {
    pub fn new(code: &str, city: &str, aliases: &[&str]) -> Self {
        Self {
            code: code.to_string(),
            city: city.to_string(),
            aliases: aliases.iter().map(|alias| alias.to_string()).collect(),
        }
    }
}

/// Structured guess at the flight search a free-text message asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQueryIntent {
    pub origin_code: Option<String>,
    pub destination_code: Option<String>,
    pub departure_date: Option<NaiveDate>,
    pub confidence: f64,
    pub is_valid: bool,
}

impl ParsedQueryIntent {
    pub fn empty() -> Self {
        Self {
            origin_code: None,
            destination_code: None,
            departure_date: None,
            confidence: 0.0,
            is_valid: false,
        }
    }

    pub fn has_any_location(&self) -> bool {
        self.origin_code.is_some() || self.destination_code.is_some()
    }

    pub fn has_both_locations(&self) -> bool {
        self.origin_code.is_some() && self.destination_code.is_some()
    }

    /// Origin, destination and date are all present.
    pub fn is_complete(&self) -> bool {
        self.has_both_locations() && self.departure_date.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandSource {
    Reserved,
    Registry,
    Topic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCommand {
    pub name: String,
    pub handler: String,
    pub args: Vec<String>,
    pub source: CommandSource,
}

/// The single downstream action chosen for one user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DispatchDecision {
    StructuredSearch { intent: ParsedQueryIntent },
    PartialSearch { intent: ParsedQueryIntent },
    RuleCommand { command: RuleCommand },
    ConversationalFallback { message: String },
}

impl DispatchDecision {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StructuredSearch { .. } => "structured_search",
            Self::PartialSearch { .. } => "partial_search",
            Self::RuleCommand { .. } => "rule_command",
            Self::ConversationalFallback { .. } => "conversational_fallback",
        }
    }

    pub fn command(&self) -> Option<&RuleCommand> {
        match self {
            Self::RuleCommand { command } => Some(command),
            _ => None,
        }
    }
}
