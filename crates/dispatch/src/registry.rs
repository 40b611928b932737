use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use skybook_core::normalize::tokenize;
use skybook_core::{fold_text, parse_explicit_date, CommandSource, RuleCommand};
use thiserror::Error;

pub const RESERVED_TEST_KEYWORD: &str = "test";
pub const RESERVED_TEST_CODES: &[&str] = &[
    "400", "401", "403", "404", "500", "503", "timeout", "network",
];
pub const SIMULATE_FAILURE_HANDLER: &str = "simulate_failure";

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("command keyword must be a single non-empty word, got `{0}`")]
    InvalidKeyword(String),

    #[error("duplicate command keyword `{0}`")]
    DuplicateKeyword(String),

    #[error("`{0}` is reserved for test commands")]
    ReservedKeyword(String),

    #[error("topic `{0}` has no keywords")]
    EmptyTopic(String),

    #[error("failed reading command registry at {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid command registry json")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgKind {
    /// Three-letter location code, upper-cased on acceptance.
    Code,
    /// ISO or day-first date with a full year, normalised to ISO.
    Date,
    Text,
}

impl ArgKind {
    pub fn accept(self, raw: &str) -> Option<String> {
        let raw = raw.trim();
        match self {
            Self::Code => (raw.len() == 3 && raw.chars().all(|ch| ch.is_ascii_alphabetic()))
                .then(|| raw.to_ascii_uppercase()),
            Self::Date => parse_explicit_date(raw).map(|date| date.format("%Y-%m-%d").to_string()),
            Self::Text => (!raw.is_empty()).then(|| raw.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub keyword: String,
    #[serde(default)]
    pub args: Vec<ArgKind>,
    pub handler: String,
    #[serde(default)]
    pub usage: String,
}

impl CommandSpec {
    pub fn new(keyword: &str, args: &[ArgKind], handler: &str, usage: &str) -> Self {
        Self {
            keyword: keyword.to_string(),
            args: args.to_vec(),
            handler: handler.to_string(),
            usage: usage.to_string(),
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSpec {
    pub topic: String,
    pub handler: String,
    pub keywords: Vec<String>,
}

impl TopicSpec {
    pub fn new(topic: &str, handler: &str, keywords: &[&str]) -> Self {
        Self {
            topic: topic.to_string(),
            handler: handler.to_string(),
            keywords: keywords.iter().map(|kw| kw.to_string()).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    commands: Vec<CommandSpec>,
    #[serde(default)]
    topics: Vec<TopicSpec>,
}

/// Keyword-triggered commands and topic keywords. Adding a command is a data
/// change: a new [`CommandSpec`] entry, no new branch in the dispatcher.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: Vec<CommandSpec>,
    topics: Vec<TopicSpec>,
    /// Folded keyword token sequences, parallel to `topics`.
    topic_needles: Vec<Vec<String>>,
}

impl CommandRegistry {
    pub fn new(commands: Vec<CommandSpec>, topics: Vec<TopicSpec>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        let mut normalized = Vec::with_capacity(commands.len());

        for mut command in commands {
            let keyword = command.keyword.trim().to_lowercase();
            if keyword.is_empty() || keyword.split_whitespace().count() != 1 {
                return Err(RegistryError::InvalidKeyword(command.keyword));
            }
            if keyword == RESERVED_TEST_KEYWORD {
                return Err(RegistryError::ReservedKeyword(keyword));
            }
            if !seen.insert(keyword.clone()) {
                return Err(RegistryError::DuplicateKeyword(keyword));
            }
            command.keyword = keyword;
            normalized.push(command);
        }

        let registry = Self::from_trusted(normalized, topics);
        if let Some((topic, _)) = registry
            .topics
            .iter()
            .zip(&registry.topic_needles)
            .find(|(_, needles)| needles.is_empty())
        {
            return Err(RegistryError::EmptyTopic(topic.topic.clone()));
        }

        Ok(registry)
    }

    pub fn builtin() -> Self {
        let commands = vec![
            CommandSpec::new(
                "recommend",
                &[ArgKind::Code, ArgKind::Code, ArgKind::Date],
                "recommend_flights",
                "recommend <ORIGIN> <DESTINATION> <YYYY-MM-DD>",
            ),
            CommandSpec::new(
                "search",
                &[ArgKind::Code, ArgKind::Code, ArgKind::Date],
                "search_flights",
                "search <ORIGIN> <DESTINATION> <YYYY-MM-DD>",
            ),
            CommandSpec::new(
                "status",
                &[ArgKind::Text],
                "flight_status",
                "status <FLIGHT_NUMBER>",
            ),
            CommandSpec::new(
                "cancel",
                &[ArgKind::Text],
                "cancel_booking",
                "cancel <BOOKING_CODE>",
            ),
            CommandSpec::new("help", &[], "help", "help"),
        ];

        let topics = vec![
            TopicSpec::new(
                "family",
                "family_travel_advice",
                &["gia đình", "trẻ em", "trẻ con", "em bé", "family", "kids", "children"],
            ),
            TopicSpec::new(
                "business",
                "business_travel_advice",
                &["công tác", "hội nghị", "business", "work trip", "conference"],
            ),
            TopicSpec::new(
                "advice",
                "travel_advice",
                &["tư vấn", "gợi ý", "lời khuyên", "kinh nghiệm", "advice", "tips"],
            ),
        ];

        Self::from_trusted(commands, topics)
    }

    fn from_trusted(commands: Vec<CommandSpec>, topics: Vec<TopicSpec>) -> Self {
        let topic_needles = topics
            .iter()
            .map(|topic| {
                topic
                    .keywords
                    .iter()
                    .map(|keyword| folded_words(keyword).join(" "))
                    .filter(|needle| !needle.is_empty())
                    .collect()
            })
            .collect();

        Self {
            commands,
            topics,
            topic_needles,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_json::from_str(raw)?;
        Self::new(file.commands, file.topics)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let raw = fs::read_to_string(path.as_ref()).map_err(|source| RegistryError::Io {
            path: path.as_ref().display().to_string(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn commands(&self) -> &[CommandSpec] {
        &self.commands
    }

    pub fn topics(&self) -> &[TopicSpec] {
        &self.topics
    }

    pub fn usage_lines(&self) -> Vec<String> {
        self.commands
            .iter()
            .map(|command| {
                if command.usage.is_empty() {
                    command.keyword.clone()
                } else {
                    command.usage.clone()
                }
            })
            .collect()
    }

    /// `test <code>`, exactly two words.
    pub fn match_reserved(&self, text: &str) -> Option<RuleCommand> {
        let words = text.split_whitespace().collect::<Vec<_>>();
        let [keyword, code] = words.as_slice() else {
            return None;
        };
        if !keyword.eq_ignore_ascii_case(RESERVED_TEST_KEYWORD) {
            return None;
        }

        let code = code.to_lowercase();
        RESERVED_TEST_CODES
            .contains(&code.as_str())
            .then(|| RuleCommand {
                name: RESERVED_TEST_KEYWORD.to_string(),
                handler: SIMULATE_FAILURE_HANDLER.to_string(),
                args: vec![code],
                source: CommandSource::Reserved,
            })
    }

    /// Leading keyword followed by exactly `arity` arguments that each
    /// validate against their kind. Anything else falls through.
    pub fn match_command(&self, text: &str) -> Option<RuleCommand> {
        let mut words = text.split_whitespace();
        let keyword = words.next()?.to_lowercase();
        let rest = words.collect::<Vec<_>>();

        let spec = self
            .commands
            .iter()
            .find(|command| command.keyword == keyword)?;
        if rest.len() != spec.arity() {
            return None;
        }

        let args = spec
            .args
            .iter()
            .zip(rest)
            .map(|(kind, raw)| kind.accept(raw))
            .collect::<Option<Vec<_>>>()?;

        Some(RuleCommand {
            name: spec.keyword.clone(),
            handler: spec.handler.clone(),
            args,
            source: CommandSource::Registry,
        })
    }

    /// First topic (registry order) with a whole-word keyword hit.
    pub fn match_topic(&self, text: &str) -> Option<RuleCommand> {
        let haystack = format!(" {} ", folded_words(text).join(" "));

        self.topics
            .iter()
            .zip(&self.topic_needles)
            .find(|(_, needles)| {
                needles
                    .iter()
                    .any(|needle| haystack.contains(&format!(" {needle} ")))
            })
            .map(|(topic, _)| RuleCommand {
                name: topic.topic.clone(),
                handler: topic.handler.clone(),
                args: vec![text.trim().to_string()],
                source: CommandSource::Topic,
            })
    }
}

fn folded_words(text: &str) -> Vec<String> {
    let folded = fold_text(text);
    tokenize(&folded)
        .into_iter()
        .map(|token| token.text.to_string())
        .collect()
}
