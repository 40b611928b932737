use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlightSearchRequest {
    pub origin_code: String,
    pub destination_code: String,
    pub departure_date: NaiveDate,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlightOffer {
    pub flight_number: String,
    #[serde(default)]
    pub airline: Option<String>,
    pub origin_code: String,
    pub destination_code: String,
    pub departure_time: NaiveDateTime,
    #[serde(default)]
    pub arrival_time: Option<NaiveDateTime>,
    pub price_amount: i64,
    #[serde(default = "default_currency")]
    pub price_currency: String,
    #[serde(default)]
    pub remaining_seats: Option<u32>,
}

fn default_currency() -> String {
    "VND".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub context: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatAdvice {
    pub reply: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend returned HTTP {status}")]
    Status { status: u16, body: String },

    #[error("backend request timed out")]
    Timeout,

    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("malformed backend response: {0}")]
    Malformed(String),
}

impl BackendError {
    /// The failure a reserved `test <code>` command stands for.
    pub fn simulated(code: &str) -> Self {
        match code {
            "timeout" => Self::Timeout,
            "network" => Self::Transport("simulated network failure".to_string()),
            other => match other.parse::<u16>() {
                Ok(status) => Self::Status {
                    status,
                    body: "simulated".to_string(),
                },
                Err(_) => Self::Malformed(format!("unknown test code `{other}`")),
            },
        }
    }
}

/// The search and chat endpoints of the booking backend. Implementations own
/// timeouts; callers never retry.
pub trait FlightBackend: Send + Sync {
    async fn search_flights(
        &self,
        request: &FlightSearchRequest,
    ) -> Result<Vec<FlightOffer>, BackendError>;

    async fn chat(&self, request: &ChatRequest) -> Result<ChatAdvice, BackendError>;
}
