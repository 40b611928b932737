use std::sync::Arc;
use std::time::Instant;

use chrono::{Local, NaiveDate};
use serde::Serialize;
use serde_json::{json, Value};
use skybook_core::{
    detect_locale, normalize_text, parse_explicit_date, CommandSource, DispatchDecision, Locale,
    LocationCatalog, ParsedQueryIntent, QueryResolver, RuleCommand,
};
use skybook_observability::DispatchMetrics;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::backend::{BackendError, ChatRequest, FlightBackend, FlightOffer, FlightSearchRequest};
use crate::dispatcher::Dispatcher;
use crate::registry::SIMULATE_FAILURE_HANDLER;
use crate::replies;

pub const DEFAULT_SEARCH_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize)]
pub struct AssistantReply {
    pub request_id: Uuid,
    pub text: String,
    pub decision: DispatchDecision,
    pub offers: Vec<FlightOffer>,
    pub suggestions: Vec<String>,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct Outcome {
    text: String,
    offers: Vec<FlightOffer>,
    suggestions: Vec<String>,
}

impl Outcome {
    fn text(text: String) -> Self {
        Self {
            text,
            ..Self::default()
        }
    }
}

/// Chat entry point: resolve, dispatch, then run the chosen action against
/// the backend. Backend failures become the reply text.
pub struct ChatAssistant<B>
where
    B: FlightBackend,
{
    catalog: Arc<LocationCatalog>,
    resolver: QueryResolver,
    dispatcher: Dispatcher,
    backend: Arc<B>,
    metrics: Arc<DispatchMetrics>,
    search_limit: usize,
    fixed_today: Option<NaiveDate>,
}

impl<B> ChatAssistant<B>
where
    B: FlightBackend,
{
    pub fn new(
        catalog: Arc<LocationCatalog>,
        resolver: QueryResolver,
        dispatcher: Dispatcher,
        backend: Arc<B>,
        metrics: Arc<DispatchMetrics>,
    ) -> Self {
        Self {
            catalog,
            resolver,
            dispatcher,
            backend,
            metrics,
            search_limit: DEFAULT_SEARCH_LIMIT,
            fixed_today: None,
        }
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    /// Pins the reference day used for relative dates.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.fixed_today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.fixed_today
            .unwrap_or_else(|| Local::now().date_naive())
    }

    pub fn catalog(&self) -> &LocationCatalog {
        &self.catalog
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }

    pub fn resolve(&self, text: &str) -> ParsedQueryIntent {
        self.resolver
            .resolve(&normalize_text(text), &self.catalog, self.today())
    }

    pub fn classify(&self, text: &str) -> DispatchDecision {
        let normalized = normalize_text(text);
        let intent = self.resolver.resolve(&normalized, &self.catalog, self.today());
        self.dispatcher.dispatch(&normalized, &intent)
    }

    #[instrument(skip(self, text))]
    pub async fn handle_message(&self, text: &str) -> AssistantReply {
        let started = Instant::now();
        let request_id = Uuid::new_v4();
        let normalized = normalize_text(text);
        let locale = detect_locale(None, &normalized);

        if normalized.is_empty() {
            return AssistantReply {
                request_id,
                text: replies::empty_message(locale),
                decision: DispatchDecision::ConversationalFallback {
                    message: String::new(),
                },
                offers: Vec::new(),
                suggestions: Vec::new(),
                error: None,
            };
        }

        let decision = self.classify(&normalized);
        self.metrics.record_decision(decision.kind());

        let reply = match self.execute(&decision, locale).await {
            Ok(outcome) => AssistantReply {
                request_id,
                text: outcome.text,
                decision,
                offers: outcome.offers,
                suggestions: outcome.suggestions,
                error: None,
            },
            Err(err) => {
                self.metrics.inc_backend_failure();
                warn!(
                    request_id = %request_id,
                    decision = decision.kind(),
                    error = %err,
                    "backend call failed"
                );
                AssistantReply {
                    request_id,
                    text: replies::backend_failure(locale, &err),
                    decision,
                    offers: Vec::new(),
                    suggestions: Vec::new(),
                    error: Some(err.to_string()),
                }
            }
        };

        self.metrics.observe_latency(started.elapsed());
        info!(
            request_id = %request_id,
            locale = %locale.as_code(),
            decision = reply.decision.kind(),
            offers = reply.offers.len(),
            failed = reply.error.is_some(),
            "message handled"
        );

        reply
    }

    async fn execute(
        &self,
        decision: &DispatchDecision,
        locale: Locale,
    ) -> Result<Outcome, BackendError> {
        match decision {
            DispatchDecision::StructuredSearch { intent } => {
                match (
                    &intent.origin_code,
                    &intent.destination_code,
                    intent.departure_date,
                ) {
                    (Some(origin), Some(destination), Some(date)) => {
                        self.search(origin, destination, date, locale).await
                    }
                    _ => Err(BackendError::Malformed(
                        "structured search without origin, destination and date".to_string(),
                    )),
                }
            }
            DispatchDecision::PartialSearch { intent } => {
                let lookup = |code: &Option<String>| code.as_deref().and_then(|c| self.catalog.get(c));
                Ok(Outcome::text(replies::ask_for_date(
                    locale,
                    lookup(&intent.origin_code),
                    lookup(&intent.destination_code),
                )))
            }
            DispatchDecision::RuleCommand { command } => self.run_command(command, locale).await,
            DispatchDecision::ConversationalFallback { message } => {
                self.converse(message, json!({ "locale": locale.as_code() }))
                    .await
            }
        }
    }

    async fn run_command(&self, command: &RuleCommand, locale: Locale) -> Result<Outcome, BackendError> {
        if command.source == CommandSource::Topic {
            let message = command.args.first().cloned().unwrap_or_default();
            return self
                .converse(
                    &message,
                    json!({
                        "locale": locale.as_code(),
                        "topic": command.name,
                        "handler": command.handler,
                    }),
                )
                .await;
        }

        match (command.handler.as_str(), command.args.as_slice()) {
            (SIMULATE_FAILURE_HANDLER, [code]) => Err(BackendError::simulated(code)),
            ("help", _) => Ok(Outcome::text(replies::help(
                locale,
                &self.dispatcher.registry().usage_lines(),
            ))),
            ("search_flights", [origin, destination, date]) => {
                let date = parse_explicit_date(date).ok_or_else(|| {
                    BackendError::Malformed(format!("invalid date argument `{date}`"))
                })?;
                self.search(origin, destination, date, locale).await
            }
            ("recommend_flights", [origin, destination, date]) => {
                let message = format!("recommend {origin} {destination} {date}");
                self.converse(
                    &message,
                    json!({
                        "locale": locale.as_code(),
                        "intent": "recommend_flights",
                        "origin_code": origin,
                        "destination_code": destination,
                        "departure_date": date,
                    }),
                )
                .await
            }
            (handler, args) => {
                let message = std::iter::once(command.name.as_str())
                    .chain(args.iter().map(String::as_str))
                    .collect::<Vec<_>>()
                    .join(" ");
                self.converse(
                    &message,
                    json!({
                        "locale": locale.as_code(),
                        "intent": handler,
                        "command": command.name,
                        "args": args,
                    }),
                )
                .await
            }
        }
    }

    async fn search(
        &self,
        origin: &str,
        destination: &str,
        date: NaiveDate,
        locale: Locale,
    ) -> Result<Outcome, BackendError> {
        let request = FlightSearchRequest {
            origin_code: origin.to_string(),
            destination_code: destination.to_string(),
            departure_date: date,
            limit: self.search_limit,
        };
        let mut offers = self.backend.search_flights(&request).await?;
        offers.truncate(self.search_limit);

        Ok(Outcome {
            text: replies::format_offers(locale, &request, &offers),
            offers,
            suggestions: Vec::new(),
        })
    }

    async fn converse(&self, message: &str, context: Value) -> Result<Outcome, BackendError> {
        let advice = self
            .backend
            .chat(&ChatRequest {
                message: message.to_string(),
                context,
            })
            .await?;

        Ok(Outcome {
            text: advice.reply,
            offers: Vec::new(),
            suggestions: advice.suggestions,
        })
    }
}
