use std::sync::Arc;

use skybook_core::{DispatchDecision, ParsedQueryIntent};
use tracing::debug;

use crate::registry::CommandRegistry;
use crate::rules::{default_rules, DispatchContext, DispatchRule};

#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<CommandRegistry>,
    rules: Vec<Arc<dyn DispatchRule>>,
}

impl Dispatcher {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        let rules = default_rules(&registry);
        Self { registry, rules }
    }

    pub fn with_rules(registry: Arc<CommandRegistry>, rules: Vec<Arc<dyn DispatchRule>>) -> Self {
        Self { registry, rules }
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name()).collect()
    }

    /// Classifies one message. Pure: no I/O, no state carried between calls.
    pub fn dispatch(&self, text: &str, intent: &ParsedQueryIntent) -> DispatchDecision {
        let ctx = DispatchContext { text, intent };

        for rule in &self.rules {
            if let Some(decision) = rule.evaluate(&ctx) {
                debug!(rule = rule.name(), decision = decision.kind(), "message dispatched");
                return decision;
            }
        }

        debug!(rule = "fallback", "message dispatched");
        DispatchDecision::ConversationalFallback {
            message: text.trim().to_string(),
        }
    }
}
