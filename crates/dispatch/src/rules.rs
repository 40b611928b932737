use std::sync::Arc;

use skybook_core::{DispatchDecision, ParsedQueryIntent};

use crate::registry::CommandRegistry;

pub struct DispatchContext<'a> {
    pub text: &'a str,
    pub intent: &'a ParsedQueryIntent,
}

/// One step of the dispatch priority list. Returning `None` passes the
/// message on to the next rule.
pub trait DispatchRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, ctx: &DispatchContext<'_>) -> Option<DispatchDecision>;
}

pub struct ReservedCommandRule {
    registry: Arc<CommandRegistry>,
}

impl ReservedCommandRule {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }
}

impl DispatchRule for ReservedCommandRule {
    fn name(&self) -> &'static str {
        "reserved_command"
    }

    fn evaluate(&self, ctx: &DispatchContext<'_>) -> Option<DispatchDecision> {
        self.registry
            .match_reserved(ctx.text)
            .map(|command| DispatchDecision::RuleCommand { command })
    }
}

pub struct RegistryCommandRule {
    registry: Arc<CommandRegistry>,
}

impl RegistryCommandRule {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }
}

impl DispatchRule for RegistryCommandRule {
    fn name(&self) -> &'static str {
        "registry_command"
    }

    fn evaluate(&self, ctx: &DispatchContext<'_>) -> Option<DispatchDecision> {
        self.registry
            .match_command(ctx.text)
            .map(|command| DispatchDecision::RuleCommand { command })
    }
}

pub struct StructuredSearchRule;

impl DispatchRule for StructuredSearchRule {
    fn name(&self) -> &'static str {
        "structured_search"
    }

    fn evaluate(&self, ctx: &DispatchContext<'_>) -> Option<DispatchDecision> {
        (ctx.intent.is_valid && ctx.intent.is_complete()).then(|| {
            DispatchDecision::StructuredSearch {
                intent: ctx.intent.clone(),
            }
        })
    }
}

pub struct PartialSearchRule;

impl DispatchRule for PartialSearchRule {
    fn name(&self) -> &'static str {
        "partial_search"
    }

    fn evaluate(&self, ctx: &DispatchContext<'_>) -> Option<DispatchDecision> {
        (ctx.intent.has_both_locations() && ctx.intent.departure_date.is_none()).then(|| {
            DispatchDecision::PartialSearch {
                intent: ctx.intent.clone(),
            }
        })
    }
}

pub struct TopicKeywordRule {
    registry: Arc<CommandRegistry>,
}

impl TopicKeywordRule {
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self { registry }
    }
}

impl DispatchRule for TopicKeywordRule {
    fn name(&self) -> &'static str {
        "topic_keyword"
    }

    fn evaluate(&self, ctx: &DispatchContext<'_>) -> Option<DispatchDecision> {
        self.registry
            .match_topic(ctx.text)
            .map(|command| DispatchDecision::RuleCommand { command })
    }
}

/// Highest priority first. Exact commands are checked before any
/// natural-language interpretation.
pub fn default_rules(registry: &Arc<CommandRegistry>) -> Vec<Arc<dyn DispatchRule>> {
    vec![
        Arc::new(ReservedCommandRule::new(registry.clone())),
        Arc::new(RegistryCommandRule::new(registry.clone())),
        Arc::new(StructuredSearchRule),
        Arc::new(PartialSearchRule),
        Arc::new(TopicKeywordRule::new(registry.clone())),
    ]
}
