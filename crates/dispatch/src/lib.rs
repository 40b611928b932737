pub mod assistant;
pub mod backend;
pub mod dispatcher;
pub mod registry;
pub mod replies;
pub mod rules;

pub use assistant::{AssistantReply, ChatAssistant, DEFAULT_SEARCH_LIMIT};
pub use backend::{
    BackendError, ChatAdvice, ChatRequest, FlightBackend, FlightOffer, FlightSearchRequest,
};
pub use dispatcher::Dispatcher;
pub use registry::{ArgKind, CommandRegistry, CommandSpec, RegistryError, TopicSpec};
pub use rules::{DispatchContext, DispatchRule};
