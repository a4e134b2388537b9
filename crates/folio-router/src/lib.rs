pub mod completion;
pub mod controller;
pub mod error;
pub mod gate;
pub mod routing;
pub mod service;

pub use completion::{CompletionBackend, CompletionRequest, LlmCompletion};
pub use controller::{
    ControllerSettings, ConversationController, OutcomeKind, ProfileMode, TurnOutcome, TurnState,
};
pub use error::{ModelError, Result, RouterError, TurnError};
pub use gate::{KeywordGate, RelevanceGate};
pub use routing::{KeywordRouting, ModelRouting, RoutingStrategy};
pub use service::ChatService;
