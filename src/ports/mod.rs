//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage
//!
//! - `EntriesAdapter` - Storage-agnostic entry persistence contract
//!
//! ## Time and identity
//!
//! - `Clock` - Current instant for stamping mutations
//! - `IdGenerator` - Ids for newly created entries
//!
//! ## AI
//!
//! - `BeliefAiService` - Belief analysis and dispute generation
//! - `AIProvider` - Raw LLM completions the belief service builds on

mod ai_provider;
mod belief_ai_service;
mod clock;
mod entries_adapter;
mod id_generator;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message,
    MessageRole, Operation, ProviderInfo, RequestMetadata, TokenUsage,
};
pub use belief_ai_service::{AiServiceError, BeliefAiService};
pub use clock::Clock;
pub use entries_adapter::EntriesAdapter;
pub use id_generator::IdGenerator;
