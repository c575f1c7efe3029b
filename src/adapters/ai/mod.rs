//! AI Adapters.
//!
//! ## Available Adapters
//!
//! - `LlmBeliefService` - Belief service built on any `AIProvider`
//! - `MockBeliefService` - Scripted belief service for tests
//! - `MockAIProvider` - Configurable completion provider mock

mod llm_belief_service;
mod mock_belief_service;
mod mock_provider;

pub use llm_belief_service::LlmBeliefService;
pub use mock_belief_service::MockBeliefService;
pub use mock_provider::{MockAIProvider, MockResponse};
