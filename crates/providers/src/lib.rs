//! Generative-model adapter for chatmux.

pub mod google;
pub mod registry;
pub mod traits;
pub mod util;

pub use registry::{build_provider, TimeoutProvider};
pub use traits::{CompletionRequest, CompletionResponse, GenerationConfig, LlmProvider, Usage};
