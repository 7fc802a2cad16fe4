//! The chatmux turn pipeline: Intent Classifier, Context Aggregator,
//! Response Synthesizer and the coordinator that runs them per message.

pub mod aggregator;
pub mod classifier;
pub mod coordinator;
pub mod lock;
pub mod synthesizer;

pub use aggregator::{ContextAggregator, FetchPlan, Variant};
pub use classifier::{classify_keywords, Classification, Entities, IntentClassifier, Strategy};
pub use coordinator::{Reply, TurnCoordinator, TurnError, TurnOutcome, TurnRequest};
pub use lock::{ConversationBusy, ConversationLocks};
pub use synthesizer::{FallbackSynthesizer, ResponseSynthesizer, Synthesis};
