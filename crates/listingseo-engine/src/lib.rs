//! Listing analysis engine.
//!
//! Fetches competitor listings, generates optimized listing content, and
//! derives keyword and trend metrics for a product analysis. Outbound
//! providers (SerpAPI, Gemini) are optional trait objects; without them every
//! service falls back to deterministic offline behaviour.

pub mod cache;
pub mod competitors;
pub mod content;
pub mod error;
pub mod keywords;
pub mod memory;
pub mod providers;
pub mod queue;
pub mod report;
pub mod scoring;
pub mod services;
pub mod trends;
pub mod workflow;

pub use cache::BoundedCache;
pub use competitors::CompetitorSource;
pub use content::ContentGenerator;
pub use error::{ProviderError, QueueError, WorkflowError};
pub use keywords::extract_keywords;
pub use memory::MemoryStore;
pub use queue::{AnalysisProcessor, JobFailure, QueueSupervisor, WorkflowQueue};
pub use report::{build_report, AnalysisReport};
pub use services::{EngineServices, Settings};
pub use trends::TrendsService;
pub use workflow::{AnalysisWorkflow, WorkflowOutcome};
