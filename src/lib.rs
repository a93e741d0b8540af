//! Find mentions of publicly traded companies in podcast transcripts.
//!
//! The language work is done by a hosted model; this crate builds the
//! prompt, makes one completion call and validates the reply into a
//! [`MentionsList`].

pub mod config;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod logging;
pub mod mention;
pub mod prompt;

pub use config::{BackendKind, ExtractorConfig};
pub use error::{ConfigError, ExtractionError, RemoteServiceError, SchemaValidationError, Violation};
pub use extraction::Extractor;
pub use llm::{CompletionBackend, CompletionRequest, LLMClient};
pub use mention::{describe_schema, parse, MentionRecord, MentionsList, Sentiment};

pub const TARGET_LLM_REQUEST: &str = "llm_request";
pub const TARGET_EXTRACTION: &str = "extraction";
