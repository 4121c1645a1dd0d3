//! The organizing pipeline.
//!
//! [`Organizer`] takes a file through the full flow: skip checks (folders,
//! media, already-organized, in-flight), content download and text
//! extraction with a filename fallback, LLM classification, confidence
//! routing, and finally the move into the destination category folder.
//! [`Organizer::run_batch`] sweeps a whole root folder the same way, one
//! file at a time.

pub mod claim;
pub mod config;
pub mod error;
pub mod folders;
pub mod organizer;

pub use claim::ClaimSet;
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use folders::FolderCache;
pub use organizer::Organizer;
