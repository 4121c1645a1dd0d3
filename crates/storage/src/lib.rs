//! Storage provider abstraction and the Drive-style HTTP implementation.
//!
//! The [`StorageProvider`] trait covers everything the organizing pipeline
//! and the change-ingestion layer need from a remote file store: listing
//! and downloading files, moving them between folders, the organized
//! marker, and the push-notification channel lifecycle with its polling
//! fallback cursor. [`HttpStorage`] talks to a Drive-compatible REST API;
//! [`MemoryStorage`] is the in-memory double used across the test suites.

pub mod error;
pub mod http;
pub mod memory;
pub mod provider;

pub use error::StorageError;
pub use http::{HttpStorage, StorageConfig};
pub use memory::MemoryStorage;
pub use provider::{ChannelRequest, ListFilter, StorageProvider};
