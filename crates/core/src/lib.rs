pub mod category;
pub mod channel;
pub mod classification;
pub mod content;
pub mod file;
pub mod outcome;
pub mod retry;
pub mod routing;

pub use category::Category;
pub use channel::{ChangeEvent, ChangeList, SubscriptionChannel};
pub use classification::{ClassificationResult, InvalidConfidence};
pub use content::{ContentSource, DEFAULT_CONTENT_CAP, ExtractedContent};
pub use file::{FOLDER_MIME, FileRecord, MEDIA_MIME_PREFIXES};
pub use outcome::{BatchSummary, OrganizeError, OrganizeOutcome, SkipReason};
pub use retry::RetryStrategy;
pub use routing::{DEFAULT_CONFIDENCE_THRESHOLD, route};
