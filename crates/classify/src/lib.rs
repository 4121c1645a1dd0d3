pub mod classifier;
pub mod config;
pub mod error;
pub mod http;
pub mod mock;
pub mod prompt;

pub use classifier::{Classifier, ClassifyRequest};
pub use config::ClassifierConfig;
pub use error::ClassifyError;
pub use http::HttpClassifier;
pub use mock::{FailingClassifier, MockClassifier};
pub use prompt::build_prompt;
