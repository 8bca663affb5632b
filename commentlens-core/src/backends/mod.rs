//! Classifier backends
//!
//! Concrete implementations of [`TextClassifier`](crate::classifier::TextClassifier)
//! and [`ImageClassifier`](crate::classifier::ImageClassifier). Model
//! inference itself always happens outside this crate; a backend only moves
//! inputs to the model and maps its answer back to [`Prediction`](crate::types::Prediction)s.

#[cfg(feature = "hosted-inference")]
pub mod hosted;

#[cfg(feature = "hosted-inference")]
pub use hosted::{HostedImageClassifier, HostedTextClassifier, InferenceClient};
