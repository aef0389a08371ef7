//! Trained model loading and inference

pub mod inference;
pub mod loader;

pub use inference::{Classifier, OnnxClassifier};
pub use loader::{ArtifactLoader, TrainedArtifacts};
