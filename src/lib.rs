pub mod classifier;
pub mod config;
pub mod error;
pub mod labels;
pub mod load_image;
pub mod predict;
pub mod server;
pub mod upload;
pub mod validate;

pub use classifier::{Classifier, ResNetClassifier};
pub use labels::LabelTable;
pub use predict::Prediction;
pub use server::{router, AppState};
