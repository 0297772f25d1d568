pub mod classifier;
pub mod sheet_image;

pub use classifier::{FillRatioClassifier, MarkClassifier, MarkPrediction};
