pub mod client;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use client::HttpClassifier;
pub use types::{Classifier, ClassifierError, ClassifierMatch};
