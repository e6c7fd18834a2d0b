pub mod align;
pub mod classifier;
pub mod config;
pub mod error;
pub mod output;
pub mod repository;
pub mod scoring;
pub mod server;

pub use align::{rank_resources, AlignRequest, AlignSettings};
pub use error::AlignError;
