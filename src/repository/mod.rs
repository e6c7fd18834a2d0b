pub mod filter;
pub mod loader;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;

pub use filter::filter_applicable;
pub use loader::{load_repository, parse_list};
pub use types::{RepositorySnapshot, ResourceEntry};
