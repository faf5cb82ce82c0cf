//! Core traits for the reply pipeline
//!
//! Components sit behind these traits so that:
//! - Implementations can be swapped without touching the composer
//! - Tests can substitute mocks
//!
//! ```text
//! Classification:
//!   - Classifier: message text -> crisis flag + matched topics
//! ```

mod classifier;

pub use classifier::Classifier;
