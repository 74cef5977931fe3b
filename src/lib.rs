//! # landscape
//!
//! Software landscape catalog builder and publication-mention reconciliation.
//!
//! ## Modules
//!
//! - [`catalog`] - Candidate entries and the `repo_url`-keyed project catalog
//! - [`linkage`] - Similarity ratio and greedy record linkage of titles
//! - [`publications`] - Per-project title union and publication metrics
//! - [`pipeline`] - The `seek` and `mentions` stages
//! - [`github`] - GitHub search and repository metadata client
//! - [`gscholar`] - Google Scholar search client
//! - [`biorxiv`] - bioRxiv preprint search client
//! - [`scrna_tools`] - scRNA-tools CSV export reader
//! - [`sources`] - Traits the stages take their collaborators through
//! - [`config`] - Data layout and defaults
//! - [`error`] - Custom error types
//!
//! ## Usage
//!
//! ```rust
//! use landscape::linkage::{distinct_by_threshold, LinkagePolicy};
//!
//! let titles = vec![
//!     "Pycytominer: data processing functions".to_string(),
//!     "Pycytominer: Data processing functions".to_string(),
//!     "CytoTable".to_string(),
//! ];
//! let distinct = distinct_by_threshold(&titles, 90, LinkagePolicy::Corrected)?;
//! assert_eq!(distinct.len(), 2);
//! # Ok::<(), landscape::LandscapeError>(())
//! ```

pub mod biorxiv;
pub mod catalog;
pub mod config;
pub mod error;
pub mod github;
pub mod gscholar;
pub mod linkage;
pub mod pipeline;
pub mod publications;
pub mod scrna_tools;
pub mod sources;

pub use error::{LandscapeError, Result};
