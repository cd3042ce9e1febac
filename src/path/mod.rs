//! Candidate path generation and selection per traffic class.
pub mod error;
pub mod generator;
#[allow(clippy::module_inception)]
pub mod path;
pub mod predicate;
pub mod selector;

pub use error::PathError;
pub use generator::{generate_paths_per_class, ClassPaths, PathsPerClass};
pub use path::{Path, PathId};
pub use predicate::{HasMiddlebox, NullPredicate, PathPredicate, ServiceChain};
pub use selector::{choose_rand, choose_rand_seeded, choose_shortest};
