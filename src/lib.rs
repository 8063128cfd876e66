//! Thetajoin - factorized theta-joins for ranked enumeration
//!
//! This crate encodes the result of a binary join whose condition mixes
//! equalities, inequalities, non-equalities and band predicates as a state
//! graph whose paths are exactly the joining pairs:
//! - Equality grouping through one intermediate node per join key
//! - Binary partitioning for whole conjunctions
//! - Multiway partitioning and shared ranges for a single trailing predicate
//! - Conversion of one-layer graphs back into an equijoin

pub mod config;
pub mod factorization;
pub mod graph;
pub mod predicate;
pub mod relation;

pub use config::{ConfigError, FactorizationConfig};
pub use factorization::{factorize, factorize_dnf, FactorizationError, FactorizationMethod};
pub use graph::{NodeId, NodeMode, StateGraph};
pub use predicate::{Conjunction, Dnf, Predicate, PredicateKind};
pub use relation::{Relation, Tuple};
