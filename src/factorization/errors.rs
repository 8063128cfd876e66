use std::fmt::Display;

use thiserror::Error;

use crate::{graph::errors::GraphError, predicate::Predicate};

/// The component that rejected its input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Factorizer {
    Dispatcher,
    Equality,
    Band,
    BinaryPartitioning,
    MultiwayPartitioning,
    SharedRanges,
    EquijoinConverter,
}

impl Display for Factorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Factorizer::Dispatcher => write!(f, "Dispatcher"),
            Factorizer::Equality => write!(f, "Equality"),
            Factorizer::Band => write!(f, "Band"),
            Factorizer::BinaryPartitioning => write!(f, "BinaryPartitioning"),
            Factorizer::MultiwayPartitioning => write!(f, "MultiwayPartitioning"),
            Factorizer::SharedRanges => write!(f, "SharedRanges"),
            Factorizer::EquijoinConverter => write!(f, "EquijoinConverter"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum FactorizationError {
    #[error("{factorizer}: predicate `{predicate}` is not supported: {reason}")]
    UnsupportedPredicate {
        factorizer: Factorizer,
        predicate: Predicate,
        reason: String,
    },

    #[error("{factorizer}: malformed input: {reason}")]
    MalformedInput {
        factorizer: Factorizer,
        reason: String,
    },

    #[error("{factorizer}: {source}")]
    Graph {
        factorizer: Factorizer,
        #[source]
        source: GraphError,
    },
}

impl FactorizationError {
    pub fn unsupported(
        factorizer: Factorizer,
        predicate: &Predicate,
        reason: impl Into<String>,
    ) -> Self {
        FactorizationError::UnsupportedPredicate {
            factorizer,
            predicate: *predicate,
            reason: reason.into(),
        }
    }

    pub fn malformed(factorizer: Factorizer, reason: impl Into<String>) -> Self {
        FactorizationError::MalformedInput {
            factorizer,
            reason: reason.into(),
        }
    }

    pub fn graph(factorizer: Factorizer, source: GraphError) -> Self {
        FactorizationError::Graph { factorizer, source }
    }
}

pub type FactorizationResult<T> = Result<T, FactorizationError>;

/// Tags graph errors with the factorizer that hit them.
pub(crate) trait GraphResultExt<T> {
    fn in_factorizer(self, factorizer: Factorizer) -> FactorizationResult<T>;
}

impl<T> GraphResultExt<T> for Result<T, GraphError> {
    fn in_factorizer(self, factorizer: Factorizer) -> FactorizationResult<T> {
        self.map_err(|source| FactorizationError::graph(factorizer, source))
    }
}
