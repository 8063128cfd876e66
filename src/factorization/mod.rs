//! Factorization of binary theta-joins into state graphs.
//!
//! [`factorize`] inspects one conjunction and routes it to the equality
//! factorizer or to one of the three inequality strategies. Disjunctions go
//! through [`factorize_dnf`], which encodes each conjunct independently into
//! the same pair of stages.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    graph::NodeId,
    predicate::{split_leading_equalities, Conjunction, Predicate, PredicateKind},
};

pub mod band;
pub mod binary_partitioning;
pub mod common;
pub mod connector;
pub mod equality;
pub mod equijoin_converter;
pub mod errors;
pub mod multiway_partitioning;
pub mod shared_ranges;

pub use connector::NodeConnector;
pub use errors::{FactorizationError, FactorizationResult, Factorizer};

/// Which inequality strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorizationMethod {
    /// Multiway partitioning for a lone trailing predicate, binary
    /// partitioning for everything else.
    #[default]
    Auto,
    BinaryPart,
    MultiPart,
    SharedRanges,
}

impl FromStr for FactorizationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(FactorizationMethod::Auto),
            "binary_part" => Ok(FactorizationMethod::BinaryPart),
            "multi_part" => Ok(FactorizationMethod::MultiPart),
            "shared_ranges" => Ok(FactorizationMethod::SharedRanges),
            other => Err(format!(
                "unknown factorization method '{other}', expected auto|binary_part|multi_part|shared_ranges"
            )),
        }
    }
}

impl fmt::Display for FactorizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorizationMethod::Auto => write!(f, "auto"),
            FactorizationMethod::BinaryPart => write!(f, "binary_part"),
            FactorizationMethod::MultiPart => write!(f, "multi_part"),
            FactorizationMethod::SharedRanges => write!(f, "shared_ranges"),
        }
    }
}

/// Predicate counts of one conjunction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConjunctionShape {
    pub equalities: usize,
    /// Less and Greater.
    pub inequalities: usize,
    pub non_equalities: usize,
    pub bands: usize,
}

impl ConjunctionShape {
    /// Counts the predicates, rejecting an equality that follows any other kind.
    pub fn analyze(conjunction: &[Predicate]) -> FactorizationResult<Self> {
        let mut shape = Self::default();
        for p in conjunction {
            match p.kind {
                PredicateKind::Equal if shape.trailing() > 0 => {
                    return Err(FactorizationError::malformed(
                        Factorizer::Dispatcher,
                        format!("equality `{p}` must precede all other predicates"),
                    ));
                }
                PredicateKind::Equal => shape.equalities += 1,
                PredicateKind::Less | PredicateKind::Greater => shape.inequalities += 1,
                PredicateKind::NotEqual => shape.non_equalities += 1,
                PredicateKind::Band => shape.bands += 1,
            }
        }
        Ok(shape)
    }

    /// Number of predicates after the equalities.
    pub fn trailing(&self) -> usize {
        self.inequalities + self.non_equalities + self.bands
    }

    /// Only equalities, or nothing at all (a Cartesian product).
    pub fn is_equijoin(&self) -> bool {
        self.trailing() == 0
    }
}

/// The factorizer entry a conjunction ends up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strategy {
    Equality,
    BinaryPartitioning,
    MultiwayInequality,
    MultiwayNonEquality,
    MultiwayBand,
    SharedRanges,
}

fn choose_strategy(
    conjunction: &[Predicate],
    method: FactorizationMethod,
) -> FactorizationResult<Strategy> {
    let shape = ConjunctionShape::analyze(conjunction)?;
    if shape.is_equijoin() {
        return Ok(Strategy::Equality);
    }
    let (_, rest) = split_leading_equalities(conjunction);
    let lone = match rest {
        [single] => Some(single.kind),
        _ => None,
    };
    let multiway = match lone {
        Some(PredicateKind::Less | PredicateKind::Greater) => Some(Strategy::MultiwayInequality),
        Some(PredicateKind::NotEqual) => Some(Strategy::MultiwayNonEquality),
        Some(PredicateKind::Band) => Some(Strategy::MultiwayBand),
        _ => None,
    };

    match method {
        FactorizationMethod::Auto => Ok(multiway.unwrap_or(Strategy::BinaryPartitioning)),
        FactorizationMethod::BinaryPart => Ok(Strategy::BinaryPartitioning),
        FactorizationMethod::MultiPart => match (multiway, rest) {
            (Some(strategy), _) => Ok(strategy),
            (None, [_, extra, ..]) => Err(FactorizationError::unsupported(
                Factorizer::MultiwayPartitioning,
                extra,
                "multiway partitioning handles a single inequality, non-equality or band",
            )),
            (None, _) => Err(FactorizationError::malformed(
                Factorizer::Dispatcher,
                "no predicate after the equalities",
            )),
        },
        FactorizationMethod::SharedRanges => match rest {
            [single] if single.kind == PredicateKind::Less => Ok(Strategy::SharedRanges),
            [single] => Err(FactorizationError::unsupported(
                Factorizer::SharedRanges,
                single,
                "shared ranges handles a single less-than predicate",
            )),
            [_, extra, ..] => Err(FactorizationError::unsupported(
                Factorizer::SharedRanges,
                extra,
                "shared ranges handles a single less-than predicate",
            )),
            [] => Err(FactorizationError::malformed(
                Factorizer::Dispatcher,
                "no predicate after the equalities",
            )),
        },
    }
}

fn run_strategy(
    strategy: Strategy,
    conn: &mut NodeConnector<'_>,
    left: &[NodeId],
    right: &[NodeId],
    conjunction: &[Predicate],
) -> FactorizationResult<()> {
    match strategy {
        Strategy::Equality => equality::factorize_equality(conn, left, right, conjunction),
        Strategy::BinaryPartitioning => {
            binary_partitioning::factorize_conjunction(conn, left, right, conjunction)
        }
        Strategy::MultiwayInequality => {
            multiway_partitioning::factorize_inequality(conn, left, right, conjunction)
        }
        Strategy::MultiwayNonEquality => {
            multiway_partitioning::factorize_nonequality(conn, left, right, conjunction)
        }
        Strategy::MultiwayBand => {
            multiway_partitioning::factorize_band(conn, left, right, conjunction)
        }
        Strategy::SharedRanges => shared_ranges::factorize_inequality(conn, left, right, conjunction),
    }
}

/// Encodes the pairs of `left × right` satisfying `conjunction` into the
/// graph behind `conn`.
///
/// `conjunction` must list its equalities first. An empty conjunction is a
/// Cartesian product.
pub fn factorize(
    conn: &mut NodeConnector<'_>,
    left: &[NodeId],
    right: &[NodeId],
    conjunction: &[Predicate],
    method: FactorizationMethod,
) -> FactorizationResult<()> {
    let strategy = choose_strategy(conjunction, method)?;
    log::debug!("factorize: method {method} -> {strategy:?}");
    run_strategy(strategy, conn, left, right, conjunction)
}

/// Encodes a disjunction of conjunctions, one conjunct at a time. A pair
/// satisfying several conjuncts is reachable once per conjunct.
///
/// Every conjunct is checked before the first one is encoded.
pub fn factorize_dnf(
    conn: &mut NodeConnector<'_>,
    left: &[NodeId],
    right: &[NodeId],
    dnf: &[Conjunction],
    method: FactorizationMethod,
) -> FactorizationResult<()> {
    let strategies = dnf
        .iter()
        .map(|conjunction| choose_strategy(conjunction, method))
        .collect::<FactorizationResult<Vec<_>>>()?;
    let all_predicates: Vec<Predicate> = dnf.iter().flatten().copied().collect();
    common::check_inputs(conn, left, right, &all_predicates, Factorizer::Dispatcher)?;

    log::debug!(
        "factorize_dnf: {} conjuncts, method {method}, {} left, {} right",
        dnf.len(),
        left.len(),
        right.len()
    );
    for (strategy, conjunction) in strategies.into_iter().zip(dnf) {
        run_strategy(strategy, conn, left, right, conjunction)?;
    }
    Ok(())
}
