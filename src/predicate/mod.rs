//! Join predicates between two relations.
//!
//! A predicate compares one attribute of the left tuple with one attribute of
//! the right tuple. For every kind except [`PredicateKind::Band`] the offset is
//! added to the right value before comparing; for a band it is the epsilon.
//!
//! Join conditions arrive either as a [`Conjunction`] (equalities first) or as
//! a [`Dnf`], a disjunction of such conjunctions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::relation::Tuple;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    /// `left = right + offset`
    Equal,
    /// `left < right + offset`
    Less,
    /// `left > right + offset`
    Greater,
    /// `left != right + offset`
    NotEqual,
    /// `|left - right| < offset`
    Band,
}

impl PredicateKind {
    pub fn is_inequality(&self) -> bool {
        matches!(self, PredicateKind::Less | PredicateKind::Greater)
    }
}

/// A binary comparison between `left[left_attr]` and `right[right_attr]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    pub kind: PredicateKind,
    pub left_attr: usize,
    pub right_attr: usize,
    #[serde(default)]
    pub offset: f64,
}

pub type Conjunction = Vec<Predicate>;

/// Outer disjunction of conjunctions.
pub type Dnf = Vec<Conjunction>;

impl Predicate {
    pub fn new(kind: PredicateKind, left_attr: usize, right_attr: usize, offset: f64) -> Self {
        Self {
            kind,
            left_attr,
            right_attr,
            offset,
        }
    }

    pub fn equal(left_attr: usize, right_attr: usize) -> Self {
        Self::new(PredicateKind::Equal, left_attr, right_attr, 0.0)
    }

    pub fn less(left_attr: usize, right_attr: usize) -> Self {
        Self::new(PredicateKind::Less, left_attr, right_attr, 0.0)
    }

    pub fn greater(left_attr: usize, right_attr: usize) -> Self {
        Self::new(PredicateKind::Greater, left_attr, right_attr, 0.0)
    }

    pub fn not_equal(left_attr: usize, right_attr: usize) -> Self {
        Self::new(PredicateKind::NotEqual, left_attr, right_attr, 0.0)
    }

    pub fn band(left_attr: usize, right_attr: usize, epsilon: f64) -> Self {
        Self::new(PredicateKind::Band, left_attr, right_attr, epsilon)
    }

    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    pub fn is_equality(&self) -> bool {
        self.kind == PredicateKind::Equal
    }

    /// The same comparison with the kind replaced, keeping attributes and offset.
    pub fn with_kind(self, kind: PredicateKind) -> Self {
        Self { kind, ..self }
    }

    /// Evaluates the predicate on two raw attribute values.
    pub fn holds(&self, left_val: f64, right_val: f64) -> bool {
        match self.kind {
            PredicateKind::Equal => left_val == right_val + self.offset,
            PredicateKind::Less => left_val < right_val + self.offset,
            PredicateKind::Greater => left_val > right_val + self.offset,
            PredicateKind::NotEqual => left_val != right_val + self.offset,
            PredicateKind::Band => (left_val - right_val).abs() < self.offset,
        }
    }

    /// Tests whether a left/right tuple pair satisfies this predicate.
    /// Missing attributes never satisfy anything.
    pub fn satisfied_by(&self, left: &Tuple, right: &Tuple) -> bool {
        match (left.value(self.left_attr), right.value(self.right_attr)) {
            (Some(l), Some(r)) => self.holds(l, r),
            _ => false,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.kind {
            PredicateKind::Equal => "=",
            PredicateKind::Less => "<",
            PredicateKind::Greater => ">",
            PredicateKind::NotEqual => "!=",
            PredicateKind::Band => {
                return write!(
                    f,
                    "|L[{}] - R[{}]| < {}",
                    self.left_attr, self.right_attr, self.offset
                );
            }
        };
        write!(f, "L[{}] {} R[{}]", self.left_attr, op, self.right_attr)?;
        if self.offset != 0.0 {
            write!(f, " {:+}", self.offset)?;
        }
        Ok(())
    }
}

pub fn satisfies_conjunction(conjunction: &[Predicate], left: &Tuple, right: &Tuple) -> bool {
    conjunction.iter().all(|p| p.satisfied_by(left, right))
}

/// An empty disjunction matches nothing.
pub fn satisfies_dnf(dnf: &[Conjunction], left: &Tuple, right: &Tuple) -> bool {
    dnf.iter().any(|c| satisfies_conjunction(c, left, right))
}

/// Splits a conjunction into its leading run of equalities and the rest.
/// Equalities that appear after the first non-equality stay in the rest.
pub fn split_leading_equalities(conjunction: &[Predicate]) -> (&[Predicate], &[Predicate]) {
    let eq_idx = conjunction
        .iter()
        .position(|p| !p.is_equality())
        .unwrap_or(conjunction.len());
    conjunction.split_at(eq_idx)
}
