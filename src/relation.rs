//! Rows handed to the factorizers by the relation store.
//!
//! A [`Tuple`] is a fixed attribute vector plus the additive cost it
//! contributes to every join result it takes part in. The relation tag is
//! shared between all tuples of one relation.

use std::{fmt, sync::Arc};

/// One database row with its ranking cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Tuple {
    pub values: Vec<f64>,
    pub cost: f64,
    /// Identifier of the owning relation.
    pub relation: Arc<str>,
}

impl Tuple {
    pub fn new(values: Vec<f64>, cost: f64, relation: Arc<str>) -> Self {
        Self {
            values,
            cost,
            relation,
        }
    }

    pub fn arity(&self) -> usize {
        self.values.len()
    }

    pub fn value(&self, attr: usize) -> Option<f64> {
        self.values.get(attr).copied()
    }

    /// Renders the attribute values without the cost.
    pub fn flat_format_no_cost(&self) -> String {
        self.values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.relation, self.flat_format_no_cost())
    }
}

/// A named list of tuples sharing one schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: Arc<str>,
    pub schema: Vec<String>,
    pub tuples: Vec<Tuple>,
}

impl Relation {
    pub fn new(id: impl Into<Arc<str>>, schema: Vec<String>) -> Self {
        Self {
            id: id.into(),
            schema,
            tuples: Vec::new(),
        }
    }

    /// Appends a tuple built from `values`, tagging it with this relation.
    pub fn insert(&mut self, values: Vec<f64>, cost: f64) {
        let tuple = Tuple::new(values, cost, Arc::clone(&self.id));
        self.tuples.push(tuple);
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Relation {}", self.id)?;
        writeln!(f, "{}", self.schema.join(" "))?;
        for t in &self.tuples {
            writeln!(f, "{} | {}", t.flat_format_no_cost(), t.cost)?;
        }
        write!(f, "End of {}", self.id)
    }
}
