use serde_json::Value;

use crate::{Document, ID_FIELD};

/// Equality filter over top-level document fields.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<Clause>,
}

#[derive(Debug, Clone)]
enum Clause {
    Eq(String, Value),
    In(String, Vec<Value>),
}

impl Filter {
    /// Matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            clauses: vec![Clause::Eq(field.into(), value.into())],
        }
    }

    /// Matches documents whose id is one of `ids`.
    pub fn id_in<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = ids.into_iter().map(|id| Value::String(id.into())).collect();
        Self {
            clauses: vec![Clause::In(ID_FIELD.to_string(), ids)],
        }
    }

    pub(crate) fn matches(&self, doc: &Document) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::Eq(field, expected) => doc.get(field) == Some(expected),
            Clause::In(field, candidates) => doc
                .get(field)
                .is_some_and(|value| candidates.contains(value)),
        })
    }
}
