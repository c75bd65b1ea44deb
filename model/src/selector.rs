use crate::labels::Map;
use std::collections::BTreeSet;

/// Selects pods or namespaces by their labels. The result of `match_labels`
/// and `match_expressions` are ANDed, matching Kubernetes `LabelSelector`
/// semantics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selector {
    pub match_labels: Map,
    pub match_expressions: Vec<Expression>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Expression {
    pub key: String,
    pub operator: Operator,
    pub values: BTreeSet<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Operator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl Selector {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Indicates whether this selector matches every pod (or namespace) it's
    /// asked about, i.e. both `match_labels` and `match_expressions` are
    /// empty. An empty selector selects all, not none.
    pub fn selects_all(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }

    /// A direct, in-memory evaluation of the selector against a label map.
    /// Used by tests to cross-check the compiled Horn-rule semantics; the
    /// engine itself never calls this; selectors are compiled to relations,
    /// not interpreted at query time.
    #[cfg(test)]
    pub(crate) fn matches(&self, labels: &Map) -> bool {
        for (k, v) in &self.match_labels {
            if labels.get(k) != Some(v) {
                return false;
            }
        }
        for expr in &self.match_expressions {
            if !expr.matches(labels) {
                return false;
            }
        }
        true
    }
}

impl Expression {
    #[cfg(test)]
    fn matches(&self, labels: &Map) -> bool {
        match (self.operator, labels.get(&self.key)) {
            (Operator::In, Some(v)) => self.values.contains(v),
            (Operator::In, None) => false,
            (Operator::NotIn, Some(v)) => !self.values.contains(v),
            // The key must be present for `NotIn` to match: this system's
            // Horn-rule encoding is `k__exists(x) ∧ ¬k(x, v)`, not the more
            // permissive "absent key also matches" reading some selector
            // implementations use.
            (Operator::NotIn, None) => false,
            (Operator::Exists, present) => present.is_some(),
            (Operator::DoesNotExist, present) => present.is_none(),
        }
    }
}
