use crate::error::{Error, Result};
use ahash::AHashMap as HashMap;

/// The number of columns a relation is defined over. This system only ever
/// needs unary or binary relations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    One,
    Two,
}

impl Arity {
    pub fn len(self) -> usize {
        match self {
            Arity::One => 1,
            Arity::Two => 2,
        }
    }
}

/// Which of the three disjoint dictionaries a relation belongs to.
#[derive(Copy, Clone, PartialEq, Eq)]
pub enum RelKind {
    /// Pod-indexed label relations (`key`, `key__exists`).
    Label,
    /// Namespace-indexed label relations (`key__namespace`, `key__namespace__exists`).
    NamespaceLabel,
    /// Structural/analytic relations shared across the whole program.
    Core,
}

/// Three disjoint dictionaries of named, typed function symbols: label
/// relations (pod-indexed), namespace-label relations (namespace-indexed),
/// and core relations (analytic/structural).
#[derive(Debug, Default)]
pub struct RelationRegistry {
    label_rels: HashMap<String, Arity>,
    ns_label_rels: HashMap<String, Arity>,
    core_rels: HashMap<String, Arity>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` with the given `arity` in the bucket named by
    /// `kind`. A core relation must be unique across *all* buckets; a label
    /// or namespace-label relation need only be unique within its own
    /// bucket (the same key may legitimately be both a pod label and a
    /// namespace label, in disjoint buckets).
    pub fn register(&mut self, name: &str, arity: Arity, kind: RelKind) -> Result<()> {
        if kind == RelKind::Core
            && (self.label_rels.contains_key(name)
                || self.ns_label_rels.contains_key(name)
                || self.core_rels.contains_key(name))
        {
            return Err(Error::DuplicateRelation(name.to_string()));
        }

        let bucket = match kind {
            RelKind::Label => &mut self.label_rels,
            RelKind::NamespaceLabel => &mut self.ns_label_rels,
            RelKind::Core => &mut self.core_rels,
        };
        if bucket.contains_key(name) {
            return Err(Error::DuplicateRelation(name.to_string()));
        }
        tracing::debug!(relation = name, ?kind, "registered relation");
        bucket.insert(name.to_string(), arity);
        Ok(())
    }

    /// Registers `name` with `arity` in `kind`'s bucket if it isn't already
    /// present, otherwise is a no-op. Used for the label relations that the
    /// fact emitter creates the first time it sees a key.
    pub fn register_if_absent(&mut self, name: &str, arity: Arity, kind: RelKind) {
        let bucket = match kind {
            RelKind::Label => &mut self.label_rels,
            RelKind::NamespaceLabel => &mut self.ns_label_rels,
            RelKind::Core => &mut self.core_rels,
        };
        if let std::collections::hash_map::Entry::Vacant(e) = bucket.entry(name.to_string()) {
            e.insert(arity);
            tracing::debug!(relation = name, ?kind, "registered relation (if-absent)");
        }
    }

    pub fn get(&self, name: &str, kind: RelKind) -> Option<Arity> {
        match kind {
            RelKind::Label => self.label_rels.get(name).copied(),
            RelKind::NamespaceLabel => self.ns_label_rels.get(name).copied(),
            RelKind::Core => self.core_rels.get(name).copied(),
        }
    }

    pub fn contains(&self, name: &str, kind: RelKind) -> bool {
        self.get(name, kind).is_some()
    }

    pub fn core_names(&self) -> impl Iterator<Item = &str> {
        self.core_rels.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for RelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RelKind::Label => "label",
            RelKind::NamespaceLabel => "namespace_label",
            RelKind::Core => "core",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_relation_must_be_globally_unique() {
        let mut reg = RelationRegistry::new();
        reg.register("is_pod", Arity::One, RelKind::Core).unwrap();
        let err = reg.register("is_pod", Arity::One, RelKind::Core).unwrap_err();
        assert!(matches!(err, Error::DuplicateRelation(n) if n == "is_pod"));
    }

    #[test]
    fn label_and_namespace_label_buckets_are_disjoint() {
        let mut reg = RelationRegistry::new();
        reg.register("app", Arity::Two, RelKind::Label).unwrap();
        // Same name in a different bucket is fine.
        reg.register("app", Arity::Two, RelKind::NamespaceLabel)
            .unwrap();
        assert!(reg.contains("app", RelKind::Label));
        assert!(reg.contains("app", RelKind::NamespaceLabel));
    }

    #[test]
    fn register_if_absent_does_not_duplicate() {
        let mut reg = RelationRegistry::new();
        reg.register_if_absent("app", Arity::Two, RelKind::Label);
        reg.register_if_absent("app", Arity::Two, RelKind::Label);
        assert!(reg.contains("app", RelKind::Label));
    }
}
