use crate::labels::Labels;

/// A schedulable workload: a name, a namespace, and a string-keyed label bag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PodDescriptor {
    pub name: String,
    pub namespace: String,
    pub labels: Labels,
}

/// A labeled grouping of pods.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceDescriptor {
    pub name: String,
    pub labels: Labels,
}
