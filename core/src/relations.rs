//! Names of the core relations registered exactly once per §3's invariants.

pub const NAMESPACE: &str = "namespace";
pub const IS_POD: &str = "is_pod";
pub const IS_POL: &str = "is_pol";
pub const SELECTED_BY_POL: &str = "selected_by_pol";
pub const INGRESS_ALLOW_BY_POL: &str = "ingress_allow_by_pol";
pub const EGRESS_ALLOW_BY_POL: &str = "egress_allow_by_pol";
pub const INGRESS_TRAFFIC: &str = "ingress_traffic";
pub const EGRESS_TRAFFIC: &str = "egress_traffic";
pub const HAVE_PATH: &str = "have_path";
pub const EDGE: &str = "edge";
pub const SELECTED_BY_ANY: &str = "selected_by_any";

/// The never-true predicate the selector compiler falls back to when a
/// selector references a label key that no pod or namespace ever carries.
pub const ABSURD: &str = "__absurd";

/// The engine's fact store is a single flat, string-keyed map with no
/// bucket separation (see `Engine`). A pod labeled with a key that happens
/// to match a core relation's name (`namespace`, `edge`, ...) would
/// otherwise alias and corrupt that relation. Label relations are always
/// named through `label_name`/`namespace_label_name` rather than by the
/// bare key, so no label key can ever collide with a core relation name.
pub fn label_name(key: &str) -> String {
    format!("label__{key}")
}

pub fn exists_name(relation: &str) -> String {
    format!("{relation}__exists")
}

pub fn namespace_label_name(key: &str) -> String {
    format!("nslabel__{key}")
}
