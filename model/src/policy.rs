use crate::{peer::PeerRule, selector::Selector};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PolicyType {
    Ingress,
    Egress,
}

/// A declaration of which pods it applies to (`pod_selector`, scoped to
/// `namespace`) and which peers may reach them, by direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyDescriptor {
    pub namespace: String,
    pub pod_selector: Selector,
    pub policy_types: Vec<PolicyType>,
    pub ingress: Vec<PeerRule>,
    pub egress: Vec<PeerRule>,
}

impl PolicyDescriptor {
    pub fn has_type(&self, ty: PolicyType) -> bool {
        self.policy_types.contains(&ty)
    }
}
