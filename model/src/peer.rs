use crate::selector::Selector;

/// A source (ingress) or destination (egress) specification in a policy
/// rule. `IPBlock` peers are opaque at this layer (the core treats CIDR
/// reasoning as out of scope and drops them during compilation).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Peer {
    PodSelector(Selector),
    NamespaceSelector(Selector),
    PodAndNamespaceSelector(Selector, Selector),
    IpBlock(IpBlock),
}

/// An opaque CIDR token plus its exceptions, carried only so that an IP-block
/// peer can be recorded and skipped rather than silently forgotten.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IpBlock {
    pub cidr: String,
    pub except: Vec<String>,
}

/// A single ingress or egress rule: a list of peers this rule applies to. An
/// empty `peers` list means "all sources" (ingress) or "all destinations"
/// (egress), see the Policy Compiler.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PeerRule {
    pub peers: Vec<Peer>,
}
