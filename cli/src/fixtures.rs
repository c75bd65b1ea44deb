//! Small, in-code stand-ins for the populations a real deployment would load
//! from YAML. Decoding policy manifests and walking a directory of them is an
//! external collaborator's job (out of scope per the core's own docs); this
//! module only gives the CLI something concrete to build and query, mirroring
//! the six scenarios worked through by hand in the core's test suite.

use netpol_model::{
    Labels, NamespaceDescriptor, Peer, PeerRule, PodDescriptor, PolicyDescriptor, PolicyType,
    Selector,
};
use std::collections::BTreeMap;

pub struct Scenario {
    pub pods: Vec<PodDescriptor>,
    pub namespaces: Vec<NamespaceDescriptor>,
    pub policies: Vec<PolicyDescriptor>,
}

fn ns(name: &str) -> NamespaceDescriptor {
    NamespaceDescriptor {
        name: name.to_string(),
        labels: Labels::default(),
    }
}

fn pod(name: &str, namespace: &str, labels: &[(&str, &str)]) -> PodDescriptor {
    PodDescriptor {
        name: name.to_string(),
        namespace: namespace.to_string(),
        labels: labels.iter().copied().collect(),
    }
}

fn select(key: &str, value: &str) -> Selector {
    Selector {
        match_labels: BTreeMap::from([(key.to_string(), value.to_string())]),
        match_expressions: vec![],
    }
}

/// Three pods in `default`, labels `app:db, app:api, app:api`; one policy
/// selects `app:db` and allows ingress from `app:api`.
pub fn paper_example() -> Scenario {
    let pods = vec![
        pod("a", "default", &[("app", "db")]),
        pod("b", "default", &[("app", "api")]),
        pod("c", "default", &[("app", "api")]),
    ];
    let policy = PolicyDescriptor {
        namespace: "default".into(),
        pod_selector: select("app", "db"),
        policy_types: vec![PolicyType::Ingress],
        ingress: vec![PeerRule {
            peers: vec![Peer::PodSelector(select("app", "api"))],
        }],
        egress: vec![],
    };
    Scenario {
        pods,
        namespaces: vec![ns("default")],
        policies: vec![policy],
    }
}

/// Two unlabeled pods, no policies at all.
pub fn no_policies() -> Scenario {
    Scenario {
        pods: vec![pod("a", "default", &[]), pod("b", "default", &[])],
        namespaces: vec![ns("default")],
        policies: vec![],
    }
}

/// Two pods; a policy selects pod 0 and permits no ingress.
pub fn isolated_pod() -> Scenario {
    let pods = vec![
        pod("a", "default", &[("app", "db")]),
        pod("b", "default", &[("app", "api")]),
    ];
    let policy = PolicyDescriptor {
        namespace: "default".into(),
        pod_selector: select("app", "db"),
        policy_types: vec![PolicyType::Ingress],
        ingress: vec![],
        egress: vec![],
    };
    Scenario {
        pods,
        namespaces: vec![ns("default")],
        policies: vec![policy],
    }
}

/// Three pods with `User:u1, User:u1, User:u2`, no policies.
pub fn user_crosscheck() -> Scenario {
    Scenario {
        pods: vec![
            pod("a", "default", &[("User", "u1")]),
            pod("b", "default", &[("User", "u1")]),
            pod("c", "default", &[("User", "u2")]),
        ],
        namespaces: vec![ns("default")],
        policies: vec![],
    }
}

/// Two policies with identical pod-selector and identical single-peer
/// ingress: each shadows the other.
pub fn shadow() -> Scenario {
    let pods = vec![
        pod("a", "default", &[("app", "db")]),
        pod("b", "default", &[("app", "api")]),
    ];
    let make_policy = || PolicyDescriptor {
        namespace: "default".into(),
        pod_selector: select("app", "db"),
        policy_types: vec![PolicyType::Ingress],
        ingress: vec![PeerRule {
            peers: vec![Peer::PodSelector(select("app", "api"))],
        }],
        egress: vec![],
    };
    Scenario {
        pods,
        namespaces: vec![ns("default")],
        policies: vec![make_policy(), make_policy()],
    }
}

/// Two policies with disjoint pod-selectors and disjoint peers: they never
/// jointly affect a pod.
pub fn conflict() -> Scenario {
    let pods = vec![
        pod("a", "default", &[("app", "db")]),
        pod("b", "default", &[("app", "cache")]),
        pod("c", "default", &[("app", "api")]),
        pod("d", "default", &[("app", "worker")]),
    ];
    let policy_for = |selected: &str, peer: &str| PolicyDescriptor {
        namespace: "default".into(),
        pod_selector: select("app", selected),
        policy_types: vec![PolicyType::Ingress],
        ingress: vec![PeerRule {
            peers: vec![Peer::PodSelector(select("app", peer))],
        }],
        egress: vec![],
    };
    Scenario {
        pods,
        namespaces: vec![ns("default")],
        policies: vec![policy_for("db", "cache"), policy_for("api", "worker")],
    }
}
