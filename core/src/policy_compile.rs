//! Component E: the Policy Compiler. For each policy, emits the
//! `selected_by_pol`, `ingress_allow_by_pol` and `egress_allow_by_pol` Horn
//! rules from its pod-selector and ingress/egress peer lists (§4.E).

use crate::{
    ids::PolicyId,
    program::Program,
    relations,
    selector_compile::{self, Bodies},
    term::{Literal, Rule, Term},
};
use netpol_model::{Peer, PeerRule, PolicyType};

/// Rule-local variable conventions shared by every rule this module emits:
/// `X` is the pod being selected or the peer pod, `Y` is the peer's
/// namespace (only bound when a peer carries a namespace selector).
const X: usize = 0;
const Y: usize = 1;

pub(crate) fn emit_policy_rules(program: &mut Program, q: PolicyId) {
    let policy = program.policies()[q.index()].clone();
    let ns_idx = program
        .namespace_idx(&policy.namespace)
        .expect("build() already validated every policy's namespace")
        .as_u32();

    emit_selected_by_pol(program, q, &policy, ns_idx);

    if policy.has_type(PolicyType::Ingress) {
        emit_traffic_rules(
            program,
            q,
            ns_idx,
            &policy.ingress,
            relations::INGRESS_ALLOW_BY_POL,
        );
    }
    if policy.has_type(PolicyType::Egress) {
        emit_traffic_rules(
            program,
            q,
            ns_idx,
            &policy.egress,
            relations::EGRESS_ALLOW_BY_POL,
        );
    }
}

fn emit_selected_by_pol(
    program: &mut Program,
    q: PolicyId,
    policy: &netpol_model::PolicyDescriptor,
    ns_idx: u32,
) {
    let bodies = selector_compile::compile_pod(program, &policy.pod_selector, X)
        .expect("selector compilation is infallible except for interner exhaustion");
    for mut body in bodies {
        body.push(namespace_literal(X, ns_idx));
        program.engine.add_rule(Rule::rule(
            relations::SELECTED_BY_POL,
            vec![Term::var(X), Term::konst(q.as_u32())],
            body,
        ));
    }
}

/// Shared by ingress and egress: emits `relation(peer_var, q)` rules from a
/// policy's ordered peer-rule list. An empty peer list on a rule means "all
/// sources/destinations"; `IPBlock` peers are dropped (logged, not erred).
fn emit_traffic_rules(
    program: &mut Program,
    q: PolicyId,
    policy_ns_idx: u32,
    rules: &[PeerRule],
    relation: &str,
) {
    for rule in rules {
        if rule.peers.is_empty() {
            program.engine.add_rule(Rule::rule(
                relation,
                vec![Term::var(X), Term::konst(q.as_u32())],
                vec![Literal::pos(relations::IS_POD, vec![Term::var(X)])],
            ));
            continue;
        }

        for peer in &rule.peers {
            for body in compile_peer(program, peer, policy_ns_idx) {
                program.engine.add_rule(Rule::rule(
                    relation,
                    vec![Term::var(X), Term::konst(q.as_u32())],
                    body,
                ));
            }
        }
    }
}

/// Compiles one peer to its set of alternative rule bodies over `X` (and,
/// when the peer carries a namespace selector, `Y`). Returns no bodies at
/// all for `IPBlock`, per §4.E: it produces no rule.
fn compile_peer(program: &mut Program, peer: &Peer, policy_ns_idx: u32) -> Bodies {
    match peer {
        Peer::PodSelector(sel) => {
            let mut bodies = selector_compile::compile_pod(program, sel, X)
                .expect("selector compilation is infallible except for interner exhaustion");
            for body in &mut bodies {
                body.push(namespace_literal(X, policy_ns_idx));
            }
            bodies
        }
        Peer::NamespaceSelector(nsel) => {
            let ns_bodies = selector_compile::compile_namespace(program, nsel, Y)
                .expect("selector compilation is infallible except for interner exhaustion");
            ns_bodies
                .into_iter()
                .map(|mut body| {
                    body.insert(0, Literal::pos(relations::NAMESPACE, vec![Term::var(X), Term::var(Y)]));
                    body
                })
                .collect()
        }
        Peer::PodAndNamespaceSelector(psel, nsel) => {
            let pod_bodies = selector_compile::compile_pod(program, psel, X)
                .expect("selector compilation is infallible except for interner exhaustion");
            let ns_bodies = selector_compile::compile_namespace(program, nsel, Y)
                .expect("selector compilation is infallible except for interner exhaustion");
            let mut out = Vec::with_capacity(pod_bodies.len() * ns_bodies.len());
            for pbody in &pod_bodies {
                for nbody in &ns_bodies {
                    let mut body = pbody.clone();
                    body.push(Literal::pos(relations::NAMESPACE, vec![Term::var(X), Term::var(Y)]));
                    body.extend(nbody.iter().cloned());
                    out.push(body);
                }
            }
            out
        }
        Peer::IpBlock(block) => {
            tracing::warn!(cidr = %block.cidr, "dropping IP-block peer: CIDR reasoning is out of scope");
            vec![]
        }
    }
}

fn namespace_literal(pod_var: usize, ns_idx: u32) -> Literal {
    Literal::pos(relations::NAMESPACE, vec![Term::var(pod_var), Term::konst(ns_idx)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BuildConfig, program::Program};
    use netpol_model::{Labels, NamespaceDescriptor, PodDescriptor, Selector};

    fn pod(name: &str, ns: &str, labels: &[(&str, &str)]) -> PodDescriptor {
        PodDescriptor {
            name: name.into(),
            namespace: ns.into(),
            labels: labels.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }

    #[test]
    fn empty_pod_selector_scopes_to_policy_namespace() {
        let pods = vec![pod("a", "default", &[]), pod("b", "other", &[])];
        let namespaces = vec![
            NamespaceDescriptor {
                name: "default".into(),
                labels: Labels::default(),
            },
            NamespaceDescriptor {
                name: "other".into(),
                labels: Labels::default(),
            },
        ];
        let policy = netpol_model::PolicyDescriptor {
            namespace: "default".into(),
            pod_selector: Selector::empty(),
            policy_types: vec![PolicyType::Ingress],
            ingress: vec![],
            egress: vec![],
        };
        let mut program = Program::build(pods, vec![policy], namespaces, BuildConfig::new(true, false, false)).unwrap();
        let selected: Vec<_> = program
            .engine
            .relation(relations::SELECTED_BY_POL)
            .unwrap()
            .clone()
            .into_iter()
            .collect();
        assert_eq!(selected, vec![vec![0, 0]]);
    }

    #[test]
    fn does_not_exist_pod_selector_excludes_pods_carrying_the_key() {
        // Regression test for a negation-ordering bug: `selected_by_pol`'s
        // body is `selector-compile(sel, p) ++ [namespace(p, ns)]`, so a
        // `DoesNotExist` selector puts its `Neg(key__exists, p)` literal
        // before the `namespace` literal that actually binds `p`. The
        // engine must still evaluate this correctly.
        let pods = vec![
            pod("a", "default", &[("canary", "true")]),
            pod("b", "default", &[]),
            pod("c", "default", &[]),
        ];
        let namespaces = vec![NamespaceDescriptor {
            name: "default".into(),
            labels: Labels::default(),
        }];
        let selector = Selector {
            match_labels: Default::default(),
            match_expressions: vec![netpol_model::Expression {
                key: "canary".into(),
                operator: netpol_model::Operator::DoesNotExist,
                values: Default::default(),
            }],
        };
        let policy = netpol_model::PolicyDescriptor {
            namespace: "default".into(),
            pod_selector: selector,
            policy_types: vec![PolicyType::Ingress],
            ingress: vec![],
            egress: vec![],
        };
        let mut program = Program::build(pods, vec![policy], namespaces, BuildConfig::new(true, false, false)).unwrap();
        let selected: std::collections::BTreeSet<u32> = program
            .engine
            .relation(relations::SELECTED_BY_POL)
            .unwrap()
            .iter()
            .map(|tuple| tuple[0])
            .collect();
        assert_eq!(selected, std::collections::BTreeSet::from([1, 2]));
    }
}
