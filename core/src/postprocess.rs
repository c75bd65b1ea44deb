//! Postprocess analytics. Each function here registers a small additional
//! Horn program on top of an already-built `Program`, queries it, and
//! reconciles the answer back into the pod/policy index sets that make up
//! the crate's external query surface.
//!
//! These passes *mutate* the program (new relations, new rules). Running the
//! same analytic twice with the same argument re-registers the same
//! relation name and fails with `Error::DuplicateRelation`; callers are
//! expected to call each analytic at most once per argument.

use crate::{
    error::Result,
    program::Program,
    query::{self, Answer, Cancellation},
    registry::{Arity, RelKind},
    relations,
    term::{Literal, Rule, Term},
};
use std::collections::BTreeSet;

const SEL: usize = 0;
const RANDOM: usize = 1;

/// Whether a query found any satisfying tuple. Named and surfaced
/// separately from the tuple set itself (rather than inferring it from
/// emptiness) because an unsatisfiable query is a distinct, non-error
/// outcome of the query surface, not a property derived after the fact.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Satisfiability {
    Sat,
    Unsat,
}

fn satisfiability(answer: &Answer) -> Satisfiability {
    match answer {
        Answer::Unsat => Satisfiability::Unsat,
        _ => Satisfiability::Sat,
    }
}

fn no_deadline(program: &mut Program, relation: &str, arity: usize) -> Result<(Satisfiability, Vec<crate::term::Tuple>)> {
    let cancel = Cancellation::new();
    let answer = query::query(program, relation, arity, None, &cancel)?;
    let sat = satisfiability(&answer);
    Ok((sat, answer.parse(arity)))
}

/// `all_edges() -> set<(src_idx, dst_idx)>`.
pub fn all_edges(program: &mut Program) -> Result<(Satisfiability, BTreeSet<(u32, u32)>)> {
    let (sat, tuples) = no_deadline(program, relations::EDGE, 2)?;
    Ok((sat, tuples.into_iter().map(|t| (t[0], t[1])).collect()))
}

/// `all_reach_isolate() -> (list<idx>, list<idx>)`. Built from the bit
/// matrix of `edge`: `all_reachable` are indices every other pod can reach;
/// `all_isolated` are indices no other pod reaches at all.
pub fn all_reach_isolate(program: &mut Program) -> Result<(Vec<u32>, Vec<u32>)> {
    let n = program.pod_count();
    let (_, tuples) = no_deadline(program, relations::EDGE, 2)?;
    let matrix = query::bit_matrix(&tuples, n, true);

    let mut reachable = Vec::new();
    let mut isolated = Vec::new();
    for i in 0..n {
        let all_reach = (0..n).all(|j| j == i || matrix[j][i]);
        let all_isolate = (0..n).all(|j| j == i || !matrix[j][i]);
        if all_reach {
            reachable.push(i as u32);
        }
        if all_isolate {
            isolated.push(i as u32);
        }
    }
    Ok((reachable, isolated))
}

/// `user_crosscheck(label_key) -> set<idx>`. Registers
/// `user_violation__<label_key>(sel) :- is_pod(sel), is_pod(random),
/// edge(random, sel), label(random, v0), label(sel, v1), v0 != v1` and
/// returns the violating pod indices.
pub fn user_crosscheck(program: &mut Program, label_key: &str) -> Result<(Satisfiability, Vec<u32>)> {
    let relation_name = format!("user_violation__{label_key}");
    program.registry.register(&relation_name, Arity::One, RelKind::Core)?;

    let label_rel = relations::label_name(label_key);
    const V0: usize = 2;
    const V1: usize = 3;
    program.engine.add_rule(Rule::rule(
        relation_name.clone(),
        vec![Term::var(SEL)],
        vec![
            Literal::pos(relations::IS_POD, vec![Term::var(SEL)]),
            Literal::pos(relations::IS_POD, vec![Term::var(RANDOM)]),
            Literal::pos(relations::EDGE, vec![Term::var(RANDOM), Term::var(SEL)]),
            Literal::pos(label_rel.clone(), vec![Term::var(RANDOM), Term::var(V0)]),
            Literal::pos(label_rel, vec![Term::var(SEL), Term::var(V1)]),
            Literal::NotEqual(Term::var(V0), Term::var(V1)),
        ],
    ));

    let (sat, tuples) = no_deadline(program, &relation_name, 1)?;
    Ok((sat, tuples.into_iter().map(|t| t[0]).collect()))
}

/// `system_isolation(pod_idx) -> set<idx>`. Registers
/// `system_isolation__<pod_idx>(sel) :- is_pod(sel), ¬ edge(sel, pod_idx)`
/// and returns pods with no egress edge to `pod_idx`.
pub fn system_isolation(program: &mut Program, pod_idx: u32) -> Result<(Satisfiability, Vec<u32>)> {
    let relation_name = format!("system_isolation__{pod_idx}");
    program.registry.register(&relation_name, Arity::One, RelKind::Core)?;

    program.engine.add_rule(Rule::rule(
        relation_name.clone(),
        vec![Term::var(SEL)],
        vec![
            Literal::pos(relations::IS_POD, vec![Term::var(SEL)]),
            Literal::neg(relations::EDGE, vec![Term::var(SEL), Term::konst(pod_idx)]),
        ],
    ));

    let (sat, tuples) = no_deadline(program, &relation_name, 1)?;
    Ok((sat, tuples.into_iter().map(|t| t[0]).collect()))
}

/// `policy_shadow() -> set<(q0, q1)>`: pairs where `q0`'s observable effect
/// (who it selects, who it ingress-allows, who it egress-allows) is a
/// subset of `q1`'s. Built as the complement of an `unshadow` relation that
/// holds whenever some pod witnesses a difference between the two, across
/// all three of `selected_by_pol`/`ingress_allow_by_pol`/`egress_allow_by_pol`
/// (§4.H).
pub fn policy_shadow(program: &mut Program) -> Result<(Satisfiability, BTreeSet<(u32, u32)>)> {
    containment_pairs(program, "shadow", "unshadow", true)
}

/// `policy_conflict() -> set<(q0, q1)>`: pairs that never jointly affect any
/// pod through any of the three relations, dual to `policy_shadow`.
pub fn policy_conflict(program: &mut Program) -> Result<(Satisfiability, BTreeSet<(u32, u32)>)> {
    containment_pairs(program, "conflict", "inconflict", false)
}

const Q0: usize = 0;
const Q1: usize = 1;
const WITNESS: usize = 2;

/// Shared shape for `policy_shadow`/`policy_conflict`: both are "pairs of
/// distinct policies for which a per-pod witness relation never holds",
/// differing only in whether the witness is "affected by q0 but not q1"
/// (`is_shadow`, shadow's `unshadow`) or "affected by both q0 and q1"
/// (conflict's `inconflict`).
fn containment_pairs(
    program: &mut Program,
    outer_name: &str,
    witness_name: &str,
    is_shadow: bool,
) -> Result<(Satisfiability, BTreeSet<(u32, u32)>)> {
    program.registry.register(witness_name, Arity::Two, RelKind::Core)?;
    program.registry.register(outer_name, Arity::Two, RelKind::Core)?;

    for core_rel in [
        relations::SELECTED_BY_POL,
        relations::INGRESS_ALLOW_BY_POL,
        relations::EGRESS_ALLOW_BY_POL,
    ] {
        let mut body = vec![
            Literal::pos(relations::IS_POL, vec![Term::var(Q0)]),
            Literal::pos(relations::IS_POL, vec![Term::var(Q1)]),
            Literal::pos(relations::IS_POD, vec![Term::var(WITNESS)]),
            Literal::pos(core_rel, vec![Term::var(WITNESS), Term::var(Q0)]),
        ];
        if is_shadow {
            body.push(Literal::neg(core_rel, vec![Term::var(WITNESS), Term::var(Q1)]));
        } else {
            body.push(Literal::pos(core_rel, vec![Term::var(WITNESS), Term::var(Q1)]));
        }
        program.engine.add_rule(Rule::rule(witness_name, vec![Term::var(Q0), Term::var(Q1)], body));
    }

    program.engine.add_rule(Rule::rule(
        outer_name,
        vec![Term::var(Q0), Term::var(Q1)],
        vec![
            Literal::pos(relations::IS_POL, vec![Term::var(Q0)]),
            Literal::pos(relations::IS_POL, vec![Term::var(Q1)]),
            Literal::NotEqual(Term::var(Q0), Term::var(Q1)),
            Literal::neg(witness_name, vec![Term::var(Q0), Term::var(Q1)]),
        ],
    ));

    let (sat, tuples) = no_deadline(program, outer_name, 2)?;
    Ok((sat, tuples.into_iter().map(|t| (t[0], t[1])).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BuildConfig, program::Program};
    use netpol_model::{Labels, NamespaceDescriptor, PodDescriptor, PeerRule, Peer, PolicyDescriptor, PolicyType, Selector};
    use std::collections::BTreeMap;

    fn pod(name: &str, labels: &[(&str, &str)]) -> PodDescriptor {
        PodDescriptor {
            name: name.into(),
            namespace: "default".into(),
            labels: labels.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }

    fn default_ns() -> Vec<NamespaceDescriptor> {
        vec![NamespaceDescriptor {
            name: "default".into(),
            labels: Labels::default(),
        }]
    }

    #[test]
    fn all_reachable_and_isolated_with_no_policies() {
        // `select_by_no_policy` is the mechanism that gives an empty policy
        // set its full-mesh default-allow; without it `egress_traffic` has
        // no source at all and `edge` stays empty.
        let pods = vec![pod("a", &[]), pod("b", &[])];
        let mut program = Program::build(pods, vec![], default_ns(), BuildConfig::new(true, true, false)).unwrap();
        let (reachable, isolated) = all_reach_isolate(&mut program).unwrap();
        assert_eq!(reachable, vec![0, 1]);
        assert!(isolated.is_empty());
    }

    #[test]
    fn isolated_pod_with_no_ingress_rule() {
        // Neither pod carries an egress-typed policy, and default-allow is
        // off, so `egress_traffic` never has a source: `edge` is empty and
        // every pod counts as isolated, not only the one the ingress-deny
        // policy names.
        let pods = vec![pod("a", &[("app", "db")]), pod("b", &[("app", "api")])];
        let select_db = Selector {
            match_labels: BTreeMap::from([("app".to_string(), "db".to_string())]),
            match_expressions: vec![],
        };
        let policy = PolicyDescriptor {
            namespace: "default".into(),
            pod_selector: select_db,
            policy_types: vec![PolicyType::Ingress],
            ingress: vec![],
            egress: vec![],
        };
        let mut program =
            Program::build(pods, vec![policy], default_ns(), BuildConfig::new(true, false, false)).unwrap();
        let (_, isolated) = all_reach_isolate(&mut program).unwrap();
        assert_eq!(isolated, vec![0, 1]);
    }

    #[test]
    fn user_crosscheck_flags_every_pod_under_full_mesh() {
        let pods = vec![
            pod("a", &[("User", "u1")]),
            pod("b", &[("User", "u1")]),
            pod("c", &[("User", "u2")]),
        ];
        let mut program = Program::build(pods, vec![], default_ns(), BuildConfig::new(true, true, false)).unwrap();
        let (_, violations) = user_crosscheck(&mut program, "User").unwrap();
        let set: BTreeSet<u32> = violations.into_iter().collect();
        assert_eq!(set, BTreeSet::from([0, 1, 2]));
    }

    #[test]
    fn shadow_detects_identical_policies() {
        let pods = vec![pod("a", &[("app", "db")]), pod("b", &[("app", "api")])];
        let select_db = Selector {
            match_labels: BTreeMap::from([("app".to_string(), "db".to_string())]),
            match_expressions: vec![],
        };
        let select_api = Selector {
            match_labels: BTreeMap::from([("app".to_string(), "api".to_string())]),
            match_expressions: vec![],
        };
        let peer = PeerRule {
            peers: vec![Peer::PodSelector(select_api)],
        };
        let make_policy = || PolicyDescriptor {
            namespace: "default".into(),
            pod_selector: select_db.clone(),
            policy_types: vec![PolicyType::Ingress],
            ingress: vec![peer.clone()],
            egress: vec![],
        };
        let policies = vec![make_policy(), make_policy()];
        let mut program =
            Program::build(pods, policies, default_ns(), BuildConfig::new(true, false, false)).unwrap();
        let (_, pairs) = policy_shadow(&mut program).unwrap();
        assert_eq!(pairs, BTreeSet::from([(0, 1), (1, 0)]));
    }

    #[test]
    fn conflict_detects_disjoint_policies() {
        let pods = vec![
            pod("a", &[("app", "db")]),
            pod("b", &[("app", "cache")]),
            pod("c", &[("app", "api")]),
            pod("d", &[("app", "worker")]),
        ];
        let policy_for = |selected: &str, peer: &str| PolicyDescriptor {
            namespace: "default".into(),
            pod_selector: Selector {
                match_labels: BTreeMap::from([("app".to_string(), selected.to_string())]),
                match_expressions: vec![],
            },
            policy_types: vec![PolicyType::Ingress],
            ingress: vec![PeerRule {
                peers: vec![Peer::PodSelector(Selector {
                    match_labels: BTreeMap::from([("app".to_string(), peer.to_string())]),
                    match_expressions: vec![],
                })],
            }],
            egress: vec![],
        };
        let policies = vec![policy_for("db", "cache"), policy_for("api", "worker")];
        let mut program =
            Program::build(pods, policies, default_ns(), BuildConfig::new(true, false, false)).unwrap();
        let (_, pairs) = policy_conflict(&mut program).unwrap();
        assert_eq!(pairs, BTreeSet::from([(0, 1), (1, 0)]));
    }
}
