//! Component D: the Selector Compiler. Translates a `Selector` against a
//! rule-local variable into the set of alternative rule bodies that together
//! encode its semantics. A selector never compiles to a single conjunction
//! in general: `In` match-expressions are disjunctions over values, and Horn
//! bodies admit no disjunction, so they're lowered to one body per value
//! (§4.D, §9 "Disjunction in selectors"). `compile_pod`/`compile_namespace`
//! therefore both return `Vec<Vec<Literal>>`: the outer `Vec` is the set of
//! rules the caller must emit (one per alternative), the inner `Vec` is a
//! single conjunction.

use crate::{
    error::Result,
    program::Program,
    registry::RelKind,
    relations,
    term::{Literal, Term, VarId},
};
use netpol_model::{Operator, Selector};

/// The set of alternative conjunctions a compiled selector expands to.
pub(crate) type Bodies = Vec<Vec<Literal>>;

/// Compiles `selector` against pod variable `x` using the pod-indexed label
/// bucket (`RelKind::Label`).
pub(crate) fn compile_pod(program: &mut Program, selector: &Selector, x: VarId) -> Result<Bodies> {
    compile(program, selector, x, RelKind::Label, relations::label_name)
}

/// Compiles `selector` against namespace variable `y` using the
/// namespace-indexed label bucket (`RelKind::NamespaceLabel`). Namespace
/// label relations are registered under the `nslabel__<key>` prefix; the
/// compiler rewrites every key through that prefix before bucket lookups.
pub(crate) fn compile_namespace(program: &mut Program, selector: &Selector, y: VarId) -> Result<Bodies> {
    compile(program, selector, y, RelKind::NamespaceLabel, relations::namespace_label_name)
}

/// Shared compilation logic for both buckets. `rewrite` maps a selector's
/// bare label key to the name the relation is actually registered under in
/// `kind`'s bucket (identity for pod labels, `<key>__namespace` for
/// namespace labels).
fn compile(
    program: &mut Program,
    selector: &Selector,
    var: VarId,
    kind: RelKind,
    rewrite: impl Fn(&str) -> String,
) -> Result<Bodies> {
    if selector.selects_all() {
        return Ok(vec![vec![Literal::pos(relations::IS_POD, vec![Term::var(var)])]]);
    }

    // Every alternative so far, ANDed against everything compiled next.
    let mut bodies: Bodies = vec![vec![]];

    for (key, value) in &selector.match_labels {
        let rel = rewrite(key);
        let conjunct = if program.registry.contains(&rel, kind) {
            let token = program.interner.intern(value)?;
            Literal::pos(rel, vec![Term::var(var), Term::konst(token.as_u32())])
        } else {
            absurd(var)
        };
        bodies = and_conjunct(bodies, conjunct);
    }

    for expr in &selector.match_expressions {
        let rel = rewrite(&expr.key);
        let exists_rel = relations::exists_name(&rel);
        match expr.operator {
            Operator::In => {
                if !program.registry.contains(&rel, kind) {
                    bodies = and_conjunct(bodies, absurd(var));
                    continue;
                }
                let mut alternatives = Vec::with_capacity(expr.values.len());
                for value in &expr.values {
                    let token = program.interner.intern(value)?;
                    alternatives.push(Literal::pos(
                        rel.clone(),
                        vec![Term::var(var), Term::konst(token.as_u32())],
                    ));
                }
                bodies = and_disjunction(bodies, alternatives);
            }
            Operator::NotIn => {
                let mut conjuncts = vec![Literal::pos(exists_rel, vec![Term::var(var)])];
                for value in &expr.values {
                    let token = program.interner.intern(value)?;
                    conjuncts.push(Literal::neg(
                        rel.clone(),
                        vec![Term::var(var), Term::konst(token.as_u32())],
                    ));
                }
                bodies = and_conjuncts(bodies, conjuncts);
            }
            Operator::Exists => {
                bodies = and_conjunct(bodies, Literal::pos(exists_rel, vec![Term::var(var)]));
            }
            Operator::DoesNotExist => {
                bodies = and_conjunct(bodies, Literal::neg(exists_rel, vec![Term::var(var)]));
            }
        }
    }

    Ok(bodies)
}

/// The never-true conjunct §4.D falls back to when a selector references a
/// label key that no pod or namespace in the population ever carries. Kept
/// syntactically well-formed (a real literal over a real, if permanently
/// empty, relation) rather than special-cased away, so the emitted rule
/// stays a normal Horn clause.
fn absurd(var: VarId) -> Literal {
    Literal::pos(relations::ABSURD, vec![Term::var(var)])
}

fn and_conjunct(bodies: Bodies, conjunct: Literal) -> Bodies {
    bodies
        .into_iter()
        .map(|mut b| {
            b.push(conjunct.clone());
            b
        })
        .collect()
}

fn and_conjuncts(bodies: Bodies, conjuncts: Vec<Literal>) -> Bodies {
    bodies
        .into_iter()
        .map(|mut b| {
            b.extend(conjuncts.iter().cloned());
            b
        })
        .collect()
}

/// Cartesian product of the existing alternatives against a fresh set of
/// disjuncts (the `In` expansion): every existing body is duplicated once
/// per new alternative.
fn and_disjunction(bodies: Bodies, alternatives: Vec<Literal>) -> Bodies {
    let mut out = Vec::with_capacity(bodies.len() * alternatives.len());
    for body in &bodies {
        for alt in &alternatives {
            let mut next = body.clone();
            next.push(alt.clone());
            out.push(next);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BuildConfig, ids::PodId};
    use netpol_model::{Expression, Labels, NamespaceDescriptor, PodDescriptor};
    use std::collections::BTreeSet;

    fn build_program(pods: Vec<PodDescriptor>) -> Program {
        let ns = vec![NamespaceDescriptor {
            name: "default".into(),
            labels: Labels::default(),
        }];
        Program::build(pods, vec![], ns, BuildConfig::new(true, false, false)).unwrap()
    }

    fn pod(name: &str, labels: &[(&str, &str)]) -> PodDescriptor {
        PodDescriptor {
            name: name.into(),
            namespace: "default".into(),
            labels: labels.iter().map(|(k, v)| (*k, *v)).collect(),
        }
    }

    #[test]
    fn empty_selector_selects_all_pods() {
        let mut program = build_program(vec![pod("a", &[("app", "db")])]);
        let bodies = compile_pod(&mut program, &Selector::empty(), 0).unwrap();
        assert_eq!(bodies.len(), 1);
        assert!(matches!(&bodies[0][..], [Literal::Pos(r, _)] if r == relations::IS_POD));
    }

    #[test]
    fn unknown_match_label_key_is_vacuously_false() {
        let mut program = build_program(vec![pod("a", &[("app", "db")])]);
        let selector = Selector {
            match_labels: [("missing".to_string(), "x".to_string())].into_iter().collect(),
            match_expressions: vec![],
        };
        let bodies = compile_pod(&mut program, &selector, 0).unwrap();
        assert_eq!(bodies.len(), 1);
        assert!(matches!(&bodies[0][..], [Literal::Pos(r, _)] if r == relations::ABSURD));
    }

    #[test]
    fn in_expression_expands_to_one_body_per_value() {
        let mut program = build_program(vec![pod("a", &[("env", "prod")]), pod("b", &[("env", "staging")])]);
        let expr = Expression {
            key: "env".into(),
            operator: Operator::In,
            values: BTreeSet::from(["prod".to_string(), "staging".to_string()]),
        };
        let selector = Selector {
            match_labels: Default::default(),
            match_expressions: vec![expr],
        };
        let bodies = compile_pod(&mut program, &selector, 0).unwrap();
        assert_eq!(bodies.len(), 2);
        for body in &bodies {
            assert_eq!(body.len(), 1);
        }
    }

    #[test]
    fn not_in_requires_existence_and_excludes_values() {
        let mut program = build_program(vec![pod("a", &[("env", "prod")])]);
        let expr = Expression {
            key: "env".into(),
            operator: Operator::NotIn,
            values: BTreeSet::from(["prod".to_string()]),
        };
        let selector = Selector {
            match_labels: Default::default(),
            match_expressions: vec![expr],
        };
        let bodies = compile_pod(&mut program, &selector, 0).unwrap();
        assert_eq!(bodies.len(), 1);
        assert_eq!(bodies[0].len(), 2);
        assert!(matches!(&bodies[0][0], Literal::Pos(r, _) if r.ends_with("__exists")));
        assert!(matches!(&bodies[0][1], Literal::Neg(..)));
    }

    #[test]
    fn pod_id_newtype_round_trips() {
        assert_eq!(PodId::from(3usize).as_u32(), 3);
    }
}
