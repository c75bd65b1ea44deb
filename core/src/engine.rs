//! The fixed-point evaluator. The rest of the crate treats this as a
//! blocking, single-threaded native library that facts and rules are handed
//! to and that queries are issued against. There is no SMT/Datalog solver in
//! this crate's dependency graph, so the evaluator is a small stratified,
//! bottom-up Datalog implementation instead.

use crate::{
    error::{Error, Result},
    term::{Literal, Rule, Term, Tuple},
};
use ahash::{AHashMap as HashMap, AHashSet as HashSet};
use std::collections::BTreeSet;

/// Ground facts and rules for every relation, plus the fixed point computed
/// from them. `facts` holds both base facts (rules with an empty body) and
/// every tuple derived by a rule; `rules` holds only the non-trivial Horn
/// clauses (empty-body rules are folded directly into `facts` on insertion).
#[derive(Debug, Default)]
pub struct Engine {
    facts: HashMap<String, BTreeSet<Tuple>>,
    rules: Vec<Rule>,
    dirty: bool,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a ground fact directly, bypassing rule evaluation.
    pub fn add_fact(&mut self, relation: &str, tuple: Tuple) {
        self.facts.entry(relation.to_string()).or_default().insert(tuple);
        self.dirty = true;
    }

    /// Adds a Horn clause. A rule with an empty body is a fact and is
    /// folded in immediately (it can't fail to fire).
    pub fn add_rule(&mut self, rule: Rule) {
        if rule.body.is_empty() {
            let tuple = ground_head(&rule.head.1, &HashMap::default())
                .expect("empty-body rule head must be fully ground");
            self.add_fact(&rule.head.0, tuple);
            return;
        }
        self.rules.push(rule);
        self.dirty = true;
    }

    /// Returns the current tuples for `relation`, forcing evaluation to a
    /// fixed point first if facts or rules have changed since the last
    /// evaluation. Multiple queries on an unchanged program are idempotent
    /// and do not re-derive anything (`dirty` stays false).
    pub fn relation(&mut self, relation: &str) -> Result<&BTreeSet<Tuple>> {
        if self.dirty {
            self.evaluate()?;
            self.dirty = false;
        }
        Ok(self.facts.entry(relation.to_string()).or_default())
    }

    /// Runs every rule to a least fixed point, honoring stratified
    /// negation: a relation's defining rules are fully evaluated before any
    /// rule that negates that relation runs. A relation that (transitively)
    /// negates itself is rejected with `EngineError`, mirroring how a real
    /// Datalog/SMT backend would reject a non-stratifiable program.
    fn evaluate(&mut self) -> Result<()> {
        let strata = stratify(&self.rules)?;
        tracing::trace!(strata = strata.len(), "entering fixed-point evaluation");

        for (stratum_idx, stratum) in strata.into_iter().enumerate() {
            let mut round = 0u32;
            loop {
                let mut grew = false;
                for rule in &stratum {
                    let derived = eval_rule(rule, &self.facts);
                    let bucket = self.facts.entry(rule.head.0.clone()).or_default();
                    for tuple in derived {
                        if bucket.insert(tuple) {
                            grew = true;
                        }
                    }
                }
                round += 1;
                tracing::trace!(stratum = stratum_idx, round, grew, "fixed-point iteration");
                if !grew {
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Assigns every relation a stratum number such that a rule's head is never
/// at a lower stratum than a relation it positively depends on, and is
/// strictly higher than any relation it negates. Returns the rules grouped
/// by stratum in ascending order. Fails with `EngineError` if no such
/// assignment exists (a negation cycle).
fn stratify(rules: &[Rule]) -> Result<Vec<Vec<Rule>>> {
    let mut relations: HashSet<String> = HashSet::default();
    for rule in rules {
        relations.insert(rule.head.0.clone());
        for lit in &rule.body {
            match lit {
                Literal::Pos(r, _) | Literal::Neg(r, _) => {
                    relations.insert(r.clone());
                }
                Literal::NotEqual(..) => {}
            }
        }
    }

    let mut stratum: HashMap<String, u32> = relations.iter().map(|r| (r.clone(), 0)).collect();
    let bound = relations.len() as u32 + 2;

    let mut converged = false;
    for _ in 0..=bound {
        let mut changed = false;
        for rule in rules {
            let mut need = 0u32;
            for lit in &rule.body {
                need = need.max(match lit {
                    Literal::Pos(r, _) => stratum[r],
                    Literal::Neg(r, _) => stratum[r] + 1,
                    Literal::NotEqual(..) => 0,
                });
            }
            let head = stratum.get_mut(&rule.head.0).expect("head relation registered above");
            if need > *head {
                *head = need;
                changed = true;
            }
        }
        if !changed {
            converged = true;
            break;
        }
    }
    if !converged {
        return Err(Error::EngineError(
            "rule set is not stratifiable: a relation negates itself transitively".to_string(),
        ));
    }

    let max_stratum = stratum.values().copied().max().unwrap_or(0);
    let mut buckets: Vec<Vec<Rule>> = (0..=max_stratum).map(|_| Vec::new()).collect();
    for rule in rules {
        let s = stratum[&rule.head.0];
        buckets[s as usize].push(rule.clone());
    }
    Ok(buckets)
}

/// Depth-first join over a rule's body literals, yielding one derived tuple
/// per satisfying variable binding.
fn eval_rule(rule: &Rule, facts: &HashMap<String, BTreeSet<Tuple>>) -> Vec<Tuple> {
    let ordered = order_for_evaluation(&rule.body);
    let mut out = Vec::new();
    let mut binding = HashMap::default();
    solve(&ordered, 0, facts, &mut binding, &mut |binding| {
        if let Some(tuple) = ground_head(&rule.head.1, binding) {
            out.push(tuple);
        }
    });
    out
}

/// `solve` tests literals strictly in order, and a negated or `NotEqual`
/// literal only checks variables already bound; it never binds one itself
/// (`matches_ground` treats an unbound variable as a mismatch, not a wildcard).
/// A compiler that appends a grounding conjunct (e.g. `namespace(x, ns)`)
/// *after* a `Neg`/`NotEqual` literal over the same still-unbound variable
/// would therefore see that literal vacuously pass before the variable is
/// ever bound. Every rule this crate builds is safe (each variable in a
/// negated or `NotEqual` literal also appears in some positive literal of
/// the same body), so it is always correct, and never changes the result,
/// to stably move every positive literal ahead of the negated/`NotEqual`
/// ones before evaluating. This is what makes body order at the call site
/// a non-issue.
fn order_for_evaluation(body: &[Literal]) -> Vec<Literal> {
    let mut ordered: Vec<Literal> = body
        .iter()
        .filter(|lit| matches!(lit, Literal::Pos(..)))
        .cloned()
        .collect();
    ordered.extend(body.iter().filter(|lit| !matches!(lit, Literal::Pos(..))).cloned());
    ordered
}

fn solve(
    body: &[Literal],
    idx: usize,
    facts: &HashMap<String, BTreeSet<Tuple>>,
    binding: &mut HashMap<usize, u32>,
    on_satisfied: &mut dyn FnMut(&HashMap<usize, u32>),
) {
    let Some(lit) = body.get(idx) else {
        on_satisfied(binding);
        return;
    };

    match lit {
        Literal::Pos(relation, args) => {
            let empty = BTreeSet::new();
            let candidates = facts.get(relation).unwrap_or(&empty);
            for tuple in candidates {
                if tuple.len() != args.len() {
                    continue;
                }
                let mut introduced = Vec::new();
                if unify(args, tuple, binding, &mut introduced) {
                    solve(body, idx + 1, facts, binding, on_satisfied);
                }
                for v in introduced {
                    binding.remove(&v);
                }
            }
        }
        Literal::Neg(relation, args) => {
            let empty = BTreeSet::new();
            let candidates = facts.get(relation).unwrap_or(&empty);
            let blocked = candidates.iter().any(|tuple| {
                tuple.len() == args.len() && matches_ground(args, tuple, binding)
            });
            if !blocked {
                solve(body, idx + 1, facts, binding, on_satisfied);
            }
        }
        Literal::NotEqual(a, b) => {
            let av = resolve(a, binding);
            let bv = resolve(b, binding);
            if av != bv {
                solve(body, idx + 1, facts, binding, on_satisfied);
            }
        }
    }
}

fn resolve(term: &Term, binding: &HashMap<usize, u32>) -> Option<u32> {
    match term {
        Term::Const(v) => Some(*v),
        Term::Var(id) => binding.get(id).copied(),
    }
}

/// Attempts to unify `args` against a candidate `tuple`, binding any
/// previously-unbound variables. Returns `false` (and leaves `binding`
/// unchanged beyond what's recorded in `introduced`) on mismatch.
fn unify(
    args: &[Term],
    tuple: &[u32],
    binding: &mut HashMap<usize, u32>,
    introduced: &mut Vec<usize>,
) -> bool {
    for (arg, value) in args.iter().zip(tuple.iter()) {
        match arg {
            Term::Const(c) => {
                if c != value {
                    return false;
                }
            }
            Term::Var(id) => match binding.get(id) {
                Some(bound) if bound != value => return false,
                Some(_) => {}
                None => {
                    binding.insert(*id, *value);
                    introduced.push(*id);
                }
            },
        }
    }
    true
}

/// Like `unify`, but never mutates `binding`: used for negated literals,
/// which must already have every variable bound by the positive context
/// they appear after.
fn matches_ground(args: &[Term], tuple: &[u32], binding: &HashMap<usize, u32>) -> bool {
    for (arg, value) in args.iter().zip(tuple.iter()) {
        let needed = match arg {
            Term::Const(c) => *c,
            Term::Var(id) => match binding.get(id) {
                Some(v) => *v,
                None => return false,
            },
        };
        if needed != *value {
            return false;
        }
    }
    true
}

fn ground_head(args: &[Term], binding: &HashMap<usize, u32>) -> Option<Tuple> {
    args.iter()
        .map(|t| resolve(t, binding))
        .collect::<Option<Vec<_>>>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Literal;

    #[test]
    fn transitive_closure_of_a_simple_graph() {
        let mut eng = Engine::new();
        eng.add_fact("edge", vec![0, 1]);
        eng.add_fact("edge", vec![1, 2]);
        eng.add_rule(Rule::rule(
            "path",
            vec![Term::var(0), Term::var(1)],
            vec![Literal::pos("edge", vec![Term::var(0), Term::var(1)])],
        ));
        eng.add_rule(Rule::rule(
            "path",
            vec![Term::var(0), Term::var(2)],
            vec![
                Literal::pos("edge", vec![Term::var(0), Term::var(1)]),
                Literal::pos("path", vec![Term::var(1), Term::var(2)]),
            ],
        ));

        let path: BTreeSet<Tuple> = eng.relation("path").unwrap().clone();
        assert!(path.contains(&vec![0, 1]));
        assert!(path.contains(&vec![1, 2]));
        assert!(path.contains(&vec![0, 2]));
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn stratified_negation_sees_a_fully_computed_lower_stratum() {
        let mut eng = Engine::new();
        eng.add_fact("is_pod", vec![0]);
        eng.add_fact("is_pod", vec![1]);
        eng.add_fact("selected", vec![0]);
        eng.add_rule(Rule::rule(
            "unselected",
            vec![Term::var(0)],
            vec![
                Literal::pos("is_pod", vec![Term::var(0)]),
                Literal::neg("selected", vec![Term::var(0)]),
            ],
        ));

        let got: BTreeSet<Tuple> = eng.relation("unselected").unwrap().clone();
        assert_eq!(got, BTreeSet::from([vec![1]]));
    }

    #[test]
    fn self_negating_relation_is_rejected() {
        let mut eng = Engine::new();
        eng.add_rule(Rule::rule(
            "p",
            vec![Term::var(0)],
            vec![Literal::neg("p", vec![Term::var(0)])],
        ));
        eng.add_fact("seed", vec![0]);
        let err = eng.relation("p").unwrap_err();
        assert!(matches!(err, Error::EngineError(_)));
    }

    #[test]
    fn negated_literal_listed_before_its_binder_still_filters_correctly() {
        // `is_pod(0..3)`, `selected(0)` only; `unselected` negates `selected`
        // with the `Neg` literal written *before* the `is_pod` literal that
        // actually binds the variable, mirroring a compiler that appends its
        // grounding conjunct last. Without reordering, `matches_ground`
        // would see an unbound var and vacuously pass the negation for
        // every pod, including pod 0.
        let mut eng = Engine::new();
        eng.add_fact("is_pod", vec![0]);
        eng.add_fact("is_pod", vec![1]);
        eng.add_fact("is_pod", vec![2]);
        eng.add_fact("selected", vec![0]);
        eng.add_rule(Rule::rule(
            "unselected",
            vec![Term::var(0)],
            vec![
                Literal::neg("selected", vec![Term::var(0)]),
                Literal::pos("is_pod", vec![Term::var(0)]),
            ],
        ));

        let got: BTreeSet<Tuple> = eng.relation("unselected").unwrap().clone();
        assert_eq!(got, BTreeSet::from([vec![1], vec![2]]));
    }

    #[test]
    fn requerying_an_unchanged_engine_is_idempotent() {
        let mut eng = Engine::new();
        eng.add_fact("edge", vec![0, 1]);
        eng.add_rule(Rule::rule(
            "path",
            vec![Term::var(0), Term::var(1)],
            vec![Literal::pos("edge", vec![Term::var(0), Term::var(1)])],
        ));
        let first = eng.relation("path").unwrap().clone();
        let second = eng.relation("path").unwrap().clone();
        assert_eq!(first, second);
    }
}
