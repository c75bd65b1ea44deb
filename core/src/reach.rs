//! Installs the `ingress_traffic`, `egress_traffic`, `have_path`/`edge`
//! relations, honoring the two build-time toggles in `BuildConfig`.

use crate::{
    error::Result,
    program::Program,
    registry::{Arity, RelKind},
    relations,
    term::{Literal, Rule, Term},
};

const SRC: usize = 0;
const SEL: usize = 1;
const POL: usize = 2;
const DST: usize = 1;

pub(crate) fn install_reachability_rules(program: &mut Program) -> Result<()> {
    if program.config.self_ingress {
        // ingress_traffic(sel, sel) for every pod that actually exists,
        // bounded by `is_pod` rather than emitted as a bare fact, since the
        // rule quantifies over the whole (a priori unknown-size) pod sort.
        program.engine.add_rule(Rule::rule(
            relations::INGRESS_TRAFFIC,
            vec![Term::var(SEL), Term::var(SEL)],
            vec![Literal::pos(relations::IS_POD, vec![Term::var(SEL)])],
        ));
    }

    program.engine.add_rule(Rule::rule(
        relations::INGRESS_TRAFFIC,
        vec![Term::var(SRC), Term::var(SEL)],
        vec![
            Literal::pos(relations::SELECTED_BY_POL, vec![Term::var(SEL), Term::var(POL)]),
            Literal::pos(relations::INGRESS_ALLOW_BY_POL, vec![Term::var(SRC), Term::var(POL)]),
        ],
    ));
    program.engine.add_rule(Rule::rule(
        relations::EGRESS_TRAFFIC,
        vec![Term::var(DST), Term::var(SEL)],
        vec![
            Literal::pos(relations::SELECTED_BY_POL, vec![Term::var(SEL), Term::var(POL)]),
            Literal::pos(relations::EGRESS_ALLOW_BY_POL, vec![Term::var(DST), Term::var(POL)]),
        ],
    ));

    program.engine.add_rule(Rule::rule(
        relations::HAVE_PATH,
        vec![Term::var(SRC), Term::var(DST)],
        vec![
            Literal::pos(relations::INGRESS_TRAFFIC, vec![Term::var(SRC), Term::var(SEL)]),
            Literal::pos(relations::EGRESS_TRAFFIC, vec![Term::var(DST), Term::var(SEL)]),
        ],
    ));
    program.engine.add_rule(Rule::rule(
        relations::EDGE,
        vec![Term::var(SRC), Term::var(DST)],
        vec![Literal::pos(relations::HAVE_PATH, vec![Term::var(SRC), Term::var(DST)])],
    ));

    if program.config.select_by_no_policy {
        install_default_allow(program)?;
    }

    Ok(())
}

/// "A pod selected by no policy accepts/emits all traffic." Either a
/// negated `selected_by_any` rule, or (if `ground_default_pod` is set) a
/// ground rule per pod that turns out to be unselected, computed by forcing
/// partial evaluation of `selected_by_pol` before the rest of the program is
/// built, to avoid negating a relation the engine hasn't finished deriving.
fn install_default_allow(program: &mut Program) -> Result<()> {
    if program.config.ground_default_pod {
        let selected: std::collections::BTreeSet<u32> = program
            .engine
            .relation(relations::SELECTED_BY_POL)?
            .iter()
            .map(|tuple| tuple[0])
            .collect();

        for p in 0..program.pod_count() as u32 {
            if selected.contains(&p) {
                continue;
            }
            program.engine.add_rule(Rule::rule(
                relations::INGRESS_TRAFFIC,
                vec![Term::var(SRC), Term::konst(p)],
                vec![Literal::pos(relations::IS_POD, vec![Term::var(SRC)])],
            ));
            program.engine.add_rule(Rule::rule(
                relations::EGRESS_TRAFFIC,
                vec![Term::var(DST), Term::konst(p)],
                vec![Literal::pos(relations::IS_POD, vec![Term::var(DST)])],
            ));
        }
        return Ok(());
    }

    program
        .registry
        .register(relations::SELECTED_BY_ANY, Arity::One, RelKind::Core)?;
    program.engine.add_rule(Rule::rule(
        relations::SELECTED_BY_ANY,
        vec![Term::var(SEL)],
        vec![Literal::pos(relations::SELECTED_BY_POL, vec![Term::var(SEL), Term::var(POL)])],
    ));

    program.engine.add_rule(Rule::rule(
        relations::INGRESS_TRAFFIC,
        vec![Term::var(SRC), Term::var(SEL)],
        vec![
            Literal::pos(relations::IS_POD, vec![Term::var(SEL)]),
            Literal::pos(relations::IS_POD, vec![Term::var(SRC)]),
            Literal::neg(relations::SELECTED_BY_ANY, vec![Term::var(SEL)]),
        ],
    ));
    program.engine.add_rule(Rule::rule(
        relations::EGRESS_TRAFFIC,
        vec![Term::var(DST), Term::var(SEL)],
        vec![
            Literal::pos(relations::IS_POD, vec![Term::var(SEL)]),
            Literal::pos(relations::IS_POD, vec![Term::var(DST)]),
            Literal::neg(relations::SELECTED_BY_ANY, vec![Term::var(SEL)]),
        ],
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::BuildConfig, program::Program};
    use netpol_model::{Labels, NamespaceDescriptor, PodDescriptor};

    fn simple_pods(n: usize) -> (Vec<PodDescriptor>, Vec<NamespaceDescriptor>) {
        let pods = (0..n)
            .map(|i| PodDescriptor {
                name: format!("p{i}"),
                namespace: "default".into(),
                labels: Labels::default(),
            })
            .collect();
        let namespaces = vec![NamespaceDescriptor {
            name: "default".into(),
            labels: Labels::default(),
        }];
        (pods, namespaces)
    }

    #[test]
    fn no_policies_full_mesh_with_self_ingress() {
        let (pods, namespaces) = simple_pods(2);
        let mut program = Program::build(pods, vec![], namespaces, BuildConfig::new(true, true, false)).unwrap();
        let edges: std::collections::BTreeSet<_> = program.engine.relation(relations::EDGE).unwrap().clone();
        assert_eq!(edges.len(), 4);
        assert!(edges.contains(&vec![0, 1]));
        assert!(edges.contains(&vec![1, 0]));
    }

    #[test]
    fn no_self_ingress_and_no_default_allow_leaves_edge_empty() {
        let (pods, namespaces) = simple_pods(2);
        let mut program = Program::build(pods, vec![], namespaces, BuildConfig::new(false, false, false)).unwrap();
        let edges = program.engine.relation(relations::EDGE).unwrap().clone();
        assert!(edges.is_empty());
    }

    #[test]
    fn ground_default_pod_matches_negated_rule_for_unselected_pods() {
        let (pods, namespaces) = simple_pods(2);
        let negated = Program::build(
            pods.clone(),
            vec![],
            namespaces.clone(),
            BuildConfig::new(false, true, false),
        )
        .unwrap();
        let grounded = Program::build(pods, vec![], namespaces, BuildConfig::new(false, true, true)).unwrap();

        let mut negated = negated;
        let mut grounded = grounded;
        let edges_negated: std::collections::BTreeSet<_> = negated.engine.relation(relations::EDGE).unwrap().clone();
        let edges_grounded: std::collections::BTreeSet<_> = grounded.engine.relation(relations::EDGE).unwrap().clone();
        assert_eq!(edges_negated, edges_grounded);
    }
}
