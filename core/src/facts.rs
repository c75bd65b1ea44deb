//! Component C: the Fact Emitter. Emits ground facts for each pod's
//! namespace, each `(pod, label-value)` pair, each namespace's labels, and
//! the `is_pod`/`is_pol` presence facts.
//!
//! Per §4.C's supplement, relation *registration* happens up front in
//! `emit_label_universe` (a pre-scan over every descriptor's labels) rather
//! than lazily the first time a key is seen mid-emission; this keeps the
//! registry's `register`/`register_if_absent` distinction the only place
//! that can fail, and makes emission itself infallible except for literal
//! interning.

use crate::{
    error::Result,
    program::Program,
    registry::{Arity, RelKind},
    relations,
};
use ahash::AHashSet as HashSet;

pub(crate) fn register_core_relations(program: &mut Program) -> Result<()> {
    use relations::*;
    program.registry.register(NAMESPACE, Arity::Two, RelKind::Core)?;
    program.registry.register(IS_POD, Arity::One, RelKind::Core)?;
    program.registry.register(IS_POL, Arity::One, RelKind::Core)?;
    program
        .registry
        .register(SELECTED_BY_POL, Arity::Two, RelKind::Core)?;
    program
        .registry
        .register(INGRESS_ALLOW_BY_POL, Arity::Two, RelKind::Core)?;
    program
        .registry
        .register(EGRESS_ALLOW_BY_POL, Arity::Two, RelKind::Core)?;
    program
        .registry
        .register(INGRESS_TRAFFIC, Arity::Two, RelKind::Core)?;
    program
        .registry
        .register(EGRESS_TRAFFIC, Arity::Two, RelKind::Core)?;
    program.registry.register(HAVE_PATH, Arity::Two, RelKind::Core)?;
    program.registry.register(EDGE, Arity::Two, RelKind::Core)?;
    program.registry.register(ABSURD, Arity::One, RelKind::Core)?;
    Ok(())
}

/// Pre-scans every pod and namespace to compute the full label-key universe
/// and registers the corresponding label/namespace-label relations before
/// any fact is emitted.
pub(crate) fn emit_label_universe(program: &mut Program) {
    let mut pod_keys: HashSet<String> = HashSet::default();
    for pod in &program.pods {
        for (k, _) in pod.labels.iter() {
            pod_keys.insert(k.to_string());
        }
    }
    for key in &pod_keys {
        let rel = relations::label_name(key);
        program.registry.register_if_absent(&rel, Arity::Two, RelKind::Label);
        program
            .registry
            .register_if_absent(&relations::exists_name(&rel), Arity::One, RelKind::Label);
    }

    let mut ns_keys: HashSet<String> = HashSet::default();
    for ns in &program.namespaces {
        for (k, _) in ns.labels.iter() {
            ns_keys.insert(k.to_string());
        }
    }
    for key in &ns_keys {
        let ns_name = relations::namespace_label_name(key);
        program
            .registry
            .register_if_absent(&ns_name, Arity::Two, RelKind::NamespaceLabel);
        program.registry.register_if_absent(
            &relations::exists_name(&ns_name),
            Arity::One,
            RelKind::NamespaceLabel,
        );
    }

    tracing::debug!(
        pod_keys = pod_keys.len(),
        namespace_keys = ns_keys.len(),
        "registered label universe"
    );
}

pub(crate) fn emit_pod_facts(program: &mut Program) -> Result<()> {
    for p in 0..program.pods.len() {
        let pod = program.pods[p].clone();
        let ns_idx = program
            .namespace_idx(&pod.namespace)
            .expect("build() already validated every pod's namespace")
            .as_u32();

        program.engine.add_fact(relations::NAMESPACE, vec![p as u32, ns_idx]);
        program.engine.add_fact(relations::IS_POD, vec![p as u32]);

        for (key, value) in pod.labels.iter() {
            let token = program.interner.intern(value)?;
            let rel = relations::label_name(key);
            program.engine.add_fact(&rel, vec![p as u32, token.as_u32()]);
            program
                .engine
                .add_fact(&relations::exists_name(&rel), vec![p as u32]);
        }
    }
    Ok(())
}

pub(crate) fn emit_namespace_facts(program: &mut Program) -> Result<()> {
    for n in 0..program.namespaces.len() {
        let ns = program.namespaces[n].clone();
        for (key, value) in ns.labels.iter() {
            let token = program.interner.intern(value)?;
            let ns_name = relations::namespace_label_name(key);
            program.engine.add_fact(&ns_name, vec![n as u32, token.as_u32()]);
            program
                .engine
                .add_fact(&relations::exists_name(&ns_name), vec![n as u32]);
        }
    }
    Ok(())
}

pub(crate) fn emit_policy_presence(program: &mut Program) {
    for q in 0..program.policies.len() {
        program.engine.add_fact(relations::IS_POL, vec![q as u32]);
    }
}
