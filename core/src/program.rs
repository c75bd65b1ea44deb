use crate::{
    config::BuildConfig,
    engine::Engine,
    error::{Error, Result},
    facts, ids,
    ids::{NamespaceId, PodId, PolicyId},
    interner::Interner,
    policy_compile, reach,
    registry::RelationRegistry,
};
use ahash::AHashMap as HashMap;
use netpol_model::{NamespaceDescriptor, PodDescriptor, PolicyDescriptor};

/// Owns every relation, fact and rule built from one population of
/// descriptors. Constructed once via `Program::build` and, per §3's
/// lifecycle, read-only afterwards except for the postprocess passes in
/// `postprocess`, which additionally register analytic relations and rules.
pub struct Program {
    pub(crate) interner: Interner,
    pub(crate) registry: RelationRegistry,
    pub(crate) engine: Engine,
    pub(crate) config: BuildConfig,

    pub(crate) pods: Vec<PodDescriptor>,
    pub(crate) namespaces: Vec<NamespaceDescriptor>,
    pub(crate) policies: Vec<PolicyDescriptor>,
    namespace_by_name: HashMap<String, NamespaceId>,
}

impl Program {
    /// Runs the full builder sequence (§5): interner growth, relation
    /// registration, fact emission, rule emission, finalization. Fails with
    /// `Error::UnknownNamespace` if a pod references a namespace that isn't
    /// in `namespaces`.
    pub fn build(
        pods: Vec<PodDescriptor>,
        policies: Vec<PolicyDescriptor>,
        namespaces: Vec<NamespaceDescriptor>,
        config: BuildConfig,
    ) -> Result<Self> {
        let namespace_by_name: HashMap<String, NamespaceId> = namespaces
            .iter()
            .enumerate()
            .map(|(i, ns)| (ns.name.clone(), NamespaceId::from(i)))
            .collect();

        for pod in &pods {
            if !namespace_by_name.contains_key(&pod.namespace) {
                return Err(Error::UnknownNamespace(pod.namespace.clone()));
            }
        }

        let mut program = Program {
            interner: Interner::new(),
            registry: RelationRegistry::new(),
            engine: Engine::new(),
            config,
            pods,
            namespaces,
            policies,
            namespace_by_name,
        };

        facts::register_core_relations(&mut program)?;
        facts::emit_label_universe(&mut program);
        facts::emit_pod_facts(&mut program)?;
        facts::emit_namespace_facts(&mut program)?;
        facts::emit_policy_presence(&mut program);

        for idx in 0..program.policies.len() {
            policy_compile::emit_policy_rules(&mut program, PolicyId::from(idx));
        }

        reach::install_reachability_rules(&mut program)?;

        tracing::info!(
            pods = program.pods.len(),
            namespaces = program.namespaces.len(),
            policies = program.policies.len(),
            "program build complete"
        );
        Ok(program)
    }

    pub fn pod_count(&self) -> usize {
        self.pods.len()
    }

    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    pub fn policy_count(&self) -> usize {
        self.policies.len()
    }

    pub fn pods(&self) -> &[PodDescriptor] {
        &self.pods
    }

    pub fn policies(&self) -> &[PolicyDescriptor] {
        &self.policies
    }

    pub fn namespace_idx(&self, name: &str) -> Option<NamespaceId> {
        self.namespace_by_name.get(name).copied()
    }

    pub fn pod_id(&self, p: usize) -> PodId {
        PodId::from(p)
    }

    /// The pod-sort width, retained only as the documented invariant from
    /// §3; nothing in this crate packs bits against it.
    pub fn pod_sort_width(&self) -> u32 {
        ids::sort_width(self.pods.len())
    }
}
