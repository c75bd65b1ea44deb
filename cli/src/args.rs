use clap::{Parser, ValueEnum};

/// Builds one of a handful of worked-example populations, builds the
/// reachability program against it, and prints the result of one query.
///
/// This binary does not decode policy manifests or walk a cluster's
/// filesystem layout; that plumbing is out of scope for the core it drives
/// (see `netpol_core`'s crate docs). It exists to exercise the core
/// end-to-end with the same scenarios the core's own test suite checks.
#[derive(Debug, Parser)]
#[clap(name = "netpol", version, about)]
pub struct Args {
    /// Which worked example to build.
    #[clap(long, value_enum, default_value_t = Scenario::PaperExample)]
    pub scenario: Scenario,

    /// Which query to run against the built program.
    #[clap(long, value_enum, default_value_t = Query::Edges)]
    pub query: Query,

    /// Label key to pass to `--query user-crosscheck`.
    #[clap(long, default_value = "User")]
    pub label_key: String,

    /// Pod index to pass to `--query system-isolation`.
    #[clap(long, default_value_t = 0)]
    pub pod_idx: u32,

    /// Seeds `ingress_traffic(sel, sel)` so a pod can always reach itself.
    #[clap(long, action = clap::ArgAction::Set, default_value_t = true)]
    pub self_ingress: bool,

    /// A pod selected by no policy accepts/emits all traffic.
    #[clap(long, action = clap::ArgAction::Set, default_value_t = false)]
    pub select_by_no_policy: bool,

    /// Resolve "selected by no policy" via ground per-pod facts instead of
    /// negating an open relation. Only meaningful with `--select-by-no-policy`.
    #[clap(long, action = clap::ArgAction::Set, default_value_t = false)]
    pub ground_default_pod: bool,

    /// Log level passed to the `tracing-subscriber` `EnvFilter`.
    #[clap(long, env = "NETPOL_LOG", default_value = "netpol=info,warn")]
    pub log_level: String,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    PaperExample,
    NoPolicies,
    IsolatedPod,
    UserCrosscheck,
    Shadow,
    Conflict,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Query {
    Edges,
    ReachIsolate,
    UserCrosscheck,
    SystemIsolation,
    PolicyShadow,
    PolicyConflict,
}
