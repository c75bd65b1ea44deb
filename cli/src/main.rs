#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

mod args;
mod fixtures;

use anyhow::Result;
use args::{Args, Query, Scenario};
use clap::Parser;
use fixtures::Scenario as Fixture;
use netpol_core::{postprocess, BuildConfig, Program};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .init();

    let Fixture {
        pods,
        namespaces,
        policies,
    } = build_fixture(args.scenario);

    let config = BuildConfig::new(
        args.self_ingress,
        args.select_by_no_policy,
        args.ground_default_pod,
    );

    tracing::info!(scenario = ?args.scenario, "building program");
    let mut program = Program::build(pods, policies, namespaces, config)?;

    run_query(&mut program, &args)
}

fn build_fixture(scenario: Scenario) -> Fixture {
    match scenario {
        Scenario::PaperExample => fixtures::paper_example(),
        Scenario::NoPolicies => fixtures::no_policies(),
        Scenario::IsolatedPod => fixtures::isolated_pod(),
        Scenario::UserCrosscheck => fixtures::user_crosscheck(),
        Scenario::Shadow => fixtures::shadow(),
        Scenario::Conflict => fixtures::conflict(),
    }
}

fn run_query(program: &mut Program, args: &Args) -> Result<()> {
    match args.query {
        Query::Edges => {
            let (sat, edges) = postprocess::all_edges(program)?;
            println!("{sat:?} edges = {edges:?}");
        }
        Query::ReachIsolate => {
            let (reachable, isolated) = postprocess::all_reach_isolate(program)?;
            println!("all_reachable = {reachable:?}");
            println!("all_isolated  = {isolated:?}");
        }
        Query::UserCrosscheck => {
            let (sat, violations) = postprocess::user_crosscheck(program, &args.label_key)?;
            println!("{sat:?} user_crosscheck({:?}) = {violations:?}", args.label_key);
        }
        Query::SystemIsolation => {
            let (sat, isolated) = postprocess::system_isolation(program, args.pod_idx)?;
            println!("{sat:?} system_isolation({}) = {isolated:?}", args.pod_idx);
        }
        Query::PolicyShadow => {
            let (sat, pairs) = postprocess::policy_shadow(program)?;
            println!("{sat:?} policy_shadow = {pairs:?}");
        }
        Query::PolicyConflict => {
            let (sat, pairs) = postprocess::policy_conflict(program)?;
            println!("{sat:?} policy_conflict = {pairs:?}");
        }
    }
    Ok(())
}
