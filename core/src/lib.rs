#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

//! Relational/Datalog encoder and query driver for network-policy
//! reachability analysis.
//!
//! A `Program` compiles a population of pods, namespaces and policies into a
//! stratified, bottom-up Datalog program (`engine`), then exposes two
//! surfaces on top of it: a generic query driver (`query`) that parses the
//! engine's disjunctive-normal-form answers into concrete tuples, and a set
//! of postprocess analytics (`postprocess`) that register small additional
//! rule sets for reachability, crosscheck, isolation, shadowing and
//! conflict. See `config::BuildConfig` for the build-time toggles that shape
//! what "reachable" means for a given population.

pub mod config;
mod engine;
pub mod error;
mod facts;
pub mod ids;
mod interner;
mod policy_compile;
pub mod postprocess;
pub mod program;
pub mod query;
mod reach;
pub mod registry;
pub mod relations;
mod selector_compile;
pub mod term;

pub use config::BuildConfig;
pub use error::{Error, Result};
pub use postprocess::Satisfiability;
pub use program::Program;
pub use query::{query, query_tuples, Answer, Cancellation};
