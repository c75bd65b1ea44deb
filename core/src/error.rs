/// Errors surfaced by the core's public API.
///
/// `Unsat` is deliberately absent here: a query that finds no answer is a
/// successful, empty result (see `query::Answer`), not an error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("pod references unknown namespace {0:?}")]
    UnknownNamespace(String),

    #[error("relation {0:?} is already registered")]
    DuplicateRelation(String),

    #[error("literal interner exhausted its {bits}-bit value sort")]
    ResourceExhaustion { bits: u32 },

    #[error("fixed-point evaluation failed: {0}")]
    EngineError(String),

    #[error("query timed out")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, Error>;
