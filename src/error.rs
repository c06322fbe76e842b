use thiserror::Error;

/// Errors raised while constructing a `Problem` or asserting solution
/// invariants. Infeasibility during search is never an error: recreate
/// heuristics fall back to outsourcing, which is always feasible.
#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed problem: {0}")]
    MalformedProblem(String),

    #[error("invalid solution: {0}")]
    InvalidSolution(String),
}

pub type Result<T> = std::result::Result<T, Error>;
