use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParserError {
    #[error("--min-reads must be at least 3 (got {0})")]
    InvalidMinReads(usize),

    #[error("--max-reads must lie within [2, 16] (got {0})")]
    InvalidMaxReads(usize),

    #[error("--reps must be at least 1")]
    InvalidReps,

    #[error("--min-hf must lie within [0, 0.5) (got {0})")]
    InvalidMinHf(f64),

    #[error("--pair requires exactly 2 scenarios (got {0})")]
    InvalidScenarioPair(usize),
}
