use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to build the worker thread pool")]
    BuildThreadPool(#[source] rayon::ThreadPoolBuildError),
}
