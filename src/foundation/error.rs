pub type BrotResult<T> = Result<T, BrotError>;

/// Failures of the barrier-dispatch worker pool.
#[derive(thiserror::Error, Debug)]
pub enum PoolError {
    #[error("worker pool needs at least one worker")]
    InvalidWorkerCount,

    #[error("failed to spawn worker thread {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("dispatch called before a job function was configured")]
    NotConfigured,

    #[error("worker pool has been shut down")]
    ShutDown,

    #[error("a job function panicked; the worker pool is poisoned")]
    WorkerPanicked,
}

#[derive(thiserror::Error, Debug)]
pub enum BrotError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("pool error: {0}")]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BrotError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
