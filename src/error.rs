use thiserror::Error;

/// Setups that would make a frame degenerate. They are caught before anything is traced.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("image dimensions must be non-zero, got {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("diagnostics strip dimensions must be non-zero, got {width}x{height}")]
    EmptyStatsStrip { width: u32, height: u32 },

    #[error("band size must be at least one row")]
    ZeroBandSize,

    #[error("field of view must be inside (0, 180) degrees, got {0}")]
    FieldOfView(f32),

    #[error("worker thread count must be at least one")]
    ZeroWorkerThreads,

    #[error("sphere {index} is invalid: {reason}")]
    InvalidSphere { index: usize, reason: String },

    #[error("sphere {sphere} is bound to physics body {body}, which does not exist")]
    UnknownBody { sphere: usize, body: usize },

    #[error("could not build the render thread pool")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
