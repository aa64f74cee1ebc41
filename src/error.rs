use thiserror::Error;

/// Failures the engine can hit while (re)allocating its buffers.
///
/// None of these reach the user: the host turns them into "no animation".
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("drawing surface has no area ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },

    #[error("no drawing surface to attach to")]
    MissingSurface,
}
