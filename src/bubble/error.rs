use thiserror::Error;

/// Fatal conditions of a bubble search. Per-node outcomes (bubbles that do
/// not close or are rejected by policy) are never errors.
#[derive(Debug, Error)]
pub enum FinderError {
    #[error("k-mer size {k} exceeds path buffer capacity (max {max})")]
    KmerTooLarge { k: usize, max: usize },

    #[error("k-mer size {k} is too small (min {min})")]
    KmerTooSmall { k: usize, min: usize },

    #[error("k-mer size {k} must be odd")]
    KmerEven { k: usize },

    #[error("k-mer size {config} does not match the graph k-mer size {graph}")]
    KmerMismatch { config: usize, graph: usize },

    #[error("minimum extension length {min} exceeds maximum extension length {max}")]
    ExtensionBounds { min: usize, max: usize },

    #[error("maximum extension length must be at least 1 to hold the anchor")]
    ZeroExtensionLength,

    #[error("unknown {option} '{value}'")]
    InvalidOption { option: &'static str, value: String },

    #[error("failed to write bubble records")]
    Output(#[source] std::io::Error),

    #[error("bubble search worker panicked")]
    WorkerPanicked,
}
