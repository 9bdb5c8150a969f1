//! Execution backend selection.
//!
//! ## Purpose
//!
//! This module defines the `Backend` enum used to pick the kind of device a
//! reduction runs on. The core crate only ships an inline host device; the
//! multi-threaded CPU device and the GPU device live in `fastHetreduce`, which
//! maps this hint onto a concrete device.
//!
//! ## Invariants
//!
//! * The default backend is always `CPU`.

/// Execution backend hint for extension crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[allow(clippy::upper_case_acronyms)]
pub enum Backend {
    /// CPU execution (may still use parallelism via rayon).
    #[default]
    CPU,

    /// GPU execution (requires extension crate with GPU support).
    GPU,
}

impl Backend {
    /// Short lowercase name, used in log lines and benchmark ids.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CPU => "cpu",
            Self::GPU => "gpu",
        }
    }
}
