//! Core deterministic primitives.
//!
//! Seeded randomness for targets and grouping, and digest hashing for
//! exported results. Nothing here touches the clock or the network.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::{DeterministicRng, derive_round_seed, derive_session_seed};
pub use hash::{DigestHasher, ResultsDigest};
