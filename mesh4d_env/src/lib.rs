//! mesh4d Environment Abstraction Layer
//!
//! This crate isolates every source of non-determinism the mesh engine
//! touches so that the same stepping code runs in **exploration** mode (OS
//! entropy) and in **reproducible** mode (seeded or scripted randomness).
//!
//! # Core Concept
//!
//! The engine never calls a process-global RNG. All stochastic decisions
//! (drain jitter, range jitter, intermittent faults, state flips, initial
//! velocities) go through an [`EntropySource`] handed to the mesh:
//! - [`SeededEntropy`]: ChaCha8 stream derived from a 64-bit seed
//! - [`OsEntropy`]: OS-seeded stream for ad-hoc runs
//! - [`ScriptedEntropy`]: fixed, cycling sequence for unit tests
//!
//! # Example
//!
//! ```
//! use mesh4d_env::{EntropySource, SeededEntropy};
//!
//! let mut a = SeededEntropy::new(7);
//! let mut b = SeededEntropy::new(7);
//! assert_eq!(a.uniform(0.8, 1.2), b.uniform(0.8, 1.2));
//! ```

mod entropy;
mod error;
mod os_impl;
mod sim_impl;
mod types;

pub use entropy::EntropySource;
pub use error::EnvError;
pub use os_impl::OsEntropy;
pub use sim_impl::{ScriptedEntropy, SeededEntropy};
pub use types::NodeId;
