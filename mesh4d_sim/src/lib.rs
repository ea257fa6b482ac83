//! mesh4d Simulation Driver
//!
//! This crate wraps the `mesh4d_core` engine with everything a run needs
//! around it:
//! - **Configuration**: `SimConfig` defaults, JSON loading and validation
//! - **Roster generation**: seeded placement and protocol assignment
//! - **Runs**: fixed-length tick loops with per-tick observers
//! - **Export**: JSON frames for external renderers
//!
//! # Seeds
//!
//! A single 64-bit master seed drives the run. Placement and physics get
//! separate derived streams, so the same seed always reproduces the same run.
//!
//! # Usage
//!
//! ```
//! use mesh4d_sim::{SimConfig, Simulation};
//!
//! let config = SimConfig {
//!     seed: 42,
//!     num_nodes: 6,
//!     steps: 10,
//!     ..Default::default()
//! };
//!
//! let mut sim = Simulation::populated(config).unwrap();
//! let summary = sim.run().unwrap();
//! assert_eq!(summary.total_ticks, 10);
//! ```

mod config;
mod error;
mod exporter;
mod simulation;
pub mod scenarios;

pub use config::{ProtocolOdds, SimConfig};
pub use error::SimError;
pub use exporter::{SimExport, SimFrame};
pub use scenarios::ScenarioId;
pub use simulation::{RunSummary, Simulation};
