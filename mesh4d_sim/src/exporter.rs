//! JSON exporter for external renderers.
//!
//! Exports per-tick mesh frames as JSON; drawing them is left to whatever
//! consumes the file.

use crate::simulation::RunSummary;
use mesh4d_core::{Connection, Mesh, NodeSnapshot, TickReport};
use mesh4d_env::EntropySource;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A single frame of simulation data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    pub tick: u64,

    /// Simulation time
    pub time: f64,

    pub active_nodes: usize,

    /// Node roster after the tick
    pub nodes: Vec<NodeSnapshot>,

    /// Connections formed during the tick
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub connections: Vec<Connection>,
}

impl SimFrame {
    /// Captures a frame from a tick report and the mesh it came from.
    pub fn capture<E: EntropySource>(report: &TickReport, mesh: &Mesh<E>) -> Self {
        Self {
            tick: report.tick,
            time: report.time,
            active_nodes: report.active_nodes,
            nodes: mesh.snapshot().nodes,
            connections: report.connections.clone(),
        }
    }
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// World extents [x, y, z]
    pub bounds: [f64; 3],

    /// Time of the last exported frame
    pub duration: f64,

    /// All frames
    pub frames: Vec<SimFrame>,

    /// Final results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64, bounds: [f64; 3]) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            bounds,
            duration: 0.0,
            frames: Vec::new(),
            summary: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration = frame.time;
        self.frames.push(frame);
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, summary: RunSummary) {
        self.summary = Some(summary);
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
