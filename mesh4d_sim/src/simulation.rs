//! Simulation - seeded roster generation and fixed-length runs.

use crate::config::{ProtocolOdds, SimConfig};
use crate::error::SimError;
use mesh4d_core::{
    BatterySummary, CommunicationType, Mesh, Node, NodeState, Position, ProtocolSet, TickReport,
};
use mesh4d_env::{EntropySource, NodeId, OsEntropy, SeededEntropy};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Uniform};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Aggregate outcome of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Seed used
    pub seed: u64,

    /// Ticks executed
    pub total_ticks: u64,

    /// Simulation time at the end of the run
    pub final_time: f64,

    pub node_count: usize,
    pub final_active: usize,
    pub final_intermittent: usize,
    pub final_offline: usize,

    /// Connections summed over every tick
    pub total_connections: u64,

    /// Largest connection count seen in a single tick
    pub peak_connections: usize,

    /// Time of the first tick that ended with an offline node
    pub first_offline_time: Option<f64>,

    /// Encounter records across the roster at the end of the run
    pub total_encounters: usize,

    pub final_battery: Option<BatterySummary>,
}

/// Owns a mesh plus the generator that populates it.
///
/// Seeded runs (the default) replay exactly; [`Simulation::unseeded`] runs
/// on OS entropy instead.
pub struct Simulation<E: EntropySource = SeededEntropy> {
    config: SimConfig,

    /// Engine, driven by the physics stream
    mesh: Mesh<E>,

    /// RNG for roster placement (separate from physics)
    placement_rng: ChaCha8Rng,
}

impl Simulation<SeededEntropy> {
    /// Creates a simulation with an empty roster.
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        // Derive separate seeds for placement and physics
        let placement_seed = config.seed;
        let physics_seed = config.seed.wrapping_mul(0x9e3779b97f4a7c15);

        Self::assemble(
            config,
            SeededEntropy::new(physics_seed),
            ChaCha8Rng::seed_from_u64(placement_seed),
        )
    }

    /// Creates a simulation and generates `config.num_nodes` nodes.
    pub fn populated(config: SimConfig) -> Result<Self, SimError> {
        Self::new(config)?.populate()
    }
}

impl Simulation<OsEntropy> {
    /// Creates a simulation whose placement and physics draw from OS
    /// entropy. Such a run cannot be replayed; its seed is reported as 0.
    pub fn unseeded(mut config: SimConfig) -> Result<Self, SimError> {
        config.seed = 0;
        Self::assemble(config, OsEntropy::new(), ChaCha8Rng::from_entropy())
    }
}

impl<E: EntropySource> Simulation<E> {
    fn assemble(
        config: SimConfig,
        entropy: E,
        placement_rng: ChaCha8Rng,
    ) -> Result<Self, SimError> {
        config.validate()?;
        let mesh = Mesh::new(config.mesh_config()?, entropy)?;

        Ok(Self {
            config,
            mesh,
            placement_rng,
        })
    }

    /// Generates `config.num_nodes` nodes.
    pub fn populate(mut self) -> Result<Self, SimError> {
        let count = self.config.num_nodes;
        self.generate_random_nodes(count)?;
        Ok(self)
    }

    /// Adds `count` nodes at uniform random positions inside the bounds.
    ///
    /// Every node carries BLE; WIFI, GPS and CUSTOM are drawn independently
    /// per `protocol_odds`.
    pub fn generate_random_nodes(&mut self, count: usize) -> Result<Vec<NodeId>, SimError> {
        let [bx, by, bz] = self.config.bounds;
        let xs = Uniform::new_inclusive(0.0, bx);
        let ys = Uniform::new_inclusive(0.0, by);
        let zs = Uniform::new_inclusive(0.0, bz);

        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            let position = Position::new(
                xs.sample(&mut self.placement_rng),
                ys.sample(&mut self.placement_rng),
                zs.sample(&mut self.placement_rng),
            );

            let odds = self.config.protocol_odds;
            let optional = ProtocolOdds::OPTIONAL
                .into_iter()
                .filter(|p| self.placement_rng.gen::<f64>() < odds.odds(*p));
            let protocols =
                ProtocolSet::new(std::iter::once(CommunicationType::Ble).chain(optional))?;

            let node = Node::new(self.mesh.next_node_id(), position, protocols)
                .with_battery(self.config.initial_battery)?;
            ids.push(self.mesh.add_node(node)?);
        }

        debug!("Generated {} nodes (roster size {})", count, self.mesh.len());
        Ok(ids)
    }

    /// Runs one tick with the configured `dt`.
    pub fn step(&mut self) -> Result<TickReport, SimError> {
        let report = self.mesh.step(self.config.dt)?;
        if self.config.log_every > 0 && report.tick % self.config.log_every == 0 {
            info!("{}", report);
        }
        Ok(report)
    }

    /// Runs `config.steps` ticks.
    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        self.run_with(|_, _| {})
    }

    /// Runs `config.steps` ticks, handing every report and the post-tick
    /// mesh to `observer`.
    pub fn run_with<F>(&mut self, mut observer: F) -> Result<RunSummary, SimError>
    where
        F: FnMut(&TickReport, &Mesh<E>),
    {
        info!(
            "Starting run: nodes={} steps={} dt={} seed={}",
            self.mesh.len(),
            self.config.steps,
            self.config.dt,
            self.config.seed
        );

        let mut total_connections = 0u64;
        let mut peak_connections = 0usize;
        let mut first_offline_time = None;

        for _ in 0..self.config.steps {
            let report = self.step()?;

            total_connections += report.connection_count() as u64;
            peak_connections = peak_connections.max(report.connection_count());
            if first_offline_time.is_none() && report.offline_nodes > 0 {
                first_offline_time = Some(report.time);
            }

            observer(&report, &self.mesh);
        }

        let summary = self.summarize(total_connections, peak_connections, first_offline_time);
        info!(
            "Run finished: t={:.1} active={} intermittent={} offline={} connections={}",
            summary.final_time,
            summary.final_active,
            summary.final_intermittent,
            summary.final_offline,
            summary.total_connections
        );
        Ok(summary)
    }

    fn summarize(
        &self,
        total_connections: u64,
        peak_connections: usize,
        first_offline_time: Option<f64>,
    ) -> RunSummary {
        let nodes = self.mesh.nodes();
        RunSummary {
            seed: self.config.seed,
            total_ticks: self.mesh.tick(),
            final_time: self.mesh.time(),
            node_count: nodes.len(),
            final_active: self.mesh.count_in_state(NodeState::Active),
            final_intermittent: self.mesh.count_in_state(NodeState::Intermittent),
            final_offline: self.mesh.count_in_state(NodeState::Offline),
            total_connections,
            peak_connections,
            first_offline_time,
            total_encounters: nodes.iter().map(|n| n.encounters().len()).sum(),
            final_battery: BatterySummary::from_levels(nodes.iter().map(Node::battery_level)),
        }
    }

    pub fn mesh(&self) -> &Mesh<E> {
        &self.mesh
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }
}
