//! Scenario system for saving and restoring simulation states.
//!
//! A Scenario bundles the physics constants, the per-tick parameters and a
//! particle snapshot so a run can be reproduced from a single JSON file.

use std::path::Path;

use glam::Vec2;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::{SimulationParams, SphConfig};
use crate::error::SimError;
use crate::particle::{jitter, spawn_block, Particle};
use crate::solver::SphSolver;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub config: SphConfig,
    #[serde(default)]
    pub params: SimulationParams,
    pub particles: Vec<Particle>,
}

impl Scenario {
    pub fn new(name: &str, particles: Vec<Particle>) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            config: SphConfig::default(),
            params: SimulationParams::default(),
            particles,
        }
    }

    /// Jittered block of fluid resting in the lower-left of the default box.
    pub fn dam_break(columns: usize, rows: usize, seed: u64) -> Self {
        let mut particles = spawn_block(Vec2::new(1.0, 0.5), columns, rows, 0.5, 1.0);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        jitter(&mut particles, 0.05, &mut rng);

        let width = (particles.len() as u32).clamp(1, 64);
        Self {
            name: "dam_break".to_string(),
            description: format!("{}x{} block, seed {}", columns, rows, seed),
            config: SphConfig::default(),
            params: SimulationParams::new(0.1, width),
            particles,
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        self.config.validate()?;
        self.params.validate()
    }

    pub fn build_solver(&self) -> Result<SphSolver, SimError> {
        SphSolver::new(self.config.clone(), self.params, self.particles.clone())
    }

    /// Save scenario to a JSON file.
    pub fn save_json(&self, path: &Path) -> Result<(), SimError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load scenario from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        let scenario: Scenario = serde_json::from_str(&json)?;
        scenario.validate()?;
        log::info!(
            "Loaded scenario '{}' ({} particles) from {}",
            scenario.name,
            scenario.particles.len(),
            path.display()
        );
        Ok(scenario)
    }
}
