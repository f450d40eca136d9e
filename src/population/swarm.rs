use rand::{Rng, RngCore};
use tracing::debug;

use super::config::ParticleSwarmConfig;
use super::members::{collapsed, diversity, fittest, seed_generation, Member};
use crate::error::{Result, SearchError};
use crate::memory::EvaluationMemory;
use crate::space::{Position, SearchSpace};
use crate::strategy::OptimizerStrategy;

/// Velocity below which a particle no longer leaves its grid cell.
const RESTING_VELOCITY: f64 = 0.5;

#[derive(Debug, Clone)]
struct Particle {
    coords: Vec<f64>,
    velocity: Vec<f64>,
    best: Member,
}

/// Particle swarm optimization.
///
/// Particles move in continuous index coordinates and are rounded onto the
/// grid for evaluation. Each step blends inertia, attraction to the
/// particle's own best and attraction to the swarm's best. Coordinates
/// overshooting a bound are clamped and that velocity component is zeroed.
///
/// # References
///
/// - Kennedy & Eberhart (1995), "Particle Swarm Optimization"
#[derive(Debug, Clone)]
pub struct ParticleSwarm {
    config: ParticleSwarmConfig,
    particles: Vec<Particle>,
    global_best: Option<Member>,
    pending: Vec<Position>,
    generation: usize,
}

impl Default for ParticleSwarm {
    fn default() -> Self {
        Self::new(ParticleSwarmConfig::default())
    }
}

impl ParticleSwarm {
    pub fn new(config: ParticleSwarmConfig) -> Self {
        Self {
            config,
            particles: Vec::new(),
            global_best: None,
            pending: Vec::new(),
            generation: 0,
        }
    }

    /// Best position found by the swarm and its score.
    pub fn global_best(&self) -> Option<(&Position, f64)> {
        self.global_best.as_ref().map(|m| (&m.position, m.score))
    }

    pub fn generation(&self) -> usize {
        self.generation
    }

    fn spawn(&mut self, space: &SearchSpace, members: Vec<Member>, rng: &mut dyn RngCore) {
        let v0 = self.config.initial_velocity;
        self.particles = members
            .into_iter()
            .map(|m| Particle {
                coords: space.to_continuous(&m.position),
                velocity: space
                    .sizes()
                    .iter()
                    .map(|&k| {
                        let span = v0 * (k - 1) as f64;
                        if span > 0.0 {
                            rng.random_range(-span..=span)
                        } else {
                            0.0
                        }
                    })
                    .collect(),
                best: m,
            })
            .collect();
    }

    fn fly(&mut self, space: &SearchSpace, rng: &mut dyn RngCore) {
        let Some(global) = &self.global_best else {
            return;
        };
        let global = space.to_continuous(&global.position);
        let c = &self.config;
        for particle in &mut self.particles {
            let own = space.to_continuous(&particle.best.position);
            for d in 0..particle.coords.len() {
                let r1: f64 = rng.random();
                let r2: f64 = rng.random();
                let x = particle.coords[d];
                particle.velocity[d] = c.inertia * particle.velocity[d]
                    + c.cognitive_weight * r1 * (own[d] - x)
                    + c.social_weight * r2 * (global[d] - x);
                particle.coords[d] = x + particle.velocity[d];
            }
            let before = particle.coords.clone();
            space.clamp_continuous(&mut particle.coords);
            for (d, (a, b)) in before.iter().zip(&particle.coords).enumerate() {
                if a != b {
                    particle.velocity[d] = 0.0;
                }
            }
        }
        self.pending = self
            .particles
            .iter()
            .map(|p| space.from_continuous(&p.coords))
            .collect();
    }
}

impl OptimizerStrategy for ParticleSwarm {
    fn name(&self) -> &'static str {
        "particle_swarm"
    }

    fn initialize(
        &mut self,
        space: &SearchSpace,
        rng: &mut dyn RngCore,
        initial: &[Position],
    ) -> Result<()> {
        self.config.validate().map_err(SearchError::Configuration)?;
        self.particles.clear();
        self.global_best = None;
        self.generation = 0;
        self.pending = seed_generation(space, rng, initial, self.config.population);
        Ok(())
    }

    fn propose(
        &self,
        _space: &SearchSpace,
        _memory: &EvaluationMemory,
        _rng: &mut dyn RngCore,
    ) -> Vec<Position> {
        self.pending.clone()
    }

    fn update(
        &mut self,
        space: &SearchSpace,
        proposed: &[Position],
        scores: &[f64],
        rng: &mut dyn RngCore,
    ) {
        if self.particles.is_empty() {
            let members = fittest(proposed, scores, self.config.population);
            self.global_best = members.first().cloned();
            self.spawn(space, members, rng);
        } else {
            for ((particle, position), &score) in
                self.particles.iter_mut().zip(proposed).zip(scores)
            {
                if score > particle.best.score {
                    particle.best = Member {
                        position: position.clone(),
                        score,
                    };
                }
            }
            for particle in &self.particles {
                let improves = match &self.global_best {
                    Some(g) => particle.best.score > g.score,
                    None => true,
                };
                if improves {
                    self.global_best = Some(particle.best.clone());
                }
            }
        }
        self.generation += 1;
        self.fly(space, rng);
        debug!(
            generation = self.generation,
            diversity = diversity(space, self.pending.iter()),
            "swarm moved"
        );
    }

    fn is_converged(&self) -> bool {
        self.generation > 0
            && collapsed(self.pending.iter())
            && self
                .particles
                .iter()
                .all(|p| p.velocity.iter().all(|v| v.abs() < RESTING_VELOCITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::create_rng;
    use crate::space::Dimension;
    use crate::strategy::testing::drive;

    fn sphere(p: &Position) -> f64 {
        -((p[0] as f64 - 12.0).powi(2) + (p[1] as f64 - 30.0).powi(2))
    }

    fn space() -> SearchSpace {
        SearchSpace::new(vec![
            Dimension::integer("x", 0, 40),
            Dimension::integer("y", 0, 40),
        ])
        .unwrap()
    }

    #[test]
    fn test_swarm_proposes_whole_population() {
        let space = space();
        let mut pso = ParticleSwarm::default();
        let mut rng = create_rng(0);
        pso.initialize(&space, &mut rng, &[]).unwrap();
        let memory = EvaluationMemory::new();
        assert_eq!(pso.propose(&space, &memory, &mut rng).len(), 10);
    }

    #[test]
    fn test_swarm_improves_and_stays_in_bounds() {
        let space = space();
        let mut pso = ParticleSwarm::default();
        let mut rng = create_rng(7);
        pso.initialize(&space, &mut rng, &[]).unwrap();
        let memory = drive(&mut pso, &space, 30, 7, sphere);
        let first_gen_best = memory.history()[..10]
            .iter()
            .map(|r| r.score())
            .fold(f64::NEG_INFINITY, f64::max);
        let best = memory.best().map(|(_, s)| s).unwrap();
        assert!(best >= first_gen_best);
        assert!(best > -100.0, "best {best}");
        assert_eq!(pso.global_best().map(|(_, s)| s), Some(best));
    }

    #[test]
    fn test_degenerate_space_converges() {
        let space = SearchSpace::new(vec![Dimension::integer("x", 5, 5)]).unwrap();
        let mut pso = ParticleSwarm::default();
        let mut rng = create_rng(0);
        pso.initialize(&space, &mut rng, &[]).unwrap();
        drive(&mut pso, &space, 2, 0, |_| 1.0);
        assert!(pso.is_converged());
    }
}
