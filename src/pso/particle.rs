//! Swarm member.

use crate::core::{Fitness, Individual, Minimizing};

/// A particle: a real-vector candidate with a velocity and a memory of the
/// best position it has visited.
///
/// The current fitness follows the usual validity rule: moving the particle
/// through [`position_mut`](Self::position_mut) invalidates it. The
/// best-known data changes only through [`update_best`](Self::update_best),
/// and only on strict improvement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Particle<F = Minimizing> {
    position: Vec<f64>,
    velocity: Vec<f64>,
    best_position: Vec<f64>,
    best_fitness: Option<F>,
    fitness: Option<F>,
}

impl<F: Fitness> Particle<F> {
    /// Creates an unevaluated particle at rest.
    pub fn new(position: Vec<f64>) -> Self {
        let n = position.len();
        Self {
            best_position: position.clone(),
            position,
            velocity: vec![0.0; n],
            best_fitness: None,
            fitness: None,
        }
    }

    /// Sets the initial velocity.
    ///
    /// # Panics
    /// Panics if `velocity` and the position differ in length.
    pub fn with_velocity(mut self, velocity: Vec<f64>) -> Self {
        assert_eq!(
            velocity.len(),
            self.position.len(),
            "velocity and position must have equal length"
        );
        self.velocity = velocity;
        self
    }

    /// Current position.
    pub fn position(&self) -> &[f64] {
        &self.position
    }

    /// Mutable position. Invalidates the current fitness.
    pub fn position_mut(&mut self) -> &mut [f64] {
        self.fitness = None;
        &mut self.position
    }

    /// Current velocity.
    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    /// Mutable velocity. The fitness stays valid.
    pub fn velocity_mut(&mut self) -> &mut [f64] {
        &mut self.velocity
    }

    /// Best position visited.
    pub fn best_position(&self) -> &[f64] {
        &self.best_position
    }

    /// Fitness at [`best_position`](Self::best_position), `None` before the
    /// first evaluation.
    pub fn best_fitness(&self) -> Option<F> {
        self.best_fitness
    }

    /// Moves by one velocity step.
    pub fn fly(&mut self) {
        for (x, v) in self.position.iter_mut().zip(&self.velocity) {
            *x += v;
        }
        self.fitness = None;
    }

    /// Records the current position as best-known if its fitness is
    /// strictly better. Returns whether it was.
    ///
    /// An invalid particle never updates.
    pub fn update_best(&mut self) -> bool {
        let Some(fit) = self.fitness else {
            return false;
        };
        if self.best_fitness.is_some_and(|best| fit <= best) {
            return false;
        }
        self.best_fitness = Some(fit);
        self.best_position.clone_from(&self.position);
        true
    }
}

impl<F: Fitness> Individual for Particle<F> {
    type Genome = Vec<f64>;
    type Fitness = F;

    fn genome(&self) -> &Vec<f64> {
        &self.position
    }

    fn try_fitness(&self) -> Option<F> {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: F) {
        self.fitness = Some(fitness);
    }

    fn invalidate(&mut self) {
        self.fitness = None;
    }
}
