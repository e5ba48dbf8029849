//! Velocity update and flight.

use super::Particle;
use crate::core::Fitness;
use crate::error::{EvoError, Result};
use crate::random::RandomSource;
use crate::variation::fold_in_bounds;

/// Velocity update rule.
pub trait Velocity<F: Fitness> {
    /// Updates the velocity of `particle` given the best position of its
    /// neighbourhood.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] when `social` and the particle differ
    /// in dimension.
    fn update(
        &mut self,
        particle: &mut Particle<F>,
        social: &[f64],
        rng: &mut RandomSource,
    ) -> Result<()>;

    /// Called once per completed generation.
    fn next_generation(&mut self, _generation: usize) {}
}

/// Linearly decreasing inertia weight.
///
/// `weight(g)` goes from `start` at generation 0 to `end` at
/// `generations`, and stays at `end` afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InertiaSchedule {
    start: f64,
    end: f64,
    generations: usize,
}

impl InertiaSchedule {
    /// Linear decay from `start` to `end` over `generations`.
    pub fn linear(start: f64, end: f64, generations: usize) -> Self {
        Self {
            start,
            end,
            generations,
        }
    }

    /// Inertia weight at generation `g`.
    pub fn weight(&self, g: usize) -> f64 {
        if self.generations == 0 {
            return self.end;
        }
        let t = (g as f64 / self.generations as f64).min(1.0);
        self.start + (self.end - self.start) * t
    }
}

/// The standard inertia-weight update:
///
/// `v = w*v + c1*r1*(p_best - x) + c2*r2*(g_best - x)`
///
/// with `r1`, `r2` uniform in `[0, 1)`, drawn once per particle and update.
/// Each component is then clamped to `[-max_speed[d], max_speed[d]]` when a
/// speed limit is set.
#[derive(Debug, Clone)]
pub struct StandardVelocity {
    inertia: f64,
    c1: f64,
    c2: f64,
    max_speed: Option<Vec<f64>>,
    schedule: Option<InertiaSchedule>,
}

impl StandardVelocity {
    /// Constant inertia `w`, cognitive weight `c1`, social weight `c2`.
    pub fn new(inertia: f64, c1: f64, c2: f64) -> Self {
        Self {
            inertia,
            c1,
            c2,
            max_speed: None,
            schedule: None,
        }
    }

    /// Limits the speed per dimension. Negative limits are taken by
    /// absolute value.
    pub fn with_max_speed(mut self, max_speed: Vec<f64>) -> Self {
        if max_speed.iter().any(|v| *v < 0.0) {
            tracing::warn!("negative speed limit, using its absolute value");
        }
        self.max_speed = Some(max_speed.into_iter().map(f64::abs).collect());
        self
    }

    /// Replaces the constant inertia with a schedule.
    pub fn with_schedule(mut self, schedule: InertiaSchedule) -> Self {
        self.inertia = schedule.weight(0);
        self.schedule = Some(schedule);
        self
    }

    /// Inertia weight currently in use.
    pub fn inertia(&self) -> f64 {
        self.inertia
    }
}

impl<F: Fitness> Velocity<F> for StandardVelocity {
    fn update(
        &mut self,
        particle: &mut Particle<F>,
        social: &[f64],
        rng: &mut RandomSource,
    ) -> Result<()> {
        let n = particle.position().len();
        if social.len() != n {
            return Err(EvoError::contract(format!(
                "neighbourhood best has dimension {}, particle has {n}",
                social.len()
            )));
        }
        if let Some(vmax) = &self.max_speed {
            if vmax.len() != n {
                return Err(EvoError::contract(format!(
                    "speed limit has dimension {}, particle has {n}",
                    vmax.len()
                )));
            }
        }

        let r1 = rng.unit() * self.c1;
        let r2 = rng.unit() * self.c2;
        let new_velocity: Vec<f64> = (0..n)
            .map(|d| {
                let x = particle.position()[d];
                let mut v = self.inertia * particle.velocity()[d]
                    + r1 * (particle.best_position()[d] - x)
                    + r2 * (social[d] - x);
                if let Some(vmax) = &self.max_speed {
                    v = v.clamp(-vmax[d], vmax[d]);
                }
                v
            })
            .collect();
        particle.velocity_mut().copy_from_slice(&new_velocity);
        Ok(())
    }

    fn next_generation(&mut self, generation: usize) {
        if let Some(schedule) = &self.schedule {
            self.inertia = schedule.weight(generation);
        }
    }
}

/// Moves a particle by its velocity, optionally keeping it in a box.
///
/// A component that leaves `[low, high]` is folded back inside and its
/// velocity component is reversed.
#[derive(Debug, Clone, Default)]
pub struct StandardFlight {
    bounds: Option<Vec<(f64, f64)>>,
}

impl StandardFlight {
    /// Unbounded flight.
    pub fn new() -> Self {
        Self::default()
    }

    /// Flight inside per-dimension `(low, high)` bounds.
    pub fn bounded(bounds: Vec<(f64, f64)>) -> Self {
        Self {
            bounds: Some(bounds),
        }
    }

    /// The bounds, if any.
    pub fn bounds(&self) -> Option<&[(f64, f64)]> {
        self.bounds.as_deref()
    }

    /// Flies `particle` one step.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] when bounds are set and differ in
    /// dimension from the particle.
    pub fn fly<F: Fitness>(&self, particle: &mut Particle<F>) -> Result<()> {
        let Some(bounds) = &self.bounds else {
            particle.fly();
            return Ok(());
        };
        let n = particle.position().len();
        if bounds.len() != n {
            return Err(EvoError::contract(format!(
                "bounds have dimension {}, particle has {n}",
                bounds.len()
            )));
        }
        particle.fly();
        for (d, &(low, high)) in bounds.iter().enumerate() {
            let x = particle.position()[d];
            if x < low || x > high {
                let v = particle.velocity()[d];
                particle.position_mut()[d] = fold_in_bounds(x, low, high);
                particle.velocity_mut()[d] = -v;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Individual, Minimizing};

    #[test]
    fn test_inertia_schedule() {
        let s = InertiaSchedule::linear(0.9, 0.4, 10);
        assert_eq!(s.weight(0), 0.9);
        assert!((s.weight(5) - 0.65).abs() < 1e-12);
        assert!((s.weight(10) - 0.4).abs() < 1e-12);
        assert!((s.weight(50) - 0.4).abs() < 1e-12);
        assert_eq!(InertiaSchedule::linear(0.9, 0.4, 0).weight(0), 0.4);
    }

    #[test]
    fn test_pure_inertia() {
        let mut vel = StandardVelocity::new(0.5, 0.0, 0.0);
        let mut p: Particle = Particle::new(vec![1.0, 1.0]).with_velocity(vec![2.0, -4.0]);
        vel.update(&mut p, &[0.0, 0.0], &mut RandomSource::new(1))
            .unwrap();
        assert_eq!(p.velocity(), &[1.0, -2.0]);
    }

    #[test]
    fn test_attraction_direction() {
        let mut vel = StandardVelocity::new(0.0, 0.0, 2.0);
        let mut rng = RandomSource::new(3);
        for _ in 0..20 {
            let mut p: Particle = Particle::new(vec![0.0]);
            vel.update(&mut p, &[10.0], &mut rng).unwrap();
            let v = p.velocity()[0];
            assert!((0.0..20.0).contains(&v), "velocity {v} not towards social best");
        }
    }

    #[test]
    fn test_speed_clamp() {
        let mut vel = StandardVelocity::new(1.0, 0.0, 0.0).with_max_speed(vec![1.0, -0.5]);
        let mut p: Particle = Particle::new(vec![0.0, 0.0]).with_velocity(vec![5.0, -5.0]);
        vel.update(&mut p, &[0.0, 0.0], &mut RandomSource::new(1))
            .unwrap();
        assert_eq!(p.velocity(), &[1.0, -0.5]);
    }

    #[test]
    fn test_velocity_keeps_fitness() {
        let mut vel = StandardVelocity::new(0.7, 1.5, 1.5);
        let mut p: Particle = Particle::new(vec![0.0]);
        p.set_fitness(Minimizing(1.0));
        vel.update(&mut p, &[1.0], &mut RandomSource::new(1)).unwrap();
        assert!(p.is_valid());
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut vel = StandardVelocity::new(0.7, 1.5, 1.5);
        let mut p: Particle = Particle::new(vec![0.0, 0.0]);
        let err = vel
            .update(&mut p, &[1.0], &mut RandomSource::new(1))
            .unwrap_err();
        assert!(matches!(err, EvoError::ContractViolation(_)));
    }

    #[test]
    fn test_schedule_advances() {
        let mut vel = StandardVelocity::new(0.0, 1.0, 1.0)
            .with_schedule(InertiaSchedule::linear(0.9, 0.4, 10));
        assert_eq!(vel.inertia(), 0.9);
        Velocity::<Minimizing>::next_generation(&mut vel, 10);
        assert!((vel.inertia() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_bounded_flight_reflects() {
        let flight = StandardFlight::bounded(vec![(-1.0, 1.0), (-1.0, 1.0)]);
        let mut p: Particle = Particle::new(vec![0.5, 0.0]).with_velocity(vec![1.0, 0.5]);
        p.set_fitness(Minimizing(0.0));
        flight.fly(&mut p).unwrap();
        assert!((p.position()[0] - 0.5).abs() < 1e-12);
        assert_eq!(p.position()[1], 0.5);
        assert_eq!(p.velocity(), &[-1.0, 0.5]);
        assert!(!p.is_valid());
    }

    #[test]
    fn test_unbounded_flight() {
        let mut p: Particle = Particle::new(vec![0.0]).with_velocity(vec![100.0]);
        StandardFlight::new().fly(&mut p).unwrap();
        assert_eq!(p.position(), &[100.0]);

        let flight = StandardFlight::bounded(vec![(0.0, 1.0)]);
        let mut q: Particle = Particle::new(vec![0.0, 0.0]);
        assert!(flight.fly(&mut q).is_err());
    }
}
