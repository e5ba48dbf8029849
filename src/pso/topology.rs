//! Neighbourhood structures over swarm indices.
//!
//! A topology never owns particles. It keeps, per neighbourhood, the member
//! indices and a copy of the best position any member has reported.

use super::Particle;
use crate::core::Fitness;
use crate::error::{EvoError, Result};
use crate::random::RandomSource;

/// Social structure of a swarm.
pub trait Topology<F: Fitness> {
    /// Builds the neighbourhoods from an evaluated swarm.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] on an empty swarm or a particle
    /// without best-known fitness.
    fn setup(&mut self, swarm: &[Particle<F>], rng: &mut RandomSource) -> Result<()>;

    /// Offers the best-known data of particle `index` to every
    /// neighbourhood it belongs to.
    fn update(&mut self, particle: &Particle<F>, index: usize);

    /// Best position of the neighbourhood that guides particle `index`.
    ///
    /// # Panics
    /// Panics if called before [`setup`](Self::setup).
    fn best(&self, index: usize) -> &[f64];

    /// Called between generations. Dynamic topologies rebuild here.
    fn next_generation(&mut self, _swarm: &[Particle<F>], _rng: &mut RandomSource) -> Result<()> {
        Ok(())
    }
}

impl<F: Fitness, T: Topology<F> + ?Sized> Topology<F> for Box<T> {
    fn setup(&mut self, swarm: &[Particle<F>], rng: &mut RandomSource) -> Result<()> {
        (**self).setup(swarm, rng)
    }

    fn update(&mut self, particle: &Particle<F>, index: usize) {
        (**self).update(particle, index)
    }

    fn best(&self, index: usize) -> &[f64] {
        (**self).best(index)
    }

    fn next_generation(&mut self, swarm: &[Particle<F>], rng: &mut RandomSource) -> Result<()> {
        (**self).next_generation(swarm, rng)
    }
}

#[derive(Debug, Clone)]
struct Neighbourhoods<F> {
    /// Neighbourhoods each particle belongs to.
    containing: Vec<Vec<usize>>,
    /// Neighbourhood guiding each particle.
    guide: Vec<usize>,
    best: Vec<(Vec<f64>, F)>,
}

impl<F: Fitness> Neighbourhoods<F> {
    fn build(members: &[Vec<usize>], guide: Vec<usize>, swarm: &[Particle<F>]) -> Result<Self> {
        let mut containing = vec![Vec::new(); swarm.len()];
        let mut best = Vec::with_capacity(members.len());
        for (k, group) in members.iter().enumerate() {
            let mut champion: Option<(usize, F)> = None;
            for &i in group {
                containing[i].push(k);
                let fit = best_known(swarm, i)?;
                if champion.map_or(true, |(_, c)| fit > c) {
                    champion = Some((i, fit));
                }
            }
            let (c, fit) = champion.ok_or_else(|| EvoError::contract("empty neighbourhood"))?;
            best.push((swarm[c].best_position().to_vec(), fit));
        }
        Ok(Self {
            containing,
            guide,
            best,
        })
    }

    fn offer(&mut self, particle: &Particle<F>, index: usize) {
        let Some(fit) = particle.best_fitness() else {
            return;
        };
        for &k in &self.containing[index] {
            let slot = &mut self.best[k];
            if fit > slot.1 {
                slot.0.clear();
                slot.0.extend_from_slice(particle.best_position());
                slot.1 = fit;
            }
        }
    }

    fn best(&self, index: usize) -> &[f64] {
        &self.best[self.guide[index]].0
    }
}

fn best_known<F: Fitness>(swarm: &[Particle<F>], i: usize) -> Result<F> {
    swarm[i]
        .best_fitness()
        .ok_or_else(|| EvoError::contract(format!("particle {i} has no best-known fitness")))
}

fn ensure_swarm<F>(swarm: &[Particle<F>]) -> Result<()> {
    if swarm.is_empty() {
        return Err(EvoError::contract("empty swarm"));
    }
    Ok(())
}

fn built<F>(n: &Option<Neighbourhoods<F>>) -> &Neighbourhoods<F> {
    n.as_ref().expect("topology used before setup")
}

/// Every particle follows the single best of the whole swarm.
#[derive(Debug, Clone)]
pub struct StarTopology<F> {
    hoods: Option<Neighbourhoods<F>>,
}

impl<F: Fitness> StarTopology<F> {
    /// Single neighbourhood holding the whole swarm.
    pub fn new() -> Self {
        Self { hoods: None }
    }

    /// Best position of the swarm, once set up.
    pub fn global_best(&self) -> Option<(&[f64], F)> {
        self.hoods
            .as_ref()
            .map(|h| (h.best[0].0.as_slice(), h.best[0].1))
    }
}

impl<F: Fitness> Default for StarTopology<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Fitness> Topology<F> for StarTopology<F> {
    fn setup(&mut self, swarm: &[Particle<F>], _rng: &mut RandomSource) -> Result<()> {
        ensure_swarm(swarm)?;
        let members = vec![(0..swarm.len()).collect::<Vec<_>>()];
        self.hoods = Some(Neighbourhoods::build(&members, vec![0; swarm.len()], swarm)?);
        Ok(())
    }

    fn update(&mut self, particle: &Particle<F>, index: usize) {
        if let Some(h) = self.hoods.as_mut() {
            h.offer(particle, index);
        }
    }

    fn best(&self, index: usize) -> &[f64] {
        built(&self.hoods).best(index)
    }
}

/// Each particle follows the best of a ring window of `size` consecutive
/// indices centred on itself.
#[derive(Debug, Clone)]
pub struct RingTopology<F> {
    size: usize,
    hoods: Option<Neighbourhoods<F>>,
}

impl<F: Fitness> RingTopology<F> {
    /// Ring with `size` members per neighbourhood (raised to at least 1).
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            hoods: None,
        }
    }

    /// Neighbourhood size.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Member indices of the neighbourhood centred on `index` in a swarm
    /// of `n` particles.
    pub fn members(&self, index: usize, n: usize) -> Vec<usize> {
        let k = self.size.min(n);
        let half = k / 2;
        (0..k).map(|j| (n + index + j - half) % n).collect()
    }
}

impl<F: Fitness> Default for RingTopology<F> {
    fn default() -> Self {
        Self::new(3)
    }
}

impl<F: Fitness> Topology<F> for RingTopology<F> {
    fn setup(&mut self, swarm: &[Particle<F>], _rng: &mut RandomSource) -> Result<()> {
        ensure_swarm(swarm)?;
        let n = swarm.len();
        let members: Vec<Vec<usize>> = (0..n).map(|i| self.members(i, n)).collect();
        self.hoods = Some(Neighbourhoods::build(&members, (0..n).collect(), swarm)?);
        Ok(())
    }

    fn update(&mut self, particle: &Particle<F>, index: usize) {
        if let Some(h) = self.hoods.as_mut() {
            h.offer(particle, index);
        }
    }

    fn best(&self, index: usize) -> &[f64] {
        built(&self.hoods).best(index)
    }
}

/// Random informant topology, rebuilt every generation.
///
/// Each particle informs itself and `informants` particles drawn uniformly
/// (with repetition). Particle `i` follows the best of those that inform it.
#[derive(Debug, Clone)]
pub struct RandomTopology<F> {
    informants: usize,
    hoods: Option<Neighbourhoods<F>>,
}

impl<F: Fitness> RandomTopology<F> {
    /// Topology with `informants` random informants per particle.
    pub fn new(informants: usize) -> Self {
        Self {
            informants,
            hoods: None,
        }
    }

    fn rebuild(&mut self, swarm: &[Particle<F>], rng: &mut RandomSource) -> Result<()> {
        ensure_swarm(swarm)?;
        let n = swarm.len();
        let mut members: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
        for i in 0..n {
            for _ in 0..self.informants {
                let target = rng.integer(n);
                if !members[target].contains(&i) {
                    members[target].push(i);
                }
            }
        }
        self.hoods = Some(Neighbourhoods::build(&members, (0..n).collect(), swarm)?);
        Ok(())
    }
}

impl<F: Fitness> Default for RandomTopology<F> {
    fn default() -> Self {
        Self::new(3)
    }
}

impl<F: Fitness> Topology<F> for RandomTopology<F> {
    fn setup(&mut self, swarm: &[Particle<F>], rng: &mut RandomSource) -> Result<()> {
        self.rebuild(swarm, rng)
    }

    fn update(&mut self, particle: &Particle<F>, index: usize) {
        if let Some(h) = self.hoods.as_mut() {
            h.offer(particle, index);
        }
    }

    fn best(&self, index: usize) -> &[f64] {
        built(&self.hoods).best(index)
    }

    fn next_generation(&mut self, swarm: &[Particle<F>], rng: &mut RandomSource) -> Result<()> {
        self.rebuild(swarm, rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Individual, Minimizing};

    fn swarm(values: &[f64]) -> Vec<Particle<Minimizing>> {
        values
            .iter()
            .map(|&v| {
                let mut p = Particle::new(vec![v]);
                p.set_fitness(Minimizing(v));
                p.update_best();
                p
            })
            .collect()
    }

    #[test]
    fn test_star_follows_global_best() {
        let s = swarm(&[3.0, 1.0, 2.0]);
        let mut t = StarTopology::new();
        t.setup(&s, &mut RandomSource::new(1)).unwrap();
        for i in 0..3 {
            assert_eq!(t.best(i), &[1.0]);
        }

        let mut better = Particle::new(vec![0.5]);
        better.set_fitness(Minimizing(0.5));
        better.update_best();
        t.update(&better, 2);
        assert_eq!(t.best(0), &[0.5]);
        assert_eq!(t.global_best().map(|(_, f)| f), Some(Minimizing(0.5)));
    }

    #[test]
    fn test_ring_members_wrap() {
        let t: RingTopology<Minimizing> = RingTopology::new(3);
        assert_eq!(t.members(0, 5), vec![4, 0, 1]);
        assert_eq!(t.members(4, 5), vec![3, 4, 0]);
        assert_eq!(RingTopology::<Minimizing>::new(10).members(0, 3).len(), 3);
    }

    #[test]
    fn test_ring_is_local() {
        let s = swarm(&[5.0, 4.0, 9.0, 9.0, 1.0, 9.0]);
        let mut t = RingTopology::new(3);
        t.setup(&s, &mut RandomSource::new(1)).unwrap();
        // Neighbourhood of 1 is {0, 1, 2}: best is 4.0.
        assert_eq!(t.best(1), &[4.0]);
        // Neighbourhood of 5 is {4, 5, 0}: best is 1.0.
        assert_eq!(t.best(5), &[1.0]);

        // Particle 1 improves: only neighbourhoods 0, 1 and 2 see it.
        let mut p = Particle::new(vec![0.0]);
        p.set_fitness(Minimizing(0.0));
        p.update_best();
        t.update(&p, 1);
        assert_eq!(t.best(0), &[0.0]);
        assert_eq!(t.best(2), &[0.0]);
        assert_eq!(t.best(4), &[1.0]);
    }

    #[test]
    fn test_random_topology_includes_self() {
        let s = swarm(&[5.0, 4.0, 3.0, 2.0, 1.0]);
        let mut t = RandomTopology::new(0);
        t.setup(&s, &mut RandomSource::new(1)).unwrap();
        for i in 0..5 {
            assert_eq!(t.best(i), s[i].best_position());
        }

        let mut t = RandomTopology::new(2);
        let mut rng = RandomSource::new(9);
        t.setup(&s, &mut rng).unwrap();
        for i in 0..5 {
            assert!(t.best(i)[0] <= s[i].position()[0]);
        }
        t.next_generation(&s, &mut rng).unwrap();
    }

    #[test]
    fn test_setup_errors() {
        let mut t: StarTopology<Minimizing> = StarTopology::new();
        assert!(t.setup(&[], &mut RandomSource::new(1)).is_err());
        let unevaluated = vec![Particle::<Minimizing>::new(vec![0.0])];
        assert!(t.setup(&unevaluated, &mut RandomSource::new(1)).is_err());
    }

    #[test]
    #[should_panic(expected = "before setup")]
    fn test_best_before_setup() {
        let t: RingTopology<Minimizing> = RingTopology::new(3);
        let _ = t.best(0);
    }
}
