//! Candidate solutions and their validity flag.

use super::fitness::{Fitness, Minimizing};

/// A candidate solution in a population.
///
/// An individual carries a genome and an optional fitness. A missing
/// fitness means the individual is *invalid*: its genome changed (or was
/// never evaluated) and the objective has to be called before the fitness
/// can be read.
///
/// # Implementing
///
/// Most users take [`Candidate`]. Custom types (e.g. particles) implement
/// the trait directly:
///
/// ```ignore
/// impl Individual for MyParticle {
///     type Genome = Vec<f64>;
///     type Fitness = Minimizing;
///     fn genome(&self) -> &Vec<f64> { &self.position }
///     fn try_fitness(&self) -> Option<Minimizing> { self.fitness }
///     fn set_fitness(&mut self, f: Minimizing) { self.fitness = Some(f); }
///     fn invalidate(&mut self) { self.fitness = None; }
/// }
/// ```
pub trait Individual: Clone + Send + Sync {
    /// The representation handed to the objective function.
    type Genome: Send + Sync;

    /// The fitness type. Must implement [`Fitness`].
    type Fitness: Fitness;

    /// The representation of this individual.
    fn genome(&self) -> &Self::Genome;

    /// The fitness, or `None` when the individual is invalid.
    fn try_fitness(&self) -> Option<Self::Fitness>;

    /// Stores a freshly computed fitness, making the individual valid.
    fn set_fitness(&mut self, fitness: Self::Fitness);

    /// Marks the fitness as stale.
    fn invalidate(&mut self);

    /// Whether the fitness is up to date.
    fn is_valid(&self) -> bool {
        self.try_fitness().is_some()
    }

    /// Returns the current fitness.
    ///
    /// # Panics
    /// Panics if the individual is invalid. Reading a stale fitness is a
    /// programming error, never a recoverable condition.
    fn fitness(&self) -> Self::Fitness {
        match self.try_fitness() {
            Some(f) => f,
            None => panic!("fitness read on an invalid individual"),
        }
    }
}

/// Standard individual: a genome plus an optional fitness.
///
/// The genome is only reachable mutably through
/// [`genes_mut`](Candidate::genes_mut), which invalidates the fitness, so a
/// changed representation can never keep its old fitness.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Candidate<G, F = Minimizing> {
    genes: G,
    fitness: Option<F>,
}

impl<G, F: Fitness> Candidate<G, F> {
    /// Creates an invalid (not yet evaluated) candidate.
    pub fn new(genes: G) -> Self {
        Self {
            genes,
            fitness: None,
        }
    }

    /// Creates a candidate with a known fitness.
    pub fn with_fitness(genes: G, fitness: F) -> Self {
        Self {
            genes,
            fitness: Some(fitness),
        }
    }

    /// Read-only access to the genome.
    pub fn genes(&self) -> &G {
        &self.genes
    }

    /// Mutable access to the genome. Invalidates the fitness.
    pub fn genes_mut(&mut self) -> &mut G {
        self.fitness = None;
        &mut self.genes
    }

    /// Consumes the candidate, returning its genome.
    pub fn into_genes(self) -> G {
        self.genes
    }
}

impl<G, F> Individual for Candidate<G, F>
where
    G: Clone + Send + Sync,
    F: Fitness,
{
    type Genome = G;
    type Fitness = F;

    fn genome(&self) -> &G {
        &self.genes
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Maximizing;

    #[test]
    fn test_new_is_invalid() {
        let c: Candidate<Vec<f64>> = Candidate::new(vec![1.0, 2.0]);
        assert!(!c.is_valid());
        assert_eq!(c.try_fitness(), None);
    }

    #[test]
    fn test_genes_mut_invalidates() {
        let mut c = Candidate::with_fitness(vec![1.0], Minimizing(1.0));
        assert!(c.is_valid());
        c.genes_mut()[0] = 2.0;
        assert!(!c.is_valid());
        assert_eq!(c.genes(), &vec![2.0]);
    }

    #[test]
    fn test_set_and_read_fitness() {
        let mut c: Candidate<u8, Maximizing> = Candidate::new(3);
        c.set_fitness(Maximizing(9.0));
        assert_eq!(c.fitness(), Maximizing(9.0));
        c.invalidate();
        assert!(!c.is_valid());
    }

    #[test]
    #[should_panic(expected = "fitness read on an invalid individual")]
    fn test_reading_invalid_fitness_panics() {
        let c: Candidate<Vec<f64>> = Candidate::new(vec![0.0]);
        let _ = c.fitness();
    }
}
