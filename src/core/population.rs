//! Ordered collection of individuals.

use super::individual::Individual;
use crate::random::RandomSource;
use std::ops::{Deref, DerefMut};

/// An ordered, mutable sequence of individuals.
///
/// Duplicates and arbitrary order are allowed: a population is not a set.
/// It dereferences to a slice, so indexing and iteration work as on `[I]`.
///
/// Every "representative individual" query ([`best_index`](Self::best_index),
/// [`worst_index`](Self::worst_index)) compares fitness only and breaks ties
/// in favour of the first encountered element.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Population<I> {
    individuals: Vec<I>,
}

impl<I> Default for Population<I> {
    fn default() -> Self {
        Self {
            individuals: Vec::new(),
        }
    }
}

impl<I: Individual> Population<I> {
    /// Creates an empty population.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty population with reserved capacity.
    pub fn with_capacity(n: usize) -> Self {
        Self {
            individuals: Vec::with_capacity(n),
        }
    }

    /// Appends an individual.
    pub fn push(&mut self, individual: I) {
        self.individuals.push(individual);
    }

    /// Removes every individual.
    pub fn clear(&mut self) {
        self.individuals.clear();
    }

    /// Keeps only the first `n` individuals.
    pub fn truncate(&mut self, n: usize) {
        self.individuals.truncate(n);
    }

    /// Consumes the population, returning the underlying vector.
    pub fn into_vec(self) -> Vec<I> {
        self.individuals
    }

    /// Index of the best individual, `None` if empty.
    ///
    /// # Panics
    /// Panics if an individual is invalid.
    pub fn best_index(&self) -> Option<usize> {
        let mut iter = self.individuals.iter().enumerate();
        let (mut best_idx, first) = iter.next()?;
        let mut best_fit = first.fitness();
        for (i, ind) in iter {
            let f = ind.fitness();
            if f > best_fit {
                best_idx = i;
                best_fit = f;
            }
        }
        Some(best_idx)
    }

    /// Index of the worst individual, `None` if empty.
    ///
    /// # Panics
    /// Panics if an individual is invalid.
    pub fn worst_index(&self) -> Option<usize> {
        let mut iter = self.individuals.iter().enumerate();
        let (mut worst_idx, first) = iter.next()?;
        let mut worst_fit = first.fitness();
        for (i, ind) in iter {
            let f = ind.fitness();
            if f < worst_fit {
                worst_idx = i;
                worst_fit = f;
            }
        }
        Some(worst_idx)
    }

    /// The best individual, `None` if empty.
    pub fn best(&self) -> Option<&I> {
        self.best_index().map(|i| &self.individuals[i])
    }

    /// The worst individual, `None` if empty.
    pub fn worst(&self) -> Option<&I> {
        self.worst_index().map(|i| &self.individuals[i])
    }

    /// Sorts in place, best first. Stable: equal fitness keeps its order.
    pub fn sort(&mut self) {
        self.individuals.sort_by(|a, b| b.fitness().cmp(&a.fitness()));
    }

    /// Indices ordered best first, without moving individuals. Stable.
    pub fn sorted_indices(&self) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..self.individuals.len()).collect();
        idx.sort_by(|&a, &b| {
            self.individuals[b]
                .fitness()
                .cmp(&self.individuals[a].fitness())
        });
        idx
    }

    /// Indices of the `k` best individuals, best first (clamped to `len`).
    pub fn top_indices(&self, k: usize) -> Vec<usize> {
        let mut idx = self.sorted_indices();
        idx.truncate(k);
        idx
    }

    /// Randomly permutes the individuals.
    pub fn shuffle(&mut self, rng: &mut RandomSource) {
        rng.shuffle(&mut self.individuals);
    }

    /// Drops every invalid individual, keeping the order of the rest.
    pub fn retain_valid(&mut self) {
        self.individuals.retain(|i| i.is_valid());
    }

    /// Number of individuals whose fitness is stale.
    pub fn invalid_count(&self) -> usize {
        self.individuals.iter().filter(|i| !i.is_valid()).count()
    }
}

impl<I> Deref for Population<I> {
    type Target = [I];

    fn deref(&self) -> &[I] {
        &self.individuals
    }
}

impl<I> DerefMut for Population<I> {
    fn deref_mut(&mut self) -> &mut [I] {
        &mut self.individuals
    }
}

impl<I> From<Vec<I>> for Population<I> {
    fn from(individuals: Vec<I>) -> Self {
        Self { individuals }
    }
}

impl<I> FromIterator<I> for Population<I> {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self {
            individuals: iter.into_iter().collect(),
        }
    }
}

impl<I> Extend<I> for Population<I> {
    fn extend<T: IntoIterator<Item = I>>(&mut self, iter: T) {
        self.individuals.extend(iter);
    }
}

impl<I> IntoIterator for Population<I> {
    type Item = I;
    type IntoIter = std::vec::IntoIter<I>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.into_iter()
    }
}

impl<'a, I> IntoIterator for &'a Population<I> {
    type Item = &'a I;
    type IntoIter = std::slice::Iter<'a, I>;

    fn into_iter(self) -> Self::IntoIter {
        self.individuals.iter()
    }
}
