//! Single-individual selection strategies.

use super::{ensure_not_empty, HowMany, SelectOne};
use crate::core::Individual;
use crate::error::Result;
use crate::random::RandomSource;

/// Uniform random choice.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelect;

impl<I: Individual> SelectOne<I> for RandomSelect {
    fn select(&mut self, pop: &[I], rng: &mut RandomSource) -> usize {
        rng.integer(pop.len())
    }
}

/// Always returns the best individual (first one on ties).
#[derive(Debug, Clone, Copy, Default)]
pub struct BestSelect {
    best: Option<usize>,
}

impl<I: Individual> SelectOne<I> for BestSelect {
    fn setup(&mut self, pop: &[I]) -> Result<()> {
        ensure_not_empty(pop)?;
        self.best = Some(best_index(pop));
        Ok(())
    }

    fn select(&mut self, pop: &[I], _rng: &mut RandomSource) -> usize {
        match self.best {
            Some(i) if i < pop.len() => i,
            _ => best_index(pop),
        }
    }
}

fn best_index<I: Individual>(pop: &[I]) -> usize {
    let mut best = 0;
    for i in 1..pop.len() {
        if pop[i].fitness() > pop[best].fitness() {
            best = i;
        }
    }
    best
}

/// Deterministic tournament: draw `k` individuals (with replacement), keep
/// the best.
///
/// Higher `k` = stronger selection pressure.
/// - k=2: light pressure (good for diversity)
/// - k=3-5: moderate pressure
/// - k>5: strong pressure (risk of premature convergence)
///
/// # Complexity
/// O(k) per selection
#[derive(Debug, Clone, Copy)]
pub struct DetTournamentSelect {
    size: usize,
}

impl DetTournamentSelect {
    /// Creates a tournament of size `size`.
    ///
    /// Sizes below 2 are adjusted to 2 with a warning.
    pub fn new(size: usize) -> Self {
        if size < 2 {
            tracing::warn!(size, "tournament size should be >= 2, adjusted to 2");
        }
        Self { size: size.max(2) }
    }

    /// The effective tournament size.
    pub fn size(&self) -> usize {
        self.size
    }
}

impl Default for DetTournamentSelect {
    fn default() -> Self {
        Self::new(2)
    }
}

impl<I: Individual> SelectOne<I> for DetTournamentSelect {
    fn select(&mut self, pop: &[I], rng: &mut RandomSource) -> usize {
        let n = pop.len();
        let mut best_idx = rng.integer(n);
        for _ in 1..self.size {
            let idx = rng.integer(n);
            if pop[idx].fitness() > pop[best_idx].fitness() {
                best_idx = idx;
            }
        }
        best_idx
    }
}

/// Stochastic binary tournament: the better of two random individuals wins
/// with probability `rate`, the worse one otherwise.
#[derive(Debug, Clone, Copy)]
pub struct StochTournamentSelect {
    rate: f64,
}

impl StochTournamentSelect {
    /// Creates a tournament with winning probability `rate`.
    ///
    /// Rates outside `[0.5, 1]` are clamped with a warning.
    pub fn new(rate: f64) -> Self {
        let clamped = if rate.is_nan() { 1.0 } else { rate.clamp(0.5, 1.0) };
        if clamped != rate {
            tracing::warn!(rate, clamped, "stochastic tournament rate should be in [0.5, 1]");
        }
        Self { rate: clamped }
    }
}

impl<I: Individual> SelectOne<I> for StochTournamentSelect {
    fn select(&mut self, pop: &[I], rng: &mut RandomSource) -> usize {
        let n = pop.len();
        let a = rng.integer(n);
        let b = rng.integer(n);
        let (better, worse) = if pop[b].fitness() > pop[a].fitness() {
            (b, a)
        } else {
            (a, b)
        };
        if rng.flip(self.rate) {
            better
        } else {
            worse
        }
    }
}

/// Returns every individual in turn, looping back when exhausted.
///
/// Ordered mode goes from best to worst; unordered mode walks a fresh
/// random permutation on every pass.
#[derive(Debug, Clone, Default)]
pub struct SequentialSelect {
    ordered: bool,
    order: Vec<usize>,
    current: usize,
}

impl SequentialSelect {
    /// Best-to-worst order.
    pub fn ordered() -> Self {
        Self {
            ordered: true,
            ..Self::default()
        }
    }

    /// Random order.
    pub fn shuffled() -> Self {
        Self::default()
    }

    fn rebuild<I: Individual>(&mut self, pop: &[I], rng: Option<&mut RandomSource>) {
        self.order = (0..pop.len()).collect();
        if self.ordered {
            self.order
                .sort_by(|&a, &b| pop[b].fitness().cmp(&pop[a].fitness()));
        } else if let Some(rng) = rng {
            rng.shuffle(&mut self.order);
        }
        self.current = 0;
    }
}

impl<I: Individual> SelectOne<I> for SequentialSelect {
    fn setup(&mut self, pop: &[I]) -> Result<()> {
        ensure_not_empty(pop)?;
        self.rebuild(pop, None);
        // Unordered mode shuffles lazily on the first draw.
        if !self.ordered {
            self.current = pop.len();
        }
        Ok(())
    }

    fn select(&mut self, pop: &[I], rng: &mut RandomSource) -> usize {
        if self.current >= self.order.len() || self.order.len() != pop.len() {
            self.rebuild(pop, Some(rng));
        }
        let idx = self.order[self.current];
        self.current += 1;
        idx
    }
}

/// Restricts an inner strategy to the fertile top part of the population.
///
/// `setup` keeps the best `fertile` individuals (per [`HowMany`]) and sets
/// up the inner strategy on them; `select` maps the inner choice back to an
/// index in the full population.
#[derive(Debug, Clone)]
pub struct TruncatedSelectOne<I, S> {
    inner: S,
    fertile: HowMany,
    pool: Vec<I>,
    map: Vec<usize>,
}

impl<I: Individual, S: SelectOne<I>> TruncatedSelectOne<I, S> {
    /// Wraps `inner`, selecting only from the `fertile` best.
    pub fn new(inner: S, fertile: HowMany) -> Self {
        Self {
            inner,
            fertile,
            pool: Vec::new(),
            map: Vec::new(),
        }
    }
}

impl<I: Individual, S: SelectOne<I>> SelectOne<I> for TruncatedSelectOne<I, S> {
    fn setup(&mut self, pop: &[I]) -> Result<()> {
        ensure_not_empty(pop)?;
        let k = self.fertile.clamped(pop.len()).max(1);
        let mut idx: Vec<usize> = (0..pop.len()).collect();
        idx.sort_by(|&a, &b| pop[b].fitness().cmp(&pop[a].fitness()));
        idx.truncate(k);
        self.pool = idx.iter().map(|&i| pop[i].clone()).collect();
        self.map = idx;
        self.inner.setup(&self.pool)
    }

    fn select(&mut self, pop: &[I], rng: &mut RandomSource) -> usize {
        if self.map.is_empty() {
            // Used without setup: fall back to the whole population.
            return self.inner.select(pop, rng);
        }
        let inner_idx = self.inner.select(&self.pool, rng);
        self.map[inner_idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{max_pop, min_pop};

    #[test]
    fn test_tournament_favors_best() {
        let pop = min_pop(&[10.0, 5.0, 1.0, 8.0]);
        let mut rng = RandomSource::new(42);
        let mut sel = DetTournamentSelect::new(4);
        sel.setup(&pop).unwrap();

        let mut counts = [0u32; 4];
        let n = 10000;
        for _ in 0..n {
            counts[sel.select(&pop, &mut rng)] += 1;
        }
        assert!(
            counts[2] > 6000,
            "expected best to be selected >60% of the time, got {}/{n}",
            counts[2]
        );
    }

    #[test]
    fn test_tournament_size_clamped() {
        assert_eq!(DetTournamentSelect::new(0).size(), 2);
        assert_eq!(DetTournamentSelect::new(1).size(), 2);
        assert_eq!(DetTournamentSelect::new(7).size(), 7);
    }

    #[test]
    fn test_tournament_maximizing() {
        let pop = max_pop(&[10.0, 5.0, 1.0, 8.0]);
        let mut rng = RandomSource::new(42);
        let mut sel = DetTournamentSelect::new(6);
        let mut counts = [0u32; 4];
        for _ in 0..5000 {
            counts[sel.select(&pop, &mut rng)] += 1;
        }
        assert!(counts[0] > counts[2]);
    }

    #[test]
    fn test_random_select_uniform() {
        let pop = min_pop(&[10.0, 5.0, 1.0, 8.0]);
        let mut rng = RandomSource::new(42);
        let mut counts = [0u32; 4];
        for _ in 0..10000 {
            counts[RandomSelect.select(&pop, &mut rng)] += 1;
        }
        for &c in &counts {
            assert!(c > 2000, "expected uniform, got counts: {counts:?}");
        }
    }

    #[test]
    fn test_best_select() {
        let pop = min_pop(&[3.0, 1.0, 1.0]);
        let mut rng = RandomSource::new(1);
        let mut sel = BestSelect::default();
        sel.setup(&pop).unwrap();
        assert_eq!(sel.select(&pop, &mut rng), 1);
    }

    #[test]
    fn test_empty_population_setup_fails() {
        let pop = min_pop(&[]);
        assert!(SelectOne::setup(&mut RandomSelect, &pop).is_err());
        assert!(SelectOne::setup(&mut BestSelect::default(), &pop).is_err());
    }

    #[test]
    fn test_stoch_tournament_rate_one_is_binary_det() {
        let pop = min_pop(&[1.0, 2.0]);
        let mut rng = RandomSource::new(5);
        let mut sel = StochTournamentSelect::new(1.0);
        let mut counts = [0u32; 2];
        for _ in 0..4000 {
            counts[sel.select(&pop, &mut rng)] += 1;
        }
        // Index 1 wins only when drawn twice: ~25%.
        assert!(counts[0] > 2700 && counts[0] < 3300, "{counts:?}");
    }

    #[test]
    fn test_sequential_ordered_cycles() {
        let pop = min_pop(&[3.0, 1.0, 2.0]);
        let mut rng = RandomSource::new(1);
        let mut sel = SequentialSelect::ordered();
        sel.setup(&pop).unwrap();
        let picks: Vec<usize> = (0..6).map(|_| sel.select(&pop, &mut rng)).collect();
        assert_eq!(picks, vec![1, 2, 0, 1, 2, 0]);
    }

    #[test]
    fn test_sequential_shuffled_visits_all() {
        let pop = min_pop(&[3.0, 1.0, 2.0, 4.0]);
        let mut rng = RandomSource::new(1);
        let mut sel = SequentialSelect::shuffled();
        sel.setup(&pop).unwrap();
        let mut picks: Vec<usize> = (0..4).map(|_| sel.select(&pop, &mut rng)).collect();
        picks.sort();
        assert_eq!(picks, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_truncated_select_one_only_fertile() {
        let pop = min_pop(&[5.0, 1.0, 4.0, 2.0, 3.0]);
        let mut rng = RandomSource::new(9);
        let mut sel = TruncatedSelectOne::new(RandomSelect, HowMany::Absolute(2));
        sel.setup(&pop).unwrap();
        for _ in 0..500 {
            let i = sel.select(&pop, &mut rng);
            assert!(i == 1 || i == 3, "picked non-fertile index {i}");
        }
    }
}
