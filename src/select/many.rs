//! Batch selection.

use super::{ensure_not_empty, HowMany, Select, SelectOne};
use crate::core::{Individual, Population};
use crate::error::Result;
use crate::random::RandomSource;

/// Draws a batch by repeated calls to a [`SelectOne`].
///
/// The batch size is `how_many.count(pop.len())` and may exceed the source
/// size (`Rate(2.0)` draws twice as many). The inner strategy is set up once
/// per batch.
#[derive(Debug, Clone)]
pub struct SelectMany<S> {
    one: S,
    how_many: HowMany,
}

impl<S> SelectMany<S> {
    /// Creates a batch selector.
    pub fn new(one: S, how_many: HowMany) -> Self {
        Self { one, how_many }
    }

    /// The count policy.
    pub fn how_many(&self) -> HowMany {
        self.how_many
    }

    /// The inner strategy.
    pub fn inner(&self) -> &S {
        &self.one
    }
}

fn draw<I: Individual, S: SelectOne<I>>(
    one: &mut S,
    pop: &[I],
    target: usize,
    rng: &mut RandomSource,
) -> Result<Population<I>> {
    one.setup(pop)?;
    let mut out = Population::with_capacity(target);
    for _ in 0..target {
        let idx = one.select(pop, rng);
        out.push(pop[idx].clone());
    }
    Ok(out)
}

impl<I: Individual, S: SelectOne<I>> Select<I> for SelectMany<S> {
    fn select(&mut self, pop: &[I], rng: &mut RandomSource) -> Result<Population<I>> {
        ensure_not_empty(pop)?;
        let target = self.how_many.count(pop.len());
        draw(&mut self.one, pop, target, rng)
    }
}

/// Batch selection that never draws more than the source size.
///
/// `Rate(0.5)` on 10 individuals gives 5; `Absolute(30)` on 10 gives 10.
#[derive(Debug, Clone)]
pub struct TruncSelect<S> {
    one: S,
    how_many: HowMany,
}

impl<S> TruncSelect<S> {
    /// Creates a truncating batch selector.
    pub fn new(one: S, how_many: HowMany) -> Self {
        Self { one, how_many }
    }
}

impl<I: Individual, S: SelectOne<I>> Select<I> for TruncSelect<S> {
    fn select(&mut self, pop: &[I], rng: &mut RandomSource) -> Result<Population<I>> {
        ensure_not_empty(pop)?;
        let target = self.how_many.clamped(pop.len());
        draw(&mut self.one, pop, target, rng)
    }
}

/// Deterministic selection of the best `m` individuals, best first.
#[derive(Debug, Clone, Copy)]
pub struct DetSelect {
    how_many: HowMany,
}

impl DetSelect {
    /// Creates a deterministic selector.
    pub fn new(how_many: HowMany) -> Self {
        Self { how_many }
    }
}

impl<I: Individual> Select<I> for DetSelect {
    fn select(&mut self, pop: &[I], _rng: &mut RandomSource) -> Result<Population<I>> {
        ensure_not_empty(pop)?;
        let target = self.how_many.clamped(pop.len());
        let mut idx: Vec<usize> = (0..pop.len()).collect();
        idx.sort_by(|&a, &b| pop[b].fitness().cmp(&pop[a].fitness()));
        Ok(idx[..target].iter().map(|&i| pop[i].clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::min_pop;
    use crate::select::{DetTournamentSelect, RandomSelect};

    #[test]
    fn test_trunc_select_counts() {
        let pop = min_pop(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        let mut rng = RandomSource::new(42);

        let mut half = TruncSelect::new(DetTournamentSelect::new(2), HowMany::Rate(0.5));
        assert_eq!(half.select(&pop, &mut rng).unwrap().len(), 5);

        let mut three = TruncSelect::new(DetTournamentSelect::new(2), HowMany::Absolute(3));
        assert_eq!(three.select(&pop, &mut rng).unwrap().len(), 3);
    }

    #[test]
    fn test_trunc_select_clamps_to_population() {
        let pop = min_pop(&[1.0, 2.0, 3.0]);
        let mut rng = RandomSource::new(42);
        let mut sel = TruncSelect::new(RandomSelect, HowMany::Absolute(10));
        assert_eq!(sel.select(&pop, &mut rng).unwrap().len(), 3);
    }

    #[test]
    fn test_select_many_can_oversample() {
        let pop = min_pop(&[1.0, 2.0, 3.0]);
        let mut rng = RandomSource::new(42);
        let mut sel = SelectMany::new(RandomSelect, HowMany::Rate(2.0));
        assert_eq!(sel.select(&pop, &mut rng).unwrap().len(), 6);
        let mut sel = SelectMany::new(RandomSelect, HowMany::Absolute(7));
        assert_eq!(sel.select(&pop, &mut rng).unwrap().len(), 7);
    }

    #[test]
    fn test_select_many_returns_members() {
        let pop = min_pop(&[1.0, 2.0, 3.0]);
        let mut rng = RandomSource::new(42);
        let mut sel = SelectMany::new(RandomSelect, HowMany::Rate(1.0));
        let out = sel.select(&pop, &mut rng).unwrap();
        for ind in &out {
            assert!(pop.iter().any(|p| p == ind));
        }
    }

    #[test]
    fn test_select_empty_population_fails() {
        let pop = min_pop(&[]);
        let mut rng = RandomSource::new(42);
        assert!(SelectMany::new(RandomSelect, HowMany::Rate(1.0))
            .select(&pop, &mut rng)
            .is_err());
        assert!(DetSelect::new(HowMany::Absolute(1))
            .select(&pop, &mut rng)
            .is_err());
    }

    #[test]
    fn test_det_select_keeps_best() {
        let pop = min_pop(&[4.0, 1.0, 3.0, 2.0]);
        let mut rng = RandomSource::new(42);
        let out = DetSelect::new(HowMany::Absolute(2))
            .select(&pop, &mut rng)
            .unwrap();
        let genes: Vec<f64> = out.iter().map(|c| c.genes()[0]).collect();
        assert_eq!(genes, vec![1.0, 2.0]);
    }
}
