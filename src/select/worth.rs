//! Performance-to-worth transforms and roulette-wheel selection over them.
//!
//! A [`Perf2Worth`] maps a population to one non-negative worth per
//! individual. [`RouletteWorthSelect`] then draws individuals with
//! probability proportional to their worth.

use super::{ensure_not_empty, SelectOne};
use crate::core::{Direction, Fitness, Individual};
use crate::error::{EvoError, Result};
use crate::random::RandomSource;

const EPSILON: f64 = 1e-10;

/// Computes a selection worth for every individual.
pub trait Perf2Worth<I: Individual> {
    /// One worth per individual, same order as `pop`. Worths are `>= 0`.
    fn worths(&mut self, pop: &[I]) -> Result<Vec<f64>>;
}

/// Direction-normalized goodness shifted so that the worst gets `EPSILON`.
///
/// Non-finite goodness gets zero worth.
fn shifted_goodness<I: Individual>(pop: &[I]) -> Vec<f64> {
    let goodness: Vec<f64> = pop.iter().map(|ind| ind.fitness().goodness()).collect();
    let min = goodness
        .iter()
        .copied()
        .filter(|g| g.is_finite())
        .fold(f64::INFINITY, f64::min);
    goodness
        .iter()
        .map(|&g| if g.is_finite() { g - min + EPSILON } else { 0.0 })
        .collect()
}

/// Fitness-proportionate worth.
///
/// For maximization with non-negative values, worth is the raw value.
/// Otherwise the goodness is shifted so the worst individual gets a tiny
/// positive weight: `w_i = g_i - min(g) + epsilon`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawWorth;

impl<I: Individual> Perf2Worth<I> for RawWorth {
    fn worths(&mut self, pop: &[I]) -> Result<Vec<f64>> {
        let raw: Vec<f64> = pop.iter().map(|ind| ind.fitness().value()).collect();
        let proportional = <I::Fitness as Fitness>::DIRECTION == Direction::Maximize
            && raw.iter().all(|v| v.is_finite() && *v >= 0.0);
        if proportional {
            Ok(raw)
        } else {
            Ok(shifted_goodness(pop))
        }
    }
}

/// Goldberg's linear fitness scaling.
///
/// Shifted goodness `g` is mapped to `a*g + b` such that the average is
/// preserved and the best gets `pressure` times the average. Negative
/// results are clamped to zero.
#[derive(Debug, Clone, Copy)]
pub struct LinearScaling {
    pressure: f64,
}

impl LinearScaling {
    /// Creates a scaling with selective pressure in `[1, 2]`.
    ///
    /// Out-of-range pressure is clamped with a warning.
    pub fn new(pressure: f64) -> Self {
        Self {
            pressure: clamp_pressure(pressure),
        }
    }
}

impl Default for LinearScaling {
    fn default() -> Self {
        Self::new(2.0)
    }
}

impl<I: Individual> Perf2Worth<I> for LinearScaling {
    fn worths(&mut self, pop: &[I]) -> Result<Vec<f64>> {
        ensure_not_empty(pop)?;
        let g = shifted_goodness(pop);
        let n = g.len() as f64;
        let avg = g.iter().sum::<f64>() / n;
        let max = g.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if max - avg <= f64::EPSILON * max.abs().max(1.0) {
            return Ok(vec![1.0; g.len()]);
        }
        let a = (self.pressure - 1.0) * avg / (max - avg);
        let b = avg * (max - self.pressure * avg) / (max - avg);
        Ok(g.iter().map(|&x| (a * x + b).max(0.0)).collect())
    }
}

/// Rank-based worth (Baker 1985).
///
/// With exponent 1 this is linear ranking: the best gets
/// `pressure / n`, the worst `(2 - pressure) / n`. Other exponents bend the
/// curve: `w(c) = (2 - pressure)/n + gamma * c^exponent` where `c` is the
/// normalized rank from worst (0) to best (1).
#[derive(Debug, Clone, Copy)]
pub struct Ranking {
    pressure: f64,
    exponent: f64,
}

impl Ranking {
    /// Creates a ranking with pressure in `[1, 2]` and a positive exponent.
    ///
    /// Invalid parameters are clamped with a warning.
    pub fn new(pressure: f64, exponent: f64) -> Self {
        let exponent = if exponent.is_finite() && exponent > 0.0 {
            exponent
        } else {
            tracing::warn!(exponent, "ranking exponent must be > 0, using 1");
            1.0
        };
        Self {
            pressure: clamp_pressure(pressure),
            exponent,
        }
    }
}

impl Default for Ranking {
    fn default() -> Self {
        Self::new(2.0, 1.0)
    }
}

impl<I: Individual> Perf2Worth<I> for Ranking {
    fn worths(&mut self, pop: &[I]) -> Result<Vec<f64>> {
        ensure_not_empty(pop)?;
        let n = pop.len();
        if n == 1 {
            return Ok(vec![1.0]);
        }

        // Worst first; ties keep population order.
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| pop[a].fitness().cmp(&pop[b].fitness()));

        let nf = n as f64;
        let beta = (2.0 - self.pressure) / nf;
        let gamma = (2.0 * self.pressure - 2.0) / nf;
        let mut worths = vec![0.0; n];
        for (rank, &idx) in order.iter().enumerate() {
            let c = rank as f64 / (nf - 1.0);
            worths[idx] = beta + gamma * c.powf(self.exponent);
        }
        Ok(worths)
    }
}

/// Fitness sharing: raw worth divided by the niche count.
///
/// `niche_i = sum_j sh(d(i, j))` with the triangular kernel
/// `sh(d) = 1 - d / sigma` for `d < sigma` and `0` otherwise. Crowded
/// regions of the search space get their worth divided among their
/// members.
#[derive(Debug, Clone, Copy)]
pub struct Sharing<D> {
    sigma: f64,
    distance: D,
}

impl<D> Sharing<D> {
    /// Creates a sharing transform with niche radius `sigma`.
    ///
    /// # Errors
    /// [`EvoError::ContractViolation`] if `sigma` is not strictly positive.
    pub fn new(sigma: f64, distance: D) -> Result<Self> {
        if !(sigma > 0.0) || !sigma.is_finite() {
            return Err(EvoError::contract(format!(
                "sharing radius must be > 0, got {sigma}"
            )));
        }
        Ok(Self { sigma, distance })
    }
}

impl<I, D> Perf2Worth<I> for Sharing<D>
where
    I: Individual,
    D: Fn(&I::Genome, &I::Genome) -> f64,
{
    fn worths(&mut self, pop: &[I]) -> Result<Vec<f64>> {
        let raw = shifted_goodness(pop);
        let n = pop.len();
        let mut niche = vec![0.0; n];
        for i in 0..n {
            // sh(d(i, i)) = 1
            niche[i] += 1.0;
            for j in (i + 1)..n {
                let d = (self.distance)(pop[i].genome(), pop[j].genome());
                if d < self.sigma {
                    let sh = 1.0 - d / self.sigma;
                    niche[i] += sh;
                    niche[j] += sh;
                }
            }
        }
        Ok(raw.iter().zip(&niche).map(|(w, c)| w / c).collect())
    }
}

fn clamp_pressure(pressure: f64) -> f64 {
    let clamped = if pressure.is_nan() {
        2.0
    } else {
        pressure.clamp(1.0, 2.0)
    };
    if clamped != pressure {
        tracing::warn!(pressure, clamped, "selective pressure should be in [1, 2]");
    }
    clamped
}

/// Roulette-wheel selection over a worth transform.
///
/// `setup` computes the worths and the cumulative wheel once; each draw is a
/// binary search. If every worth is zero (or the total is not finite) the
/// wheel falls back to uniform selection.
///
/// # Complexity
/// O(cost of `W`) per setup, O(log n) per selection
#[derive(Debug, Clone)]
pub struct RouletteWorthSelect<W> {
    worth: W,
    cumulative: Vec<f64>,
}

/// Fitness-proportionate roulette.
pub type ProportionalSelect = RouletteWorthSelect<RawWorth>;
/// Roulette over linear ranking.
pub type RankingSelect = RouletteWorthSelect<Ranking>;
/// Roulette over linearly scaled fitness.
pub type FitnessScalingSelect = RouletteWorthSelect<LinearScaling>;
/// Roulette over shared fitness.
pub type SharingSelect<D> = RouletteWorthSelect<Sharing<D>>;

impl<W> RouletteWorthSelect<W> {
    /// Creates a roulette over `worth`.
    pub fn new(worth: W) -> Self {
        Self {
            worth,
            cumulative: Vec::new(),
        }
    }

    /// The worth transform.
    pub fn worth(&self) -> &W {
        &self.worth
    }
}

impl<W: Default> Default for RouletteWorthSelect<W> {
    fn default() -> Self {
        Self::new(W::default())
    }
}

impl<I: Individual, W: Perf2Worth<I>> SelectOne<I> for RouletteWorthSelect<W> {
    fn setup(&mut self, pop: &[I]) -> Result<()> {
        ensure_not_empty(pop)?;
        let worths = self.worth.worths(pop)?;
        if worths.len() != pop.len() {
            return Err(EvoError::contract(format!(
                "worth transform returned {} values for {} individuals",
                worths.len(),
                pop.len()
            )));
        }

        let mut total = 0.0;
        self.cumulative = worths
            .iter()
            .map(|&w| {
                if w.is_finite() && w > 0.0 {
                    total += w;
                }
                total
            })
            .collect();
        if !(total > 0.0) || !total.is_finite() {
            self.cumulative.clear();
        }
        Ok(())
    }

    fn select(&mut self, pop: &[I], rng: &mut RandomSource) -> usize {
        let n = pop.len();
        if self.cumulative.len() != n {
            return rng.integer(n);
        }
        let total = self.cumulative[n - 1];
        let threshold = rng.unit() * total;
        self.cumulative
            .partition_point(|&c| c <= threshold)
            .min(n - 1) // floating-point fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::{max_pop, min_pop};
    use crate::core::Candidate;
    use crate::core::Minimizing;

    fn counts<I: Individual, S: SelectOne<I>>(sel: &mut S, pop: &[I], n: usize) -> Vec<u32> {
        let mut rng = RandomSource::new(42);
        sel.setup(pop).unwrap();
        let mut counts = vec![0u32; pop.len()];
        for _ in 0..n {
            counts[sel.select(pop, &mut rng)] += 1;
        }
        counts
    }

    #[test]
    fn test_roulette_favors_best() {
        let pop = min_pop(&[100.0, 50.0, 1.0, 80.0]);
        let c = counts(&mut ProportionalSelect::default(), &pop, 10000);
        assert!(
            c[2] > c[0],
            "best should be selected more often: best={}, worst={}",
            c[2],
            c[0]
        );
    }

    #[test]
    fn test_roulette_proportional_maximizing() {
        let pop = max_pop(&[1.0, 3.0]);
        let c = counts(&mut ProportionalSelect::default(), &pop, 20000);
        let share = c[1] as f64 / 20000.0;
        assert!((share - 0.75).abs() < 0.02, "share {share}");
    }

    #[test]
    fn test_rank_favors_best() {
        let pop = min_pop(&[100.0, 50.0, 1.0, 80.0]);
        let c = counts(&mut RankingSelect::default(), &pop, 10000);
        assert!(c[2] > c[0], "best={}, worst={}", c[2], c[0]);
    }

    #[test]
    fn test_ranking_worths_linear() {
        let pop = min_pop(&[3.0, 1.0, 2.0]);
        let w = Ranking::new(2.0, 1.0).worths(&pop).unwrap();
        // worst gets (2 - 2)/3 = 0, best gets 2/3.
        assert!((w[0] - 0.0).abs() < 1e-12);
        assert!((w[2] - 1.0 / 3.0).abs() < 1e-12);
        assert!((w[1] - 2.0 / 3.0).abs() < 1e-12);
        assert!((w.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ranking_pressure_clamped() {
        let r = Ranking::new(5.0, 1.0);
        assert_eq!(r.pressure, 2.0);
        let r = Ranking::new(1.5, -1.0);
        assert_eq!(r.exponent, 1.0);
    }

    #[test]
    fn test_linear_scaling_preserves_average() {
        let pop = max_pop(&[1.0, 2.0, 3.0, 6.0]);
        let w = LinearScaling::new(2.0).worths(&pop).unwrap();
        let g: Vec<f64> = [1.0, 2.0, 3.0, 6.0].iter().map(|v| v - 1.0 + EPSILON).collect();
        let avg_g = g.iter().sum::<f64>() / 4.0;
        let avg_w = w.iter().sum::<f64>() / 4.0;
        assert!((avg_w - avg_g).abs() < 1e-9, "{avg_w} vs {avg_g}");
        let max_w = w.iter().copied().fold(f64::MIN, f64::max);
        assert!((max_w - 2.0 * avg_g).abs() < 1e-9);
        assert!(w.iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn test_equal_fitness_is_uniform() {
        let pop = min_pop(&[5.0, 5.0, 5.0, 5.0]);
        for c in [
            counts(&mut ProportionalSelect::default(), &pop, 10000),
            counts(&mut RankingSelect::new(Ranking::new(1.0, 1.0)), &pop, 10000),
            counts(&mut FitnessScalingSelect::default(), &pop, 10000),
        ] {
            for &x in &c {
                assert!(x > 2000, "expected roughly uniform, got {c:?}");
            }
        }
    }

    #[test]
    fn test_single_individual() {
        let pop = min_pop(&[5.0]);
        let mut rng = RandomSource::new(42);
        let mut sel = RankingSelect::default();
        sel.setup(&pop).unwrap();
        assert_eq!(sel.select(&pop, &mut rng), 0);
        let mut sel = ProportionalSelect::default();
        sel.setup(&pop).unwrap();
        assert_eq!(sel.select(&pop, &mut rng), 0);
    }

    #[test]
    fn test_sharing_penalizes_crowding() {
        // Two identical individuals and one isolated, same raw fitness.
        let pop: Vec<Candidate<Vec<f64>, Minimizing>> = vec![
            Candidate::with_fitness(vec![0.0], Minimizing(1.0)),
            Candidate::with_fitness(vec![0.0], Minimizing(1.0)),
            Candidate::with_fitness(vec![10.0], Minimizing(1.0)),
        ];
        let mut sharing =
            Sharing::new(1.0, |a: &Vec<f64>, b: &Vec<f64>| (a[0] - b[0]).abs()).unwrap();
        let w = sharing.worths(&pop).unwrap();
        assert!((w[0] - w[2] / 2.0).abs() < 1e-15);
        assert_eq!(w[0], w[1]);
    }

    #[test]
    fn test_sharing_rejects_bad_sigma() {
        assert!(Sharing::new(0.0, |_: &Vec<f64>, _: &Vec<f64>| 0.0).is_err());
    }

    #[test]
    fn test_empty_population() {
        let pop = min_pop(&[]);
        assert!(SelectOne::setup(&mut RankingSelect::default(), &pop).is_err());
    }
}
