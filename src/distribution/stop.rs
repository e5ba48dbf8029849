//! Stopping on a collapsed search distribution.

use super::{Distribution, NormalMono};
use crate::continuation::Continue;
use crate::core::{Candidate, Fitness};

/// Stops once the population has collapsed: the variance a [`NormalMono`]
/// estimates from it is below `threshold` on every coordinate.
///
/// Meant for samplers whose offspring spread shrinks with the population,
/// where further generations only resample the same point.
///
/// # Examples
///
/// ```
/// use u_evolve::continuation::Continue;
/// use u_evolve::core::{Candidate, Minimizing};
/// use u_evolve::distribution::VarianceContinue;
///
/// let pop = vec![
///     Candidate::<_, Minimizing>::with_fitness(vec![1.0, 2.0], Minimizing(0.0)),
///     Candidate::with_fitness(vec![1.0, 2.0 + 1e-6], Minimizing(0.0)),
/// ];
/// assert!(!VarianceContinue::new(1e-9).proceed(&pop));
/// assert!(VarianceContinue::new(1e-15).proceed(&pop));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarianceContinue {
    threshold: f64,
}

impl VarianceContinue {
    /// Creates the criterion. A negative or NaN threshold never stops.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold: if threshold >= 0.0 { threshold } else { 0.0 },
        }
    }

    /// The variance below which the run stops.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

impl<F: Fitness> Continue<Candidate<Vec<f64>, F>> for VarianceContinue {
    fn proceed(&mut self, pop: &[Candidate<Vec<f64>, F>]) -> bool {
        let Some(first) = pop.first() else {
            return true;
        };
        let sample: Vec<&[f64]> = pop.iter().map(|c| c.genes().as_slice()).collect();
        let mut model = NormalMono::with_dimension(first.genes().len());
        if model.estimate(&sample).is_err() {
            return true;
        }
        let widest = model.variance().iter().copied().fold(0.0, f64::max);
        if widest < self.threshold {
            tracing::info!(
                criterion = "VarianceContinue",
                variance = widest,
                "population variance collapsed"
            );
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::continuation::{CombinedContinue, GenContinue};
    use crate::core::test_support::min_pop;
    use crate::core::{Minimizing, Population};
    use crate::distribution::SamplerBreed;
    use crate::ea::{EasyEa, Termination};
    use crate::eval::PopEvaluator;
    use crate::random::RandomSource;
    use crate::replace::GenerationalReplacement;
    use crate::select::{DetSelect, HowMany};

    #[test]
    fn test_spread_population_goes_on() {
        let pop = min_pop(&[0.0, 1.0, 2.0]);
        assert!(VarianceContinue::new(0.5).proceed(&pop));
    }

    #[test]
    fn test_collapsed_population_stops() {
        let pop = min_pop(&[3.0, 3.0, 3.0]);
        assert!(!VarianceContinue::new(1e-12).proceed(&pop));
        // Zero threshold: nothing is strictly below it.
        assert!(VarianceContinue::new(0.0).proceed(&pop));
    }

    #[test]
    fn test_widest_axis_decides() {
        let pop: Vec<Candidate<Vec<f64>, Minimizing>> = vec![
            Candidate::with_fitness(vec![0.0, 0.0], Minimizing(0.0)),
            Candidate::with_fitness(vec![0.0, 4.0], Minimizing(0.0)),
        ];
        // Variances are 0 and 4.
        assert!(VarianceContinue::new(4.0).proceed(&pop));
        assert!(!VarianceContinue::new(4.5).proceed(&pop));
    }

    #[test]
    fn test_empty_and_ragged_populations_go_on() {
        let empty: Vec<Candidate<Vec<f64>, Minimizing>> = Vec::new();
        assert!(VarianceContinue::new(1.0).proceed(&empty));
        let ragged = vec![
            Candidate::with_fitness(vec![0.0], Minimizing(0.0)),
            Candidate::with_fitness(vec![0.0, 1.0], Minimizing(0.0)),
        ];
        assert!(VarianceContinue::new(1.0).proceed(&ragged));
        assert_eq!(VarianceContinue::new(f64::NAN).threshold(), 0.0);
    }

    #[test]
    fn test_stops_a_collapsing_eda() {
        type Ind = Candidate<Vec<f64>, Minimizing>;
        let mut rng = RandomSource::new(11);
        let pop: Population<Ind> = (0..20)
            .map(|_| Candidate::new(vec![rng.uniform(-3.0, 3.0).unwrap(), rng.unit()]))
            .collect();
        let breed = SamplerBreed::new(
            NormalMono::with_dimension(2),
            DetSelect::new(HowMany::Rate(0.5)),
            HowMany::Rate(1.0),
        );
        let mut cont: CombinedContinue<Ind> = CombinedContinue::new(GenContinue::new(500));
        cont.add(VarianceContinue::new(1e-10));
        let sphere = |x: &Vec<f64>| x.iter().map(|v| v * v).sum::<f64>();
        let mut ea = EasyEa::new(PopEvaluator::new(sphere), breed, GenerationalReplacement, cont);

        let result = ea.run(pop, &mut rng).unwrap();
        assert_eq!(result.termination, Termination::Criterion);
        assert!(result.generations < 500, "ran {} generations", result.generations);
    }
}
