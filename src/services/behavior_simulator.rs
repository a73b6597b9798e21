//! Human-behavior filler planning.
//!
//! Between real outbound actions the bulk runner interleaves filler
//! activity so the session's rhythm looks less mechanical. Filler is
//! never quota-counted and never touches the task queue.

use chrono::Duration;
use rand::Rng;
use tracing::debug;

use crate::domain::models::BehaviorConfig;

/// One planned filler step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillerAction {
    /// Visit an unrelated profile page.
    VisitProfile,
    /// Scroll the feed, idling between steps. One entry per step.
    Scroll { step_delays: Vec<Duration> },
    /// Idle for a while.
    Pause { duration: Duration },
}

impl FillerAction {
    /// How long acting this step out takes.
    pub fn duration(&self) -> Duration {
        match self {
            Self::VisitProfile => Duration::zero(),
            Self::Scroll { step_delays } => step_delays
                .iter()
                .fold(Duration::zero(), |total, delay| total + *delay),
            Self::Pause { duration } => *duration,
        }
    }
}

/// Rolls each configured filler behavior independently.
#[derive(Debug, Clone)]
pub struct BehaviorSimulator {
    config: BehaviorConfig,
}

impl BehaviorSimulator {
    pub fn new(config: BehaviorConfig) -> Self {
        Self { config }
    }

    /// Plan the filler interlude before the next real action. Each
    /// behavior fires independently on its own probability, so an
    /// interlude may hold zero, one, or several steps.
    pub fn plan(&self) -> Vec<FillerAction> {
        self.plan_with(&mut rand::thread_rng())
    }

    fn plan_with<R: Rng>(&self, rng: &mut R) -> Vec<FillerAction> {
        let mut plan = Vec::new();

        if rng.gen::<f64>() < self.config.profile_visit_probability {
            plan.push(FillerAction::VisitProfile);
        }

        if rng.gen::<f64>() < self.config.scroll_probability {
            let steps =
                rng.gen_range(self.config.scroll_steps_min..=self.config.scroll_steps_max);
            let step_delays = (0..steps)
                .map(|_| {
                    let secs = rng.gen_range(
                        self.config.scroll_step_delay_min_secs
                            ..=self.config.scroll_step_delay_max_secs,
                    );
                    Duration::seconds(i64::try_from(secs).unwrap_or(0))
                })
                .collect();
            plan.push(FillerAction::Scroll { step_delays });
        }

        if rng.gen::<f64>() < self.config.pause_probability {
            let secs = rng.gen_range(self.config.pause_secs_min..=self.config.pause_secs_max);
            plan.push(FillerAction::Pause {
                duration: Duration::seconds(i64::try_from(secs).unwrap_or(0)),
            });
        }

        if !plan.is_empty() {
            debug!(steps = plan.len(), "filler interlude planned");
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zero_probabilities_plan_nothing() {
        let sim = BehaviorSimulator::new(BehaviorConfig {
            profile_visit_probability: 0.0,
            scroll_probability: 0.0,
            pause_probability: 0.0,
            ..BehaviorConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(7);
        assert!(sim.plan_with(&mut rng).is_empty());
    }

    #[test]
    fn test_certain_probabilities_plan_everything() {
        let sim = BehaviorSimulator::new(BehaviorConfig {
            profile_visit_probability: 1.0,
            scroll_probability: 1.0,
            pause_probability: 1.0,
            ..BehaviorConfig::default()
        });
        let mut rng = StdRng::seed_from_u64(7);
        let plan = sim.plan_with(&mut rng);
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0], FillerAction::VisitProfile);
        assert!(matches!(plan[1], FillerAction::Scroll { .. }));
        assert!(matches!(plan[2], FillerAction::Pause { .. }));
    }

    #[test]
    fn test_scroll_duration_sums_step_delays() {
        let action = FillerAction::Scroll {
            step_delays: vec![Duration::seconds(1), Duration::seconds(2)],
        };
        assert_eq!(action.duration(), Duration::seconds(3));
    }

    #[test]
    fn test_bounds_are_respected() {
        let config = BehaviorConfig {
            profile_visit_probability: 0.0,
            scroll_probability: 1.0,
            pause_probability: 1.0,
            ..BehaviorConfig::default()
        };
        let sim = BehaviorSimulator::new(config.clone());
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            for action in sim.plan_with(&mut rng) {
                match action {
                    FillerAction::Scroll { step_delays } => {
                        let steps = u32::try_from(step_delays.len()).unwrap();
                        assert!(steps >= config.scroll_steps_min);
                        assert!(steps <= config.scroll_steps_max);
                        for delay in step_delays {
                            let secs = delay.num_seconds().unsigned_abs();
                            assert!(secs >= config.scroll_step_delay_min_secs);
                            assert!(secs <= config.scroll_step_delay_max_secs);
                        }
                    }
                    FillerAction::Pause { duration } => {
                        let secs = duration.num_seconds();
                        assert!(secs >= i64::try_from(config.pause_secs_min).unwrap());
                        assert!(secs <= i64::try_from(config.pause_secs_max).unwrap());
                    }
                    FillerAction::VisitProfile => unreachable!(),
                }
            }
        }
    }
}
