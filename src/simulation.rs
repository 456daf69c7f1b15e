use crate::error::SimError;
use crate::probability::success_probability;
use crate::types::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace, warn};

/// Supplies independent uniform draws in [0, 1)
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

/// Adapts any `rand` generator into a [`RandomSource`]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// What happened to each friend in one match
#[derive(Clone, Debug, PartialEq)]
pub struct AttemptOutcome {
    /// Draw each friend was judged against (all equal when queuing together)
    pub draws: Vec<f64>,
    /// Whether each friend saw Cho'gall this match
    pub hits: Vec<bool>,
}

impl AttemptOutcome {
    pub fn any_hit(&self) -> bool {
        self.hits.iter().any(|&h| h)
    }

    /// True when every friend shared the same fate
    pub fn all_or_none(&self) -> bool {
        self.hits.iter().all(|&h| h) || !self.any_hit()
    }
}

/// One sample: matches played from zero sightings until someone unlocks
#[derive(Clone, Debug, PartialEq)]
pub struct SampleRun {
    /// Cho'gall sightings per friend
    pub successes: Vec<u32>,
    /// Matches played so far
    pub attempts: u64,
}

impl SampleRun {
    pub fn new(num_friends: usize) -> Self {
        Self {
            successes: vec![0; num_friends],
            attempts: 0,
        }
    }

    pub fn is_unlocked(&self, unlock_games: u32) -> bool {
        self.successes.iter().any(|&s| s >= unlock_games)
    }

    /// First friend whose counter reached the threshold
    pub fn unlocked_by(&self, unlock_games: u32) -> Option<usize> {
        self.successes.iter().position(|&s| s >= unlock_games)
    }

    /// Play one match for the whole party.
    ///
    /// Queuing independently draws once per friend, in friend order. Queuing
    /// together draws once and judges every friend against that value.
    pub fn step(
        &mut self,
        queue_independently: bool,
        chance: f64,
        source: &mut impl RandomSource,
    ) -> AttemptOutcome {
        let shared = if queue_independently {
            None
        } else {
            Some(source.next_unit())
        };

        let mut draws = Vec::with_capacity(self.successes.len());
        let mut hits = Vec::with_capacity(self.successes.len());
        for count in self.successes.iter_mut() {
            let draw = match shared {
                Some(value) => value,
                None => source.next_unit(),
            };
            let hit = draw < chance;
            if hit {
                *count += 1;
            }
            draws.push(draw);
            hits.push(hit);
        }

        self.attempts += 1;
        AttemptOutcome { draws, hits }
    }
}

/// Running sum with Neumaier compensation.
///
/// Adding `1 / num_samples` once per sample drifts in plain f64 (1000 adds of
/// 0.001 land on 1.0000000000000007); the compensation term carries the lost
/// low-order bits and is folded back in by [`CompensatedSum::value`].
#[derive(Clone, Copy, Debug, Default)]
pub struct CompensatedSum {
    sum: f64,
    compensation: f64,
}

impl CompensatedSum {
    pub fn add(&mut self, value: f64) {
        let total = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - total) + value;
        } else {
            self.compensation += (value - total) + self.sum;
        }
        self.sum = total;
    }

    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// Monte Carlo estimator of matches needed to unlock Cho'gall
pub struct Simulation {
    pub config: UnlockConfig,
    /// Statistics from the most recent run
    pub stats: UnlockStats,
    /// Per-match, per-friend chance of a Cho'gall sighting
    chance: f64,
    rng_seed: u64,
}

impl Simulation {
    pub fn new(config: UnlockConfig, seed: u64) -> Result<Self, SimError> {
        config.validate()?;
        let chance = Self::match_chance(&config)?;
        let stats = UnlockStats::new(config.num_friends);
        Ok(Self {
            config,
            stats,
            chance,
            rng_seed: seed,
        })
    }

    fn match_chance(config: &UnlockConfig) -> Result<f64, SimError> {
        let pool = config.effective_players();
        let chance = success_probability(pool, config.chogall_chance, 1, config.summation_bound)?;
        debug!(pool, chance, bound = ?config.summation_bound, "Computed per-match chance");
        Ok(chance)
    }

    pub fn chance(&self) -> f64 {
        self.chance
    }

    pub fn seed(&self) -> u64 {
        self.rng_seed
    }

    /// Run every sample with a generator seeded from this simulation's seed
    pub fn run(&mut self) -> Result<f64, SimError> {
        let mut source = RngSource::seeded(self.rng_seed);
        self.run_with_source(&mut source)
    }

    /// Run every sample against the given source and return the average
    /// number of matches to unlock
    pub fn run_with_source(&mut self, source: &mut impl RandomSource) -> Result<f64, SimError> {
        let config = &self.config;
        info!(
            num_friends = config.num_friends,
            chogall_chance = config.chogall_chance,
            unlock_games = config.unlock_games,
            queue_independently = config.queue_independently,
            num_samples = config.num_samples,
            "Starting unlock simulation"
        );

        let mut stats = UnlockStats::new(config.num_friends);
        stats.attempt_samples.reserve(config.num_samples);
        let mut avg_matches_to_unlock = CompensatedSum::default();

        for sample in 0..config.num_samples {
            let run = self.run_sample(source)?;
            avg_matches_to_unlock.add(run.attempts as f64 / config.num_samples as f64);

            if let Some(friend) = run.unlocked_by(config.unlock_games) {
                stats.unlocks_per_friend[friend] += 1;
            }
            stats.attempt_samples.push(run.attempts);
            trace!(sample, attempts = run.attempts, "Sample unlocked");
        }

        let avg_matches_to_unlock = avg_matches_to_unlock.value();
        stats.avg_attempts = avg_matches_to_unlock;
        stats.finalize();
        info!(
            avg_attempts = stats.avg_attempts,
            p50 = stats.attempts_p50,
            p90 = stats.attempts_p90,
            "Unlock simulation finished"
        );
        self.stats = stats;

        Ok(avg_matches_to_unlock)
    }

    /// Play matches until one friend unlocks.
    ///
    /// Without an attempt cap this never returns when the per-match chance
    /// is zero.
    pub fn run_sample(&self, source: &mut impl RandomSource) -> Result<SampleRun, SimError> {
        let config = &self.config;
        let mut run = SampleRun::new(config.num_friends);

        while !run.is_unlocked(config.unlock_games) {
            if let Some(cap) = config.max_attempts_per_sample {
                if run.attempts >= cap {
                    warn!(attempts = run.attempts, chance = self.chance, "Sample hit attempt cap");
                    return Err(SimError::DidNotConverge { attempts: cap });
                }
            }
            run.step(config.queue_independently, self.chance, source);
        }

        Ok(run)
    }

    /// Closed-form expected matches when a single sighting unlocks.
    ///
    /// Each match is a Bernoulli trial for "any friend sees Cho'gall", so the
    /// match count is geometric. Returns None for higher thresholds.
    pub fn expected_attempts_single_unlock(&self) -> Option<f64> {
        if self.config.unlock_games != 1 {
            return None;
        }
        let per_match = if self.config.queue_independently {
            1.0 - (1.0 - self.chance).powi(self.config.num_friends as i32)
        } else {
            self.chance
        };
        if per_match <= 0.0 {
            return Some(f64::INFINITY);
        }
        Some(1.0 / per_match)
    }
}

/// Average matches to unlock, using a freshly seeded generator
pub fn simulate(config: &UnlockConfig) -> Result<f64, SimError> {
    let mut source = RngSource::from_entropy();
    simulate_with_source(config, &mut source)
}

/// Average matches to unlock, drawing from `source`
pub fn simulate_with_source(
    config: &UnlockConfig,
    source: &mut impl RandomSource,
) -> Result<f64, SimError> {
    let mut sim = Simulation::new(config.clone(), 0)?;
    sim.run_with_source(source)
}
