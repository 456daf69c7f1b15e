use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// Which terms the "at least k successes" binomial sum includes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SummationBound {
    /// Sum `i` over `k..=n` (true "at least k")
    #[default]
    Inclusive,
    /// Sum `i` over `k..n`, leaving out the all-successes term
    Exclusive,
}

/// Parameters for one unlock simulation.
///
/// Each scenario builds its own value; nothing is shared or mutated between
/// runs. Missing JSON fields fall back to [`UnlockConfig::default`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnlockConfig {
    /// Number of friends attempting to unlock Cho'gall
    pub num_friends: usize,
    /// Per-player, per-match chance of Cho'gall being in the game
    pub chogall_chance: f64,
    /// Cho'gall sightings a friend needs before the unlock
    pub unlock_games: u32,
    /// Total players in one match
    pub players_per_match: usize,

    /// If true, k friends in a party leave (players_per_match - k) slots
    /// that could be Cho'gall. If false, the party never changes the pool.
    pub party_size_affects_players: bool,
    /// If true, every friend gets their own match draw each attempt.
    /// If false, the whole party shares one draw.
    pub queue_independently: bool,

    /// Independent samples to average over
    pub num_samples: usize,

    /// Upper bound policy for the binomial sum
    pub summation_bound: SummationBound,
    /// Give up on a sample after this many attempts (None = run until unlock)
    pub max_attempts_per_sample: Option<u64>,
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            num_friends: 2,
            chogall_chance: 0.001,
            unlock_games: 1,
            players_per_match: 10,
            party_size_affects_players: true,
            queue_independently: true,
            num_samples: 1000,
            summation_bound: SummationBound::Inclusive,
            max_attempts_per_sample: None,
        }
    }
}

impl UnlockConfig {
    /// Baseline: 1 game to unlock, queuing separately
    pub fn baseline() -> Self {
        Self::default()
    }

    /// 1 game to unlock, queuing together
    pub fn queued_together() -> Self {
        Self {
            queue_independently: false,
            ..Default::default()
        }
    }

    /// 100 games to unlock, queuing separately
    pub fn high_threshold() -> Self {
        Self {
            unlock_games: 100,
            ..Default::default()
        }
    }

    /// 100 games to unlock, queuing together
    pub fn high_threshold_queued_together() -> Self {
        Self {
            unlock_games: 100,
            queue_independently: false,
            ..Default::default()
        }
    }

    pub fn with_num_friends(mut self, num_friends: usize) -> Self {
        self.num_friends = num_friends;
        self
    }

    pub fn with_chogall_chance(mut self, chogall_chance: f64) -> Self {
        self.chogall_chance = chogall_chance;
        self
    }

    pub fn with_unlock_games(mut self, unlock_games: u32) -> Self {
        self.unlock_games = unlock_games;
        self
    }

    pub fn with_players_per_match(mut self, players_per_match: usize) -> Self {
        self.players_per_match = players_per_match;
        self
    }

    pub fn with_party_size_affects_players(mut self, affects: bool) -> Self {
        self.party_size_affects_players = affects;
        self
    }

    pub fn with_queue_independently(mut self, independently: bool) -> Self {
        self.queue_independently = independently;
        self
    }

    pub fn with_num_samples(mut self, num_samples: usize) -> Self {
        self.num_samples = num_samples;
        self
    }

    pub fn with_summation_bound(mut self, bound: SummationBound) -> Self {
        self.summation_bound = bound;
        self
    }

    pub fn with_max_attempts_per_sample(mut self, cap: Option<u64>) -> Self {
        self.max_attempts_per_sample = cap;
        self
    }

    /// Number of other players in a match who could be Cho'gall
    pub fn effective_players(&self) -> usize {
        if self.party_size_affects_players {
            self.players_per_match.saturating_sub(self.num_friends)
        } else {
            self.players_per_match
        }
    }

    /// Reject configurations the math is not defined for
    pub fn validate(&self) -> Result<(), SimError> {
        if self.num_friends == 0 {
            return Err(SimError::NoFriends);
        }
        if self.unlock_games == 0 {
            return Err(SimError::ZeroUnlockGames);
        }
        if self.num_samples == 0 {
            return Err(SimError::ZeroSamples);
        }
        if self.players_per_match == 0 {
            return Err(SimError::ZeroPlayersPerMatch);
        }
        if !self.chogall_chance.is_finite() || !(0.0..=1.0).contains(&self.chogall_chance) {
            return Err(SimError::ChanceOutOfRange(self.chogall_chance));
        }
        if self.party_size_affects_players && self.num_friends > self.players_per_match {
            return Err(SimError::PartyExceedsMatch {
                friends: self.num_friends,
                players: self.players_per_match,
            });
        }
        if self.max_attempts_per_sample == Some(0) {
            return Err(SimError::ZeroAttemptCap);
        }
        Ok(())
    }
}

/// Statistics collected over the samples of one simulation
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct UnlockStats {
    /// Samples completed
    pub samples: usize,
    /// Streaming average of attempts to unlock
    pub avg_attempts: f64,
    pub min_attempts: u64,
    pub max_attempts: u64,
    pub attempts_p50: u64,
    pub attempts_p90: u64,
    /// How many samples each friend unlocked first (ties go to the lowest index)
    pub unlocks_per_friend: Vec<usize>,
    /// Raw attempts per sample
    pub attempt_samples: Vec<u64>,
}

impl UnlockStats {
    pub fn new(num_friends: usize) -> Self {
        Self {
            unlocks_per_friend: vec![0; num_friends],
            ..Default::default()
        }
    }

    /// Fill in min/max/percentiles from the recorded samples
    pub fn finalize(&mut self) {
        if self.attempt_samples.is_empty() {
            return;
        }
        let mut sorted = self.attempt_samples.clone();
        sorted.sort_unstable();

        self.samples = sorted.len();
        self.min_attempts = sorted[0];
        self.max_attempts = sorted[sorted.len() - 1];
        self.attempts_p50 = sorted[sorted.len() / 2];
        self.attempts_p90 = sorted[((sorted.len() as f64 * 0.9) as usize).min(sorted.len() - 1)];
    }
}

/// Labeled outcome of one named scenario
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub label: String,
    pub config: UnlockConfig,
    pub avg_attempts: f64,
}

/// Configuration fields a parameter sweep can vary
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SweepParameter {
    ChogallChance,
    UnlockGames,
    NumFriends,
    PlayersPerMatch,
    NumSamples,
}

impl SweepParameter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "chogall_chance" => Some(Self::ChogallChance),
            "unlock_games" => Some(Self::UnlockGames),
            "num_friends" => Some(Self::NumFriends),
            "players_per_match" => Some(Self::PlayersPerMatch),
            "num_samples" => Some(Self::NumSamples),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ChogallChance => "chogall_chance",
            Self::UnlockGames => "unlock_games",
            Self::NumFriends => "num_friends",
            Self::PlayersPerMatch => "players_per_match",
            Self::NumSamples => "num_samples",
        }
    }

    /// Copy of `base` with this parameter set to `value`.
    ///
    /// Count fields only accept whole, non-negative values that fit the field.
    pub fn apply(&self, base: &UnlockConfig, value: f64) -> Result<UnlockConfig, SimError> {
        let config = base.clone();
        let config = match self {
            Self::ChogallChance => {
                if !value.is_finite() {
                    return Err(self.invalid(value));
                }
                config.with_chogall_chance(value)
            }
            Self::UnlockGames => {
                let games = self.whole_number(value, u32::MAX as f64)?;
                config.with_unlock_games(games as u32)
            }
            Self::NumFriends => config.with_num_friends(self.whole_number(value, usize::MAX as f64)?),
            Self::PlayersPerMatch => {
                config.with_players_per_match(self.whole_number(value, usize::MAX as f64)?)
            }
            Self::NumSamples => config.with_num_samples(self.whole_number(value, usize::MAX as f64)?),
        };
        Ok(config)
    }

    fn whole_number(&self, value: f64, max: f64) -> Result<usize, SimError> {
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > max {
            return Err(self.invalid(value));
        }
        Ok(value as usize)
    }

    fn invalid(&self, value: f64) -> SimError {
        SimError::InvalidSweepValue {
            parameter: self.name(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_baseline_scenario() {
        let config = UnlockConfig::default();
        assert_eq!(config.num_friends, 2);
        assert_eq!(config.chogall_chance, 0.001);
        assert_eq!(config.unlock_games, 1);
        assert_eq!(config.players_per_match, 10);
        assert!(config.party_size_affects_players);
        assert!(config.queue_independently);
        assert_eq!(config.num_samples, 1000);
        assert_eq!(config.summation_bound, SummationBound::Inclusive);
        assert_eq!(config.max_attempts_per_sample, None);
        assert_eq!(UnlockConfig::baseline(), config);
    }

    #[test]
    fn test_presets_do_not_leak_into_each_other() {
        let together = UnlockConfig::queued_together();
        let high = UnlockConfig::high_threshold();
        let both = UnlockConfig::high_threshold_queued_together();

        assert!(!together.queue_independently);
        assert_eq!(together.unlock_games, 1);
        assert!(high.queue_independently);
        assert_eq!(high.unlock_games, 100);
        assert!(!both.queue_independently);
        assert_eq!(both.unlock_games, 100);
        assert_eq!(UnlockConfig::default().unlock_games, 1);
    }

    #[test]
    fn test_effective_players() {
        let config = UnlockConfig::default();
        assert_eq!(config.effective_players(), 8);

        let config = config.with_party_size_affects_players(false);
        assert_eq!(config.effective_players(), 10);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = UnlockConfig::default();
        assert!(base.validate().is_ok());

        assert_eq!(base.clone().with_num_friends(0).validate(), Err(SimError::NoFriends));
        assert_eq!(base.clone().with_unlock_games(0).validate(), Err(SimError::ZeroUnlockGames));
        assert_eq!(base.clone().with_num_samples(0).validate(), Err(SimError::ZeroSamples));
        assert_eq!(
            base.clone().with_players_per_match(0).validate(),
            Err(SimError::ZeroPlayersPerMatch)
        );
        assert_eq!(
            base.clone().with_chogall_chance(1.5).validate(),
            Err(SimError::ChanceOutOfRange(1.5))
        );
        assert!(base.clone().with_chogall_chance(f64::NAN).validate().is_err());
        assert_eq!(
            base.clone().with_num_friends(12).validate(),
            Err(SimError::PartyExceedsMatch { friends: 12, players: 10 })
        );
        assert_eq!(
            base.clone().with_max_attempts_per_sample(Some(0)).validate(),
            Err(SimError::ZeroAttemptCap)
        );
    }

    #[test]
    fn test_large_party_allowed_when_pool_unaffected() {
        let config = UnlockConfig::default()
            .with_num_friends(12)
            .with_party_size_affects_players(false);
        assert!(config.validate().is_ok());
        assert_eq!(config.effective_players(), 10);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: UnlockConfig =
            serde_json::from_str(r#"{ "unlock_games": 5, "queue_independently": false }"#).unwrap();
        assert_eq!(config.unlock_games, 5);
        assert!(!config.queue_independently);
        assert_eq!(config.num_friends, 2);
        assert_eq!(config.chogall_chance, 0.001);
    }

    #[test]
    fn test_json_summation_bound() {
        let config: UnlockConfig =
            serde_json::from_str(r#"{ "summation_bound": "Exclusive" }"#).unwrap();
        assert_eq!(config.summation_bound, SummationBound::Exclusive);
    }

    #[test]
    fn test_stats_finalize_percentiles() {
        let mut stats = UnlockStats::new(2);
        stats.attempt_samples = (1..=10).rev().collect();
        stats.finalize();

        assert_eq!(stats.samples, 10);
        assert_eq!(stats.min_attempts, 1);
        assert_eq!(stats.max_attempts, 10);
        assert_eq!(stats.attempts_p50, 6);
        assert_eq!(stats.attempts_p90, 10);
        assert_eq!(stats.unlocks_per_friend, vec![0, 0]);
    }

    #[test]
    fn test_sweep_parameter_apply() {
        let base = UnlockConfig::default();
        assert_eq!(SweepParameter::from_name("bogus"), None);

        let param = SweepParameter::from_name("unlock_games").unwrap();
        assert_eq!(param.apply(&base, 7.0).unwrap().unlock_games, 7);

        let param = SweepParameter::from_name("chogall_chance").unwrap();
        assert_eq!(param.apply(&base, 0.25).unwrap().chogall_chance, 0.25);
        assert_eq!(base.chogall_chance, 0.001);

        let param = SweepParameter::from_name("num_friends").unwrap();
        assert_eq!(param.apply(&base, 3.0).unwrap().num_friends, 3);
    }

    #[test]
    fn test_sweep_rejects_values_count_fields_cannot_hold() {
        let base = UnlockConfig::default();
        for param in [
            SweepParameter::UnlockGames,
            SweepParameter::NumFriends,
            SweepParameter::PlayersPerMatch,
            SweepParameter::NumSamples,
        ] {
            for value in [2.5, -1.0, f64::NAN, f64::INFINITY] {
                let err = param.apply(&base, value).unwrap_err();
                assert!(
                    matches!(err, SimError::InvalidSweepValue { parameter, .. } if parameter == param.name()),
                    "{:?} accepted {}",
                    param,
                    value
                );
            }
        }

        let err = SweepParameter::UnlockGames.apply(&base, 5e9).unwrap_err();
        assert!(matches!(err, SimError::InvalidSweepValue { .. }));
        assert!(SweepParameter::ChogallChance.apply(&base, f64::NAN).is_err());
    }

    #[test]
    fn test_sweep_names_round_trip() {
        for param in [
            SweepParameter::ChogallChance,
            SweepParameter::UnlockGames,
            SweepParameter::NumFriends,
            SweepParameter::PlayersPerMatch,
            SweepParameter::NumSamples,
        ] {
            assert_eq!(SweepParameter::from_name(param.name()), Some(param));
        }
    }
}
