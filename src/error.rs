use thiserror::Error;

/// Errors raised while building or running an unlock simulation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("num_friends must be at least 1")]
    NoFriends,

    #[error("unlock_games must be at least 1")]
    ZeroUnlockGames,

    #[error("num_samples must be at least 1")]
    ZeroSamples,

    #[error("players_per_match must be at least 1")]
    ZeroPlayersPerMatch,

    #[error("chogall_chance must be within [0, 1], got {0}")]
    ChanceOutOfRange(f64),

    /// Friends occupy slots in their own match, so the party cannot outgrow it
    #[error("party of {friends} friends does not fit in a {players}-player match")]
    PartyExceedsMatch { friends: usize, players: usize },

    #[error("max_attempts_per_sample must be at least 1 when set")]
    ZeroAttemptCap,

    #[error("probability must be within [0, 1], got {0}")]
    ProbabilityOutOfRange(f64),

    #[error("cannot require {k} successes out of {n} trials")]
    MinSuccessesExceedTrials { n: usize, k: usize },

    #[error("{parameter} cannot be set to {value}")]
    InvalidSweepValue { parameter: &'static str, value: f64 },

    #[error("sample did not unlock within {attempts} attempts")]
    DidNotConverge { attempts: u64 },
}
