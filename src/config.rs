use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    get_personality_weights, AGENT_SPEED_RATIO, BASE_MISTAKE_CHANCE, BASE_TICK_MS,
    BONUS_LIFETIME_TICKS, BONUS_SCORE, BONUS_SPAWN_CHANCE, BONUS_WEIGHT_MULTIPLIER, FOOD_SCORE,
    GRID_SIZE, MAX_EXTRA_MISTAKE, MIN_TICK_MS, MISTAKE_LENGTH_SCALE, PLACEMENT_ATTEMPTS,
    SHIELD_FOOD_CHANCE, SNAKE_LENGTH, SPEED_BOOST_MS, SPEED_BOOST_MULTIPLIER, SPEED_STEP_MS,
};
use crate::types::Personality;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("grid size {grid_size} cannot fit a snake of length {snake_length}")]
    GridTooSmall { grid_size: i32, snake_length: usize },
    #[error("{field} must be within [0, 1], got {value}")]
    ProbabilityOutOfRange { field: &'static str, value: f32 },
    #[error("agent speed ratio must be in (0, 1], got {0}")]
    InvalidSpeedRatio(f32),
    #[error("tick interval bounds invalid: min {min_ms} ms, base {base_ms} ms")]
    InvalidTickBounds { min_ms: u64, base_ms: u64 },
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalityWeights {
    pub greedy: (f32, f32),
    pub aggressive: (f32, f32),
    pub cautious: (f32, f32),
}

impl PersonalityWeights {
    pub fn weights_for(&self, personality: Personality) -> (f32, f32) {
        match personality {
            Personality::Greedy => self.greedy,
            Personality::Aggressive => self.aggressive,
            Personality::Cautious => self.cautious,
        }
    }
}

impl Default for PersonalityWeights {
    fn default() -> Self {
        Self {
            greedy: get_personality_weights(Personality::Greedy),
            aggressive: get_personality_weights(Personality::Aggressive),
            cautious: get_personality_weights(Personality::Cautious),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SimConfig {
    pub grid_size: i32,
    pub base_tick_ms: u64,
    pub speed_step_ms: u64,
    pub min_tick_ms: u64,
    pub agent_speed_ratio: f32,
    pub mistake_base: f32,
    pub mistake_extra: f32,
    pub mistake_length_scale: f32,
    pub snake_length: usize,
    pub placement_attempts: u32,
    pub food_score: i32,
    pub shield_food_chance: f32,
    pub bonus_spawn_chance: f32,
    pub bonus_lifetime_ticks: u32,
    pub bonus_score: i32,
    pub bonus_weight_multiplier: f32,
    pub speed_boost_ms: u64,
    pub speed_boost_multiplier: f32,
    pub personality: Personality,
    pub personality_weights: PersonalityWeights,
    pub clear_bonus_on_double_death: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            base_tick_ms: BASE_TICK_MS,
            speed_step_ms: SPEED_STEP_MS,
            min_tick_ms: MIN_TICK_MS,
            agent_speed_ratio: AGENT_SPEED_RATIO,
            mistake_base: BASE_MISTAKE_CHANCE,
            mistake_extra: MAX_EXTRA_MISTAKE,
            mistake_length_scale: MISTAKE_LENGTH_SCALE,
            snake_length: SNAKE_LENGTH,
            placement_attempts: PLACEMENT_ATTEMPTS,
            food_score: FOOD_SCORE,
            shield_food_chance: SHIELD_FOOD_CHANCE,
            bonus_spawn_chance: BONUS_SPAWN_CHANCE,
            bonus_lifetime_ticks: BONUS_LIFETIME_TICKS,
            bonus_score: BONUS_SCORE,
            bonus_weight_multiplier: BONUS_WEIGHT_MULTIPLIER,
            speed_boost_ms: SPEED_BOOST_MS,
            speed_boost_multiplier: SPEED_BOOST_MULTIPLIER,
            personality: Personality::Greedy,
            personality_weights: PersonalityWeights::default(),
            clear_bonus_on_double_death: false,
        }
    }
}

impl SimConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snake_length == 0 {
            return Err(ConfigError::NotPositive {
                field: "snakeLength",
            });
        }
        // A straight body has to fit without crossing the wrap seam.
        if self.grid_size < 2 || (self.grid_size as usize) < self.snake_length {
            return Err(ConfigError::GridTooSmall {
                grid_size: self.grid_size,
                snake_length: self.snake_length,
            });
        }
        if !(self.agent_speed_ratio > 0.0 && self.agent_speed_ratio <= 1.0) {
            return Err(ConfigError::InvalidSpeedRatio(self.agent_speed_ratio));
        }
        if self.min_tick_ms == 0 || self.min_tick_ms > self.base_tick_ms {
            return Err(ConfigError::InvalidTickBounds {
                min_ms: self.min_tick_ms,
                base_ms: self.base_tick_ms,
            });
        }
        if self.bonus_lifetime_ticks == 0 {
            return Err(ConfigError::NotPositive {
                field: "bonusLifetimeTicks",
            });
        }
        if self.mistake_length_scale <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "mistakeLengthScale",
            });
        }
        if self.speed_boost_multiplier <= 0.0 {
            return Err(ConfigError::NotPositive {
                field: "speedBoostMultiplier",
            });
        }
        for (field, value) in [
            ("mistakeBase", self.mistake_base),
            ("shieldFoodChance", self.shield_food_chance),
            ("bonusSpawnChance", self.bonus_spawn_chance),
        ] {
            check_probability(field, value)?;
        }
        check_probability("mistakeBase + mistakeExtra", self.mistake_base + self.mistake_extra)?;
        if self.mistake_extra < 0.0 {
            return Err(ConfigError::ProbabilityOutOfRange {
                field: "mistakeExtra",
                value: self.mistake_extra,
            });
        }
        Ok(())
    }
}

fn check_probability(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ProbabilityOutOfRange { field, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid_size, 20);
        assert_eq!(
            config.personality_weights.weights_for(config.personality),
            (10.0, 0.0)
        );
    }

    #[test]
    fn partial_json_overrides_only_named_fields() {
        let config = SimConfig::from_json_str(
            r#"{"gridSize":12,"personality":"cautious","bonusSpawnChance":0.0}"#,
        )
        .expect("partial config should parse");
        assert_eq!(config.grid_size, 12);
        assert_eq!(config.personality, Personality::Cautious);
        assert_eq!(config.bonus_spawn_chance, 0.0);
        assert_eq!(config.base_tick_ms, BASE_TICK_MS);
        assert_eq!(
            config.personality_weights.weights_for(config.personality),
            (12.0, -12.0)
        );
    }

    #[test]
    fn rejects_speed_ratio_above_one() {
        let config = SimConfig {
            agent_speed_ratio: 1.5,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidSpeedRatio(_))
        ));
    }

    #[test]
    fn rejects_grid_smaller_than_snake() {
        let config = SimConfig {
            grid_size: 2,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::GridTooSmall { .. })
        ));
    }

    #[test]
    fn rejects_mistake_chance_that_can_exceed_one() {
        let config = SimConfig {
            mistake_base: 0.8,
            mistake_extra: 0.5,
            ..SimConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ProbabilityOutOfRange { .. })
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            SimConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let missing = std::env::temp_dir()
            .join("snake-duel-missing-config-dir")
            .join("config.json");
        assert!(matches!(
            SimConfig::load(&missing),
            Err(ConfigError::Io { .. })
        ));
    }
}
