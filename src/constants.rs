use crate::types::Personality;

pub const GRID_SIZE: i32 = 20;

pub const BASE_TICK_MS: u64 = 140;
pub const SPEED_STEP_MS: u64 = 10;
pub const MIN_TICK_MS: u64 = 60;
pub const AGENT_SPEED_RATIO: f32 = 0.7;

pub const SNAKE_LENGTH: usize = 3;
pub const PLACEMENT_ATTEMPTS: u32 = 400;

pub const BASE_MISTAKE_CHANCE: f32 = 0.2;
pub const MAX_EXTRA_MISTAKE: f32 = 0.25;
pub const MISTAKE_LENGTH_SCALE: f32 = 20.0;

pub const FOOD_SCORE: i32 = 1;
pub const SHIELD_FOOD_CHANCE: f32 = 0.15;

pub const BONUS_SPAWN_CHANCE: f32 = 0.3;
pub const BONUS_LIFETIME_TICKS: u32 = 40;
pub const BONUS_SCORE: i32 = 5;
pub const BONUS_WEIGHT_MULTIPLIER: f32 = 5.0;

pub const SPEED_BOOST_MS: u64 = 3_000;
pub const SPEED_BOOST_MULTIPLIER: f32 = 0.7;

pub fn get_personality_weights(personality: Personality) -> (f32, f32) {
    match personality {
        Personality::Greedy => (10.0, 0.0),
        Personality::Aggressive => (6.0, 8.0),
        Personality::Cautious => (12.0, -12.0),
    }
}

pub fn tick_ms_for_score(total_score: i32, base_ms: u64, step_ms: u64, min_ms: u64) -> u64 {
    let speed_up = (total_score.max(0) as u64).saturating_mul(step_ms);
    base_ms.saturating_sub(speed_up).max(min_ms)
}
