use crate::config::SimConfig;
use crate::grid::{advance_body, blocking_body, next_head, toroidal_distance};
use crate::rng::RandomSource;
use crate::types::{Direction, GameState, SnakeView, Vec2};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HumanForecast {
    pub head: Vec2,
    pub body: Vec<Vec2>,
}

pub fn forecast_human(state: &GameState, grid_size: i32) -> HumanForecast {
    let human = &state.human;
    let head = next_head(&human.body, human.next_dir, grid_size);
    let body = advance_body(&human.body, head, grows_at(state, head));
    HumanForecast { head, body }
}

fn grows_at(state: &GameState, cell: Vec2) -> bool {
    state.food.is_some_and(|food| food.pos == cell)
        || state.bonus.is_some_and(|bonus| bonus.pos == cell)
}

fn is_reversal(snake: &SnakeView, dir: Direction) -> bool {
    snake.len() > 1 && dir == snake.dir.opposite()
}

pub fn safe_directions(
    state: &GameState,
    forecast: &HumanForecast,
    grid_size: i32,
) -> Vec<Direction> {
    let agent = &state.agent;
    Direction::ALL
        .into_iter()
        .filter(|dir| {
            if is_reversal(agent, *dir) {
                return false;
            }
            let next = next_head(&agent.body, *dir, grid_size);
            let own = blocking_body(&agent.body, grows_at(state, next));
            !own.contains(&next) && !forecast.body.contains(&next)
        })
        .collect()
}

pub fn mistake_chance(body_len: usize, config: &SimConfig) -> f32 {
    let tail_len = body_len.saturating_sub(1) as f32;
    config.mistake_base + config.mistake_extra * (tail_len / config.mistake_length_scale).min(1.0)
}

/// Ties go to the earliest candidate in [`Direction::ALL`] order.
pub fn choose_direction<R>(state: &GameState, config: &SimConfig, rng: &mut R) -> Direction
where
    R: RandomSource + ?Sized,
{
    let agent = &state.agent;
    let grid_size = config.grid_size;
    let forecast = forecast_human(state, grid_size);

    let safe = safe_directions(state, &forecast, grid_size);
    if safe.is_empty() {
        return agent.dir;
    }

    if rng.bool(mistake_chance(agent.len(), config)) {
        return safe[rng.pick_index(safe.len())];
    }

    let personality = agent.personality.unwrap_or(config.personality);
    let (w_food, w_human) = config.personality_weights.weights_for(personality);
    let w_bonus = w_food * config.bonus_weight_multiplier;

    let mut best = safe[0];
    let mut best_score = f32::NEG_INFINITY;
    for dir in safe {
        let next = next_head(&agent.body, dir, grid_size);
        let mut score = 0.0;
        if let Some(food) = state.food {
            score += w_food * -(toroidal_distance(next, food.pos, grid_size) as f32);
        }
        if let Some(bonus) = state.bonus {
            score += w_bonus * -(toroidal_distance(next, bonus.pos, grid_size) as f32);
        }
        score += w_human * -(toroidal_distance(next, forecast.head, grid_size) as f32);

        if score > best_score {
            best_score = score;
            best = dir;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::SequenceRng;
    use crate::types::{BonusItem, Food, FoodKind, PerSide, Personality};

    // A draw above every mistake threshold, so the greedy scorer decides.
    const NO_MISTAKE: f32 = 0.99;

    fn snake(body: &[(i32, i32)], dir: Direction) -> SnakeView {
        SnakeView {
            body: body.iter().map(|&(x, y)| Vec2::new(x, y)).collect(),
            dir,
            next_dir: dir,
            score: 0,
            shield: 0,
            personality: None,
        }
    }

    fn state(human: SnakeView, agent: SnakeView, food: Option<(i32, i32)>) -> GameState {
        GameState {
            human,
            agent,
            food: food.map(|(x, y)| Food {
                pos: Vec2::new(x, y),
                kind: FoodKind::Apple,
            }),
            bonus: None,
            running: true,
            paused: false,
            round_wins: PerSide::default(),
            boost_until_ms: PerSide::default(),
        }
    }

    fn far_human() -> SnakeView {
        snake(&[(15, 15), (14, 15), (13, 15)], Direction::Right)
    }

    #[test]
    fn never_reverses_a_long_body() {
        let game = state(
            far_human(),
            snake(&[(5, 5), (4, 5), (3, 5)], Direction::Right),
            None,
        );
        let forecast = forecast_human(&game, 20);
        let safe = safe_directions(&game, &forecast, 20);
        assert!(!safe.contains(&Direction::Left));
        assert_eq!(safe, vec![Direction::Up, Direction::Down, Direction::Right]);
    }

    #[test]
    fn single_cell_snake_may_turn_around() {
        let game = state(far_human(), snake(&[(5, 5)], Direction::Right), None);
        let forecast = forecast_human(&game, 20);
        assert_eq!(safe_directions(&game, &forecast, 20).len(), 4);
    }

    #[test]
    fn moving_into_the_leaving_tail_is_safe_unless_growing() {
        // Agent coiled so that Up reaches its own tail.
        let coiled = snake(&[(5, 5), (6, 5), (6, 4), (5, 4)], Direction::Left);
        let game = state(far_human(), coiled.clone(), None);
        let forecast = forecast_human(&game, 20);
        assert!(safe_directions(&game, &forecast, 20).contains(&Direction::Up));

        let fed = state(far_human(), coiled, Some((5, 4)));
        let forecast = forecast_human(&fed, 20);
        assert!(!safe_directions(&fed, &forecast, 20).contains(&Direction::Up));
    }

    #[test]
    fn avoids_the_predicted_human_head() {
        // Human heading down into (5, 4); agent at (5, 5) must not go Up.
        let human = snake(&[(5, 3), (5, 2), (5, 1)], Direction::Down);
        let agent = snake(&[(5, 5), (5, 6), (5, 7)], Direction::Up);
        let game = state(human, agent, None);
        let forecast = forecast_human(&game, 20);
        assert_eq!(forecast.head, Vec2::new(5, 4));
        let safe = safe_directions(&game, &forecast, 20);
        assert!(!safe.contains(&Direction::Up));
    }

    #[test]
    fn trapped_snake_keeps_its_direction() {
        // Boxed in by the human forecast body on all four sides.
        let human = snake(
            &[(5, 6), (6, 6), (6, 5), (6, 4), (5, 4), (4, 4), (4, 5), (4, 6)],
            Direction::Left,
        );
        let agent = snake(&[(5, 5)], Direction::Left);
        let mut game = state(human, agent, None);
        game.human.next_dir = Direction::Down;
        let mut rng = SequenceRng::new(vec![0.0]);
        assert_eq!(
            choose_direction(&game, &SimConfig::default(), &mut rng),
            Direction::Left
        );
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn greedy_heads_for_food_across_the_seam() {
        // Food at x=19 is one step left through the wrap.
        let game = state(
            far_human(),
            snake(&[(0, 10), (0, 11), (0, 12)], Direction::Up),
            Some((19, 10)),
        );
        let mut rng = SequenceRng::new(vec![NO_MISTAKE]);
        assert_eq!(
            choose_direction(&game, &SimConfig::default(), &mut rng),
            Direction::Left
        );
    }

    #[test]
    fn ties_resolve_to_enumeration_order() {
        // No food: every safe direction scores the same and Up wins.
        let game = state(
            far_human(),
            snake(&[(5, 5), (4, 5), (3, 5)], Direction::Right),
            None,
        );
        let mut rng = SequenceRng::new(vec![NO_MISTAKE]);
        assert_eq!(
            choose_direction(&game, &SimConfig::default(), &mut rng),
            Direction::Up
        );

        // Food up and to the right: Up and Right tie, Up is listed first.
        let game = state(
            far_human(),
            snake(&[(5, 5), (5, 6), (5, 7)], Direction::Up),
            Some((8, 2)),
        );
        let mut rng = SequenceRng::new(vec![NO_MISTAKE]);
        assert_eq!(
            choose_direction(&game, &SimConfig::default(), &mut rng),
            Direction::Up
        );
    }

    #[test]
    fn bonus_outweighs_food() {
        let mut game = state(
            far_human(),
            snake(&[(10, 10), (10, 11), (10, 12)], Direction::Up),
            Some((6, 10)),
        );
        game.bonus = Some(BonusItem {
            pos: Vec2::new(13, 10),
            ticks_left: 5,
        });
        let mut rng = SequenceRng::new(vec![NO_MISTAKE]);
        assert_eq!(
            choose_direction(&game, &SimConfig::default(), &mut rng),
            Direction::Right
        );
    }

    #[test]
    fn cautious_moves_away_and_aggressive_closes_in() {
        // No food: only the human term matters. Human forecast head at (8, 5),
        // agent ten rows away so Up and Left close in equally and Right retreats.
        let human = snake(&[(7, 5), (6, 5), (5, 5)], Direction::Right);
        let mut agent = snake(&[(12, 15), (12, 16), (12, 17)], Direction::Up);

        agent.personality = Some(Personality::Aggressive);
        let game = state(human.clone(), agent.clone(), None);
        let mut rng = SequenceRng::new(vec![NO_MISTAKE]);
        assert_eq!(
            choose_direction(&game, &SimConfig::default(), &mut rng),
            Direction::Up
        );

        agent.personality = Some(Personality::Cautious);
        let game = state(human, agent, None);
        let mut rng = SequenceRng::new(vec![NO_MISTAKE]);
        assert_eq!(
            choose_direction(&game, &SimConfig::default(), &mut rng),
            Direction::Right
        );
    }

    #[test]
    fn mistake_picks_a_random_safe_direction() {
        let game = state(
            far_human(),
            snake(&[(5, 5), (4, 5), (3, 5)], Direction::Right),
            Some((8, 5)),
        );
        // First draw triggers the mistake, second indexes into [Up, Down, Right].
        let mut rng = SequenceRng::new(vec![0.0, 0.0]);
        assert_eq!(
            choose_direction(&game, &SimConfig::default(), &mut rng),
            Direction::Up
        );
        let mut rng = SequenceRng::new(vec![0.0, 0.4]);
        assert_eq!(
            choose_direction(&game, &SimConfig::default(), &mut rng),
            Direction::Down
        );
    }

    #[test]
    fn mistake_chance_grows_with_tail_and_caps() {
        let config = SimConfig::default();
        assert!((mistake_chance(1, &config) - 0.2).abs() < 1e-6);
        assert!((mistake_chance(11, &config) - 0.325).abs() < 1e-6);
        assert!((mistake_chance(21, &config) - 0.45).abs() < 1e-6);
        assert!((mistake_chance(200, &config) - 0.45).abs() < 1e-6);
    }
}
