use std::collections::HashSet;

use crate::config::{ConfigError, SimConfig};
use crate::constants::tick_ms_for_score;
use crate::grid::{advance_body, blocking_body, next_head};
use crate::observer::GameObserver;
use crate::policy::choose_direction;
use crate::rng::{RandomSource, Rng};
use crate::scheduler::Scheduler;
use crate::types::{
    Direction, EngineMode, FoodKind, GameEvent, GameState, PerSide, Personality, Side, Snapshot,
    SnakeView, Vec2,
};

pub mod spawn_system;

use self::spawn_system::{maybe_spawn_bonus, place_snake, spawn_food};

const SIDES: [Side; 2] = [Side::Human, Side::Agent];
// Movement accumulator units per whole move; integer so a ratio like 0.7
// yields exactly 7 moves in 10 ticks.
const MOVE_UNITS: u32 = 1_000_000;

#[derive(Clone, Debug)]
struct MovePlan {
    moved: bool,
    dir: Direction,
    head: Vec2,
    body: Vec<Vec2>,
    eats_food: bool,
    eats_bonus: bool,
}

impl MovePlan {
    fn grows(&self) -> bool {
        self.eats_food || self.eats_bonus
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Fate {
    Alive,
    Shielded,
    Dead,
}

pub struct GameEngine<R: RandomSource = Rng> {
    config: SimConfig,
    state: GameState,
    rng: R,
    scheduler: Box<dyn Scheduler + Send>,
    observer: Box<dyn GameObserver + Send>,
    best_scores: PerSide<i32>,
    agent_move_buffer: u32,
    agent_move_step: u32,
    current_tick_ms: u64,
    clock_ms: u64,
    tick_counter: u64,
    events: Vec<GameEvent>,
}

impl GameEngine<Rng> {
    pub fn with_seed(
        config: SimConfig,
        seed: u32,
        scheduler: Box<dyn Scheduler + Send>,
        observer: Box<dyn GameObserver + Send>,
    ) -> Result<Self, ConfigError> {
        Self::new(config, Rng::new(seed), scheduler, observer)
    }
}

impl<R: RandomSource> GameEngine<R> {
    pub fn new(
        config: SimConfig,
        mut rng: R,
        scheduler: Box<dyn Scheduler + Send>,
        observer: Box<dyn GameObserver + Send>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = new_board(&config, &mut rng);
        let mut engine = Self {
            current_tick_ms: config.base_tick_ms,
            agent_move_step: move_step(config.agent_speed_ratio),
            config,
            state,
            rng,
            scheduler,
            observer,
            best_scores: PerSide::default(),
            agent_move_buffer: 0,
            clock_ms: 0,
            tick_counter: 0,
            events: Vec::new(),
        };
        engine.current_tick_ms = engine.compute_tick_ms();
        engine.publish();
        Ok(engine)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn mode(&self) -> EngineMode {
        self.state.mode()
    }

    pub fn best_scores(&self) -> PerSide<i32> {
        self.best_scores
    }

    pub fn tick_ms(&self) -> u64 {
        self.current_tick_ms
    }

    pub fn clock_ms(&self) -> u64 {
        self.clock_ms
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_counter
    }

    pub fn agent_move_buffer(&self) -> f32 {
        self.agent_move_buffer as f32 / MOVE_UNITS as f32
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            tick: self.tick_counter,
            clock_ms: self.clock_ms,
            tick_ms: self.current_tick_ms,
            mode: self.state.mode(),
            state: self.state.clone(),
        }
    }

    pub fn reset(&mut self) {
        self.scheduler.cancel();
        self.state = new_board(&self.config, &mut self.rng);
        self.best_scores = PerSide::default();
        self.agent_move_buffer = 0;
        self.clock_ms = 0;
        self.tick_counter = 0;
        self.events.clear();
        self.current_tick_ms = self.compute_tick_ms();
        self.publish();
    }

    pub fn start(&mut self) {
        match self.state.mode() {
            EngineMode::Running => return,
            EngineMode::Idle => self.observer.on_event(&GameEvent::Start),
            EngineMode::Paused => {}
        }
        self.state.running = true;
        self.state.paused = false;
        self.current_tick_ms = self.compute_tick_ms();
        self.scheduler.schedule(self.current_tick_ms);
        self.publish_ui();
    }

    pub fn restart(&mut self) {
        self.reset();
        self.start();
    }

    pub fn pause(&mut self) {
        if self.state.mode() != EngineMode::Running {
            return;
        }
        self.state.paused = true;
        self.scheduler.cancel();
        self.publish_ui();
    }

    pub fn resume(&mut self) {
        if self.state.mode() != EngineMode::Paused {
            return;
        }
        self.state.paused = false;
        self.scheduler.schedule(self.current_tick_ms);
        self.publish_ui();
    }

    pub fn toggle_pause(&mut self) {
        match self.state.mode() {
            EngineMode::Running => self.pause(),
            EngineMode::Paused => self.resume(),
            EngineMode::Idle => {}
        }
    }

    pub fn queue_direction(&mut self, dir: Direction) {
        let human = &mut self.state.human;
        if human.len() > 1 && dir == human.dir.opposite() {
            return;
        }
        human.next_dir = dir;
        if self.state.mode() == EngineMode::Idle {
            self.start();
        }
    }

    pub fn tick(&mut self) -> Vec<GameEvent> {
        if self.state.mode() != EngineMode::Running {
            return Vec::new();
        }
        self.tick_counter += 1;
        self.clock_ms = self.clock_ms.saturating_add(self.current_tick_ms);
        let prev = &self.state;

        let human_dir = prev.human.next_dir;
        let agent_choice = choose_direction(prev, &self.config, &mut self.rng);

        let agent_moves = self.advance_move_buffer();

        let plans = PerSide::new(
            self.plan_move(Side::Human, Some(human_dir)),
            self.plan_move(Side::Agent, agent_moves.then_some(agent_choice)),
        );
        let fates = self.resolve_fates(&plans);

        let mut next = self.state.clone();
        let mut food_eaten = false;

        for side in SIDES {
            let plan = plans.get(side);
            match fates.get(side) {
                Fate::Shielded => {
                    next.snake_mut(side).shield = 0;
                    self.events.push(GameEvent::ShieldBreak {
                        x: plan.head.x,
                        y: plan.head.y,
                        side,
                    });
                }
                Fate::Alive => {
                    let snake = next.snake_mut(side);
                    snake.body = plan.body.clone();
                    snake.dir = plan.dir;
                    if side == Side::Agent {
                        snake.next_dir = plan.dir;
                    }
                }
                Fate::Dead => {}
            }
        }

        for side in SIDES {
            if *fates.get(side) != Fate::Alive {
                continue;
            }
            let plan = plans.get(side);
            if let Some(food) = next.food.filter(|food| plan.eats_food && food.pos == plan.head) {
                next.food = None;
                food_eaten = true;
                let snake = next.snake_mut(side);
                let event = match food.kind {
                    FoodKind::Apple => {
                        snake.score += self.config.food_score;
                        GameEvent::Eat {
                            x: food.pos.x,
                            y: food.pos.y,
                            side,
                        }
                    }
                    FoodKind::Shield => {
                        snake.shield = 1;
                        GameEvent::Shield {
                            x: food.pos.x,
                            y: food.pos.y,
                            side,
                        }
                    }
                };
                self.events.push(event);
            }
            if let Some(bonus) = next
                .bonus
                .filter(|bonus| plan.eats_bonus && bonus.pos == plan.head)
            {
                next.bonus = None;
                next.snake_mut(side).score += self.config.bonus_score;
                if self.config.speed_boost_ms > 0 {
                    *next.boost_until_ms.get_mut(side) =
                        self.clock_ms.saturating_add(self.config.speed_boost_ms);
                }
                self.events.push(GameEvent::Bonus {
                    x: bonus.pos.x,
                    y: bonus.pos.y,
                    side,
                });
            }
            let score = next.snake(side).score;
            let best = self.best_scores.get_mut(side);
            *best = (*best).max(score);
        }

        if let Some(bonus) = next.bonus.as_mut() {
            bonus.ticks_left = bonus.ticks_left.saturating_sub(1);
            if bonus.ticks_left == 0 {
                next.bonus = None;
            }
        }

        if food_eaten || next.food.is_none() {
            self.spawn_consumables(&mut next, &fates, food_eaten);
        }

        self.respawn_dead(&mut next, &plans, &fates);

        self.state = next;
        let next_tick_ms = self.compute_tick_ms();
        if next_tick_ms != self.current_tick_ms {
            self.current_tick_ms = next_tick_ms;
            self.scheduler.schedule(next_tick_ms);
        }

        self.publish();
        let events = std::mem::take(&mut self.events);
        for event in &events {
            self.observer.on_event(event);
        }
        events
    }

    fn advance_move_buffer(&mut self) -> bool {
        self.agent_move_buffer += self.agent_move_step;
        if self.agent_move_buffer >= MOVE_UNITS {
            self.agent_move_buffer -= MOVE_UNITS;
            true
        } else {
            false
        }
    }

    fn plan_move(&self, side: Side, dir: Option<Direction>) -> MovePlan {
        let snake = self.state.snake(side);
        let Some(dir) = dir else {
            return MovePlan {
                moved: false,
                dir: snake.dir,
                head: snake.head(),
                body: snake.body.clone(),
                eats_food: false,
                eats_bonus: false,
            };
        };
        let head = next_head(&snake.body, dir, self.config.grid_size);
        let eats_food = self.state.food.is_some_and(|food| food.pos == head);
        let eats_bonus = self.state.bonus.is_some_and(|bonus| bonus.pos == head);
        MovePlan {
            moved: true,
            dir,
            head,
            body: advance_body(&snake.body, head, eats_food || eats_bonus),
            eats_food,
            eats_bonus,
        }
    }

    /// Head-on, self and cross collisions against the planned bodies, then
    /// shields. A shielded snake keeps its old body, so the other side's new
    /// head is checked against that body once more.
    fn resolve_fates(&self, plans: &PerSide<MovePlan>) -> PerSide<Fate> {
        let mut fates = PerSide::new(Fate::Alive, Fate::Alive);
        for side in SIDES {
            if self.is_lethal(side, plans) {
                *fates.get_mut(side) = self.fate_for_lethal(side);
            }
        }
        for side in SIDES {
            let other = side.other();
            let plan = plans.get(side);
            if *fates.get(side) == Fate::Alive
                && plan.moved
                && *fates.get(other) == Fate::Shielded
                && self.state.snake(other).contains(plan.head)
            {
                *fates.get_mut(side) = self.fate_for_lethal(side);
            }
        }
        fates
    }

    fn is_lethal(&self, side: Side, plans: &PerSide<MovePlan>) -> bool {
        let plan = plans.get(side);
        if !plan.moved {
            return false;
        }
        let other = plans.get(side.other());
        let head_on = other.moved && other.head == plan.head;
        let own_body = &self.state.snake(side).body;
        let hit_self = blocking_body(own_body, plan.grows()).contains(&plan.head);
        let hit_other = other.body.contains(&plan.head);
        head_on || hit_self || hit_other
    }

    fn fate_for_lethal(&self, side: Side) -> Fate {
        if self.state.snake(side).shield > 0 {
            Fate::Shielded
        } else {
            Fate::Dead
        }
    }

    fn spawn_consumables(&mut self, next: &mut GameState, fates: &PerSide<Fate>, food_eaten: bool) {
        let grid_size = self.config.grid_size;
        let mut occupied: HashSet<Vec2> = HashSet::new();
        for side in SIDES {
            if *fates.get(side) != Fate::Dead {
                occupied.extend(next.snake(side).body.iter().copied());
            }
        }
        if let Some(bonus) = next.bonus {
            occupied.insert(bonus.pos);
        }

        if next.food.is_none() {
            next.food = spawn_food(
                grid_size,
                &occupied,
                self.config.shield_food_chance,
                &mut self.rng,
            );
        }
        if let Some(food) = next.food {
            occupied.insert(food.pos);
        }

        if food_eaten && next.bonus.is_none() {
            next.bonus = maybe_spawn_bonus(
                grid_size,
                &occupied,
                self.config.bonus_spawn_chance,
                self.config.bonus_lifetime_ticks,
                &mut self.rng,
            );
        }
    }

    fn respawn_dead(
        &mut self,
        next: &mut GameState,
        plans: &PerSide<MovePlan>,
        fates: &PerSide<Fate>,
    ) {
        let human_dead = fates.human == Fate::Dead;
        let agent_dead = fates.agent == Fate::Dead;
        if !human_dead && !agent_dead {
            return;
        }

        for side in SIDES {
            if *fates.get(side) == Fate::Dead {
                let head = plans.get(side).head;
                self.events.push(GameEvent::Die {
                    x: head.x,
                    y: head.y,
                    side,
                });
            }
        }

        if human_dead != agent_dead {
            let winner = if human_dead { Side::Agent } else { Side::Human };
            *next.round_wins.get_mut(winner) += 1;
        }

        if human_dead && agent_dead && self.config.clear_bonus_on_double_death {
            next.bonus = None;
        }

        let mut occupied: HashSet<Vec2> = HashSet::new();
        if let Some(food) = next.food {
            occupied.insert(food.pos);
        }
        if let Some(bonus) = next.bonus {
            occupied.insert(bonus.pos);
        }
        for side in SIDES {
            if *fates.get(side) != Fate::Dead {
                occupied.extend(next.snake(side).body.iter().copied());
            }
        }

        for side in SIDES {
            if *fates.get(side) != Fate::Dead {
                continue;
            }
            let personality = next.snake(side).personality;
            let fresh = create_snake(&self.config, &mut occupied, personality, &mut self.rng);
            *next.snake_mut(side) = fresh;
            *next.boost_until_ms.get_mut(side) = 0;
            if side == Side::Agent {
                self.agent_move_buffer = 0;
            }
        }
    }

    fn compute_tick_ms(&self) -> u64 {
        let base = tick_ms_for_score(
            self.state.total_score(),
            self.config.base_tick_ms,
            self.config.speed_step_ms,
            self.config.min_tick_ms,
        );
        if self.state.boost_active(self.clock_ms) {
            ((base as f32 * self.config.speed_boost_multiplier).round() as u64).max(1)
        } else {
            base
        }
    }

    fn publish(&mut self) {
        let snapshot = self.snapshot();
        self.observer.on_snapshot(&snapshot);
        self.observer.on_ui_update(&snapshot, &self.best_scores);
    }

    fn publish_ui(&mut self) {
        let snapshot = self.snapshot();
        self.observer.on_ui_update(&snapshot, &self.best_scores);
    }
}

fn move_step(ratio: f32) -> u32 {
    (ratio.clamp(0.0, 1.0) as f64 * MOVE_UNITS as f64).round() as u32
}

fn create_snake<R>(
    config: &SimConfig,
    occupied: &mut HashSet<Vec2>,
    personality: Option<Personality>,
    rng: &mut R,
) -> SnakeView
where
    R: RandomSource + ?Sized,
{
    let placed = place_snake(
        config.grid_size,
        occupied,
        config.snake_length,
        config.placement_attempts,
        rng,
    );
    occupied.extend(placed.body.iter().copied());
    SnakeView {
        body: placed.body,
        dir: placed.dir,
        next_dir: placed.dir,
        score: 0,
        shield: 0,
        personality,
    }
}

fn new_board<R>(config: &SimConfig, rng: &mut R) -> GameState
where
    R: RandomSource + ?Sized,
{
    let mut occupied = HashSet::new();
    let human = create_snake(config, &mut occupied, None, rng);
    let agent = create_snake(config, &mut occupied, Some(config.personality), rng);
    let food = spawn_food(config.grid_size, &occupied, config.shield_food_chance, rng);
    GameState {
        human,
        agent,
        food,
        bonus: None,
        running: false,
        paused: false,
        round_wins: PerSide::default(),
        boost_until_ms: PerSide::default(),
    }
}
