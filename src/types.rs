use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: i32,
    pub y: i32,
}

impl Vec2 {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Enumeration order used wherever directions are scanned. The opponent
    /// policy breaks score ties in favor of the earliest entry.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn delta(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0, -1),
            Direction::Down => Vec2::new(0, 1),
            Direction::Left => Vec2::new(-1, 0),
            Direction::Right => Vec2::new(1, 0),
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Human,
    Agent,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::Human => Side::Agent,
            Side::Agent => Side::Human,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerSide<T> {
    pub human: T,
    pub agent: T,
}

impl<T> PerSide<T> {
    pub fn new(human: T, agent: T) -> Self {
        Self { human, agent }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Human => &self.human,
            Side::Agent => &self.agent,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Human => &mut self.human,
            Side::Agent => &mut self.agent,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    #[default]
    Greedy,
    Aggressive,
    Cautious,
}

impl Personality {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "greedy" => Some(Self::Greedy),
            "aggressive" => Some(Self::Aggressive),
            "cautious" => Some(Self::Cautious),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoodKind {
    Apple,
    Shield,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Food {
    pub pos: Vec2,
    pub kind: FoodKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BonusItem {
    pub pos: Vec2,
    #[serde(rename = "ticksLeft")]
    pub ticks_left: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SnakeView {
    pub body: Vec<Vec2>,
    pub dir: Direction,
    #[serde(rename = "nextDir")]
    pub next_dir: Direction,
    pub score: i32,
    pub shield: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality: Option<Personality>,
}

impl SnakeView {
    pub fn head(&self) -> Vec2 {
        self.body[0]
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        self.body.contains(&pos)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineMode {
    Idle,
    Running,
    Paused,
}

impl EngineMode {
    pub fn status_label(self) -> &'static str {
        match self {
            EngineMode::Idle => "Press Enter to start",
            EngineMode::Running => "Running",
            EngineMode::Paused => "Paused",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameState {
    pub human: SnakeView,
    pub agent: SnakeView,
    pub food: Option<Food>,
    pub bonus: Option<BonusItem>,
    pub running: bool,
    pub paused: bool,
    #[serde(rename = "roundWins")]
    pub round_wins: PerSide<u32>,
    #[serde(rename = "boostUntilMs")]
    pub boost_until_ms: PerSide<u64>,
}

impl GameState {
    pub fn mode(&self) -> EngineMode {
        match (self.running, self.paused) {
            (false, _) => EngineMode::Idle,
            (true, false) => EngineMode::Running,
            (true, true) => EngineMode::Paused,
        }
    }

    pub fn snake(&self, side: Side) -> &SnakeView {
        match side {
            Side::Human => &self.human,
            Side::Agent => &self.agent,
        }
    }

    pub fn snake_mut(&mut self, side: Side) -> &mut SnakeView {
        match side {
            Side::Human => &mut self.human,
            Side::Agent => &mut self.agent,
        }
    }

    pub fn total_score(&self) -> i32 {
        self.human.score + self.agent.score
    }

    pub fn boost_active(&self, now_ms: u64) -> bool {
        now_ms < self.boost_until_ms.human || now_ms < self.boost_until_ms.agent
    }

    pub fn mirrored(&self) -> Self {
        Self {
            human: self.agent.clone(),
            agent: self.human.clone(),
            round_wins: PerSide::new(self.round_wins.agent, self.round_wins.human),
            boost_until_ms: PerSide::new(self.boost_until_ms.agent, self.boost_until_ms.human),
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "clockMs")]
    pub clock_ms: u64,
    #[serde(rename = "tickMs")]
    pub tick_ms: u64,
    pub mode: EngineMode,
    pub state: GameState,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum GameEvent {
    Start,
    Eat { x: i32, y: i32, side: Side },
    Bonus { x: i32, y: i32, side: Side },
    Shield { x: i32, y: i32, side: Side },
    ShieldBreak { x: i32, y: i32, side: Side },
    Die { x: i32, y: i32, side: Side },
}

impl GameEvent {
    pub fn cell(&self) -> Option<Vec2> {
        match *self {
            GameEvent::Start => None,
            GameEvent::Eat { x, y, .. }
            | GameEvent::Bonus { x, y, .. }
            | GameEvent::Shield { x, y, .. }
            | GameEvent::ShieldBreak { x, y, .. }
            | GameEvent::Die { x, y, .. } => Some(Vec2::new(x, y)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution_and_cancels_delta() {
        for dir in Direction::ALL {
            assert_eq!(dir.opposite().opposite(), dir);
            let a = dir.delta();
            let b = dir.opposite().delta();
            assert_eq!((a.x + b.x, a.y + b.y), (0, 0));
        }
    }

    #[test]
    fn parse_move_rejects_unknown_values() {
        assert_eq!(Direction::parse_move("left"), Some(Direction::Left));
        assert_eq!(Direction::parse_move("none"), None);
        assert_eq!(Personality::parse("cautious"), Some(Personality::Cautious));
        assert_eq!(Personality::parse("timid"), None);
    }

    #[test]
    fn events_serialize_with_kebab_case_tags() {
        let event = GameEvent::ShieldBreak {
            x: 3,
            y: 4,
            side: Side::Agent,
        };
        let json = serde_json::to_value(event).expect("event should serialize");
        assert_eq!(json["type"], "shield-break");
        assert_eq!(json["side"], "agent");
        assert_eq!(event.cell(), Some(Vec2::new(3, 4)));
        assert_eq!(GameEvent::Start.cell(), None);
        assert_eq!(
            serde_json::to_value(GameEvent::Start).expect("start should serialize")["type"],
            "start"
        );
    }

    #[test]
    fn mode_follows_running_and_paused_flags() {
        assert_eq!(EngineMode::Idle.status_label(), "Press Enter to start");
        assert_eq!(EngineMode::Paused.status_label(), "Paused");
    }
}
