use std::path::PathBuf;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use clap::Parser;
use serde_json::{json, Value};
use snake_duel::config::{ConfigError, SimConfig};
use snake_duel::engine::GameEngine;
use snake_duel::observer::GameObserver;
use snake_duel::rng::Rng;
use snake_duel::scheduler::IntervalScheduler;
use snake_duel::types::{Direction, EngineMode, GameEvent, PerSide, Personality, Snapshot};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    seed: Option<u32>,
    #[arg(long)]
    personality: Option<String>,
    #[arg(long)]
    grid_size: Option<i32>,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    Turn(Direction),
    Start,
    TogglePause,
    Restart,
    Quit,
}

type SharedEngine = Arc<Mutex<GameEngine>>;

#[derive(Debug, Default)]
struct JsonLinesObserver {
    last_ui: Option<(EngineMode, PerSide<i32>)>,
}

impl GameObserver for JsonLinesObserver {
    fn on_snapshot(&mut self, snapshot: &Snapshot) {
        print_line(json!({ "type": "state", "snapshot": snapshot }));
    }

    fn on_ui_update(&mut self, snapshot: &Snapshot, best: &PerSide<i32>) {
        let current = (snapshot.mode, *best);
        if self.last_ui == Some(current) {
            return;
        }
        self.last_ui = Some(current);
        print_line(json!({
            "type": "ui",
            "status": snapshot.mode.status_label(),
            "best": best,
            "roundWins": snapshot.state.round_wins,
        }));
    }

    fn on_event(&mut self, event: &GameEvent) {
        print_line(json!({ "type": "event", "event": event }));
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(error) => {
            emit_log("error", "config_invalid", json!({ "error": error.to_string() }));
            std::process::exit(2);
        }
    };
    let rng = match cli.seed {
        Some(seed) => Rng::new(seed),
        None => Rng::from_entropy(),
    };

    let (scheduler, timer) = IntervalScheduler::new();
    let engine = match GameEngine::new(
        config,
        rng,
        Box::new(scheduler),
        Box::new(JsonLinesObserver::default()),
    ) {
        Ok(engine) => engine,
        Err(error) => {
            emit_log("error", "engine_init_failed", json!({ "error": error.to_string() }));
            std::process::exit(2);
        }
    };
    let engine: SharedEngine = Arc::new(Mutex::new(engine));

    let ticking = engine.clone();
    let timer_task = tokio::spawn(timer.run(move || {
        let engine = ticking.clone();
        async move {
            engine.lock().await.tick();
        }
    }));

    emit_log(
        "info",
        "duel_started",
        json!({
            "seed": cli.seed,
            "personality": engine.lock().await.config().personality,
        }),
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(error) => {
                emit_log("error", "stdin_read_failed", json!({ "error": error.to_string() }));
                break;
            }
        };
        let Some(command) = parse_command(&line) else {
            emit_log("warn", "command_ignored", json!({ "input": line }));
            continue;
        };
        if command == Command::Quit {
            break;
        }
        apply_command(&mut *engine.lock().await, command);
    }

    let (tick_count, round_wins) = {
        let mut engine = engine.lock().await;
        engine.pause();
        (engine.tick_count(), engine.state().round_wins)
    };
    timer_task.abort();
    emit_log(
        "info",
        "duel_finished",
        json!({
            "ticks": tick_count,
            "roundWins": round_wins,
        }),
    );
}

fn resolve_config(cli: &Cli) -> Result<SimConfig, ConfigError> {
    let mut config = match cli.config.as_deref() {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(grid_size) = cli.grid_size {
        config.grid_size = grid_size;
    }
    if let Some(personality) = cli.personality.as_deref().and_then(Personality::parse) {
        config.personality = personality;
    }
    config.validate()?;
    Ok(config)
}

fn parse_command(line: &str) -> Option<Command> {
    let input = line.trim().to_ascii_lowercase();
    let command = match input.as_str() {
        "" | "enter" | "start" => Command::Start,
        "p" | "pause" | "space" => Command::TogglePause,
        "r" | "restart" => Command::Restart,
        "q" | "quit" | "exit" => Command::Quit,
        "w" => Command::Turn(Direction::Up),
        "s" => Command::Turn(Direction::Down),
        "a" => Command::Turn(Direction::Left),
        "d" => Command::Turn(Direction::Right),
        other => Command::Turn(Direction::parse_move(other)?),
    };
    Some(command)
}

fn apply_command(engine: &mut GameEngine, command: Command) {
    match command {
        Command::Turn(dir) => engine.queue_direction(dir),
        Command::Start => engine.start(),
        Command::TogglePause => engine.toggle_pause(),
        Command::Restart => engine.restart(),
        Command::Quit => {}
    }
}

fn print_line(value: Value) {
    println!("{value}");
}

fn emit_log(level: &str, event: &str, details: Value) {
    let line = json!({
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "level": level,
        "event": event,
        "details": details,
    });
    eprintln!("{line}");
}
