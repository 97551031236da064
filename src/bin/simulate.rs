use chrono::{DateTime, SecondsFormat, Utc};
use clap::Parser;
use serde::Serialize;
use serde_json::{json, Value};
use snake_duel::config::{ConfigError, SimConfig};
use snake_duel::engine::GameEngine;
use snake_duel::grid::in_bounds;
use snake_duel::observer::NullObserver;
use snake_duel::policy::choose_direction;
use snake_duel::rng::Rng;
use snake_duel::scheduler::ManualScheduler;
use snake_duel::types::{GameEvent, PerSide, Personality, Side, Snapshot};
use std::collections::HashSet;
use std::io;
use std::path::Path;
use std::path::PathBuf;

const DEFAULT_TICKS: u64 = 3_000;
const AUTOPILOT_SEED_SALT: u32 = 0x9e37_79b9;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long)]
    single: bool,
    #[arg(long)]
    personality: Option<String>,
    #[arg(long)]
    ticks: Option<u64>,
    #[arg(long)]
    grid_size: Option<i32>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct Scenario {
    name: String,
    personality: Personality,
    ticks: u64,
    seed: u32,
}

#[derive(Clone, Debug, Default, Serialize)]
struct EventCounts {
    eats: u32,
    shields: u32,
    #[serde(rename = "shieldBreaks")]
    shield_breaks: u32,
    bonuses: u32,
    #[serde(rename = "humanDeaths")]
    human_deaths: u32,
    #[serde(rename = "agentDeaths")]
    agent_deaths: u32,
}

impl EventCounts {
    fn record(&mut self, event: &GameEvent) {
        match event {
            GameEvent::Eat { .. } => self.eats += 1,
            GameEvent::Shield { .. } => self.shields += 1,
            GameEvent::ShieldBreak { .. } => self.shield_breaks += 1,
            GameEvent::Bonus { .. } => self.bonuses += 1,
            GameEvent::Die {
                side: Side::Human, ..
            } => self.human_deaths += 1,
            GameEvent::Die {
                side: Side::Agent, ..
            } => self.agent_deaths += 1,
            GameEvent::Start => {}
        }
    }
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioResultLine {
    scenario: String,
    seed: u32,
    personality: Personality,
    ticks: u64,
    #[serde(rename = "durationMs")]
    duration_ms: u64,
    #[serde(rename = "roundWins")]
    round_wins: PerSide<u32>,
    #[serde(rename = "bestScores")]
    best_scores: PerSide<i32>,
    #[serde(rename = "finalTickMs")]
    final_tick_ms: u64,
    #[serde(flatten)]
    events: EventCounts,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug, Serialize)]
struct ScenarioRunResult {
    #[serde(flatten)]
    result: ScenarioResultLine,
    #[serde(rename = "anomalyRecords")]
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAt")]
    started_at: String,
    #[serde(rename = "finishedAt")]
    finished_at: String,
    #[serde(rename = "scenarioCount")]
    scenario_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "totalTicks")]
    total_ticks: u64,
    #[serde(rename = "roundWins")]
    round_wins: PerSide<u32>,
    scenarios: Vec<ScenarioResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    timestamp: String,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scenario: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

fn main() {
    let cli = Cli::parse();
    let started_at = Utc::now();
    let scenarios = resolve_scenarios(&cli);
    let seed_hint = scenarios.first().map(|scenario| scenario.seed).unwrap_or(0);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(seed_hint, started_at.timestamp_millis()));

    let config = match resolve_config(&cli) {
        Ok(config) => config,
        Err(error) => {
            emit_log(
                "error",
                "config_invalid",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": cli.config.as_ref().map(|path| path.to_string_lossy().to_string()),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
    };

    let mut has_anomaly = false;
    let mut scenario_results = Vec::new();
    let mut total_anomalies = 0usize;

    for scenario in scenarios {
        emit_log(
            "info",
            "scenario_started",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            None,
            json!({
                "personality": scenario.personality,
                "ticks": scenario.ticks,
                "gridSize": config.grid_size,
            }),
        );
        let scenario_run = match run_scenario(&scenario, &config) {
            Ok(run) => run,
            Err(error) => {
                emit_log(
                    "error",
                    "scenario_failed",
                    &run_id,
                    Some(&scenario.name),
                    Some(scenario.seed),
                    None,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &scenario_run.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(&scenario.name),
                Some(scenario.seed),
                Some(anomaly.tick),
                json!({
                    "message": anomaly.message,
                }),
            );
        }

        if !scenario_run.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += scenario_run.anomaly_records.len();

        emit_log(
            "info",
            "scenario_finished",
            &run_id,
            Some(&scenario.name),
            Some(scenario.seed),
            Some(scenario_run.result.ticks),
            json!({
                "roundWins": scenario_run.result.round_wins,
                "bestScores": scenario_run.result.best_scores,
                "durationMs": scenario_run.result.duration_ms,
                "anomalyCount": scenario_run.anomaly_records.len(),
            }),
        );

        println!(
            "{}",
            serde_json::to_string(&scenario_run.result).expect("scenario result should serialize")
        );
        scenario_results.push(scenario_run.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        started_at,
        Utc::now(),
        scenario_results,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "run_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "scenarioCount": summary.scenario_count,
            "anomalyCount": summary.anomaly_count,
            "totalTicks": summary.total_ticks,
            "roundWins": summary.round_wins,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn resolve_config(cli: &Cli) -> Result<SimConfig, ConfigError> {
    let mut config = match cli.config.as_deref() {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(grid_size) = cli.grid_size {
        config.grid_size = grid_size;
    }
    config.validate()?;
    Ok(config)
}

fn run_scenario(scenario: &Scenario, base: &SimConfig) -> Result<ScenarioRunResult, ConfigError> {
    let config = SimConfig {
        personality: scenario.personality,
        ..base.clone()
    };
    let grid_size = config.grid_size;
    let mut engine = GameEngine::with_seed(
        config,
        scenario.seed,
        Box::new(ManualScheduler::new()),
        Box::new(NullObserver),
    )?;
    let mut autopilot = Rng::new(scenario.seed ^ AUTOPILOT_SEED_SALT);

    let mut events = EventCounts::default();
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();

    engine.start();
    for _ in 0..scenario.ticks {
        let steer = choose_direction(&engine.state().mirrored(), engine.config(), &mut autopilot);
        engine.queue_direction(steer);
        for event in engine.tick() {
            events.record(&event);
        }
        let snapshot = engine.snapshot();
        for message in collect_snapshot_anomalies(&snapshot, grid_size) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                snapshot.tick,
                message,
            );
        }
    }

    Ok(ScenarioRunResult {
        result: ScenarioResultLine {
            scenario: scenario.name.clone(),
            seed: scenario.seed,
            personality: scenario.personality,
            ticks: engine.tick_count(),
            duration_ms: engine.clock_ms(),
            round_wins: engine.state().round_wins,
            best_scores: engine.best_scores(),
            final_tick_ms: engine.tick_ms(),
            events,
            anomalies,
        },
        anomaly_records,
    })
}

fn collect_snapshot_anomalies(snapshot: &Snapshot, grid_size: i32) -> Vec<String> {
    let mut anomalies = Vec::new();
    let state = &snapshot.state;
    for side in [Side::Human, Side::Agent] {
        let snake = state.snake(side);
        let label = side_key(side);
        if snake.is_empty() {
            anomalies.push(format!("{label} body is empty"));
        }
        let unique: HashSet<_> = snake.body.iter().collect();
        if unique.len() != snake.body.len() {
            anomalies.push(format!("{label} body overlaps itself"));
        }
        if let Some(cell) = snake.body.iter().find(|cell| !in_bounds(**cell, grid_size)) {
            anomalies.push(format!("{label} cell off grid: ({}, {})", cell.x, cell.y));
        }
        if snake.shield > 1 {
            anomalies.push(format!("{label} shield above one: {}", snake.shield));
        }
        if snake.score < 0 {
            anomalies.push(format!("{label} negative score: {}", snake.score));
        }
        if let Some(food) = state.food.filter(|food| snake.contains(food.pos)) {
            anomalies.push(format!(
                "food under {label} body: ({}, {})",
                food.pos.x, food.pos.y
            ));
        }
    }
    anomalies
}

fn resolve_scenarios(cli: &Cli) -> Vec<Scenario> {
    let seed = normalize_seed(cli.seed.unwrap_or_else(|| Utc::now().timestamp_millis() as u64));
    let ticks = cli.ticks.unwrap_or(DEFAULT_TICKS).clamp(1, 1_000_000);
    let personality = cli.personality.as_deref().and_then(Personality::parse);

    if cli.single || personality.is_some() {
        let personality = personality.unwrap_or_default();
        return vec![Scenario {
            name: format!("custom-{}", personality_key(personality)),
            personality,
            ticks,
            seed,
        }];
    }

    [
        Personality::Greedy,
        Personality::Aggressive,
        Personality::Cautious,
    ]
    .into_iter()
    .enumerate()
    .map(|(idx, personality)| Scenario {
        name: format!("duel-{}", personality_key(personality)),
        personality,
        ticks,
        seed: normalize_seed(seed as u64 + idx as u64),
    })
    .collect()
}

fn normalize_seed(seed: u64) -> u32 {
    seed as u32
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u32, timestamp_ms: i64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    scenarios: Vec<ScenarioResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let mut round_wins = PerSide::<u32>::default();
    let mut total_ticks = 0u64;
    for scenario in &scenarios {
        round_wins.human += scenario.round_wins.human;
        round_wins.agent += scenario.round_wins.agent;
        total_ticks += scenario.ticks;
    }
    RunSummary {
        run_id,
        started_at: started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        finished_at: finished_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        scenario_count: scenarios.len(),
        anomaly_count,
        total_ticks,
        round_wins,
        scenarios,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    scenario: Option<&str>,
    seed: Option<u32>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        scenario: scenario.map(|value| value.to_string()),
        seed,
        tick,
        details,
    };
    eprintln!(
        "{}",
        serde_json::to_string(&log_line).expect("structured log should serialize")
    );
}

fn side_key(side: Side) -> &'static str {
    match side {
        Side::Human => "human",
        Side::Agent => "agent",
    }
}

fn personality_key(personality: Personality) -> &'static str {
    match personality {
        Personality::Greedy => "greedy",
        Personality::Aggressive => "aggressive",
        Personality::Cautious => "cautious",
    }
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).expect("run summary should serialize");
    std::fs::write(path, summary_text)
}
