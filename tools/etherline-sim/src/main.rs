//! Parallel seeded-battle simulation harness.
//!
//! Runs a batch of independent battles (one per seed) to completion, each
//! battle an isolated owned value, fanned out across a `rayon` thread pool.
//! For every seed it drives two fresh battles from scratch and asserts their
//! event logs are byte-identical, and that no `AnomalyDetected` event was
//! ever logged, i.e. the engine never had to self-heal during the run.
//!
//! `RUST_LOG=debug cargo run -p etherline-sim -- --seeds 200` installs a
//! `tracing_subscriber::fmt` subscriber; the library crates themselves never
//! install one — they stay silent by default regardless of the host.

use std::process::ExitCode;

use etherline_engine::battle::StepOutcome;
use etherline_engine::Battle;
use etherline_types::{CardId, EncounterSpec, EnemyId, Event};
use rayon::prelude::*;

/// One seed's outcome: whether the battle reached a terminal phase cleanly,
/// how many turns it took, and whether any self-healing anomaly fired.
#[derive(Debug)]
struct SeedReport {
    seed: u32,
    turns: u32,
    player_won: bool,
    anomalies_logged: usize,
    replay_matched: bool,
}

fn default_spec(seed: u32) -> EncounterSpec {
    EncounterSpec {
        seed,
        player_max_hp: 50,
        player_deck: vec![
            CardId::from("strike"),
            CardId::from("strike"),
            CardId::from("strike"),
            CardId::from("guard"),
            CardId::from("guard"),
            CardId::from("flurry"),
            CardId::from("weakening_strike"),
            CardId::from("opening_gambit"),
        ],
        enemies: vec![EnemyId::from("grunt")],
        anomalies: vec![],
        player_strength: 0,
        player_agility: 0,
        player_insight: 0,
    }
}

/// Drives one battle to a terminal phase, auto-selecting the first `hand`
/// card each turn and skipping every sub-selection's first option — enough
/// to exercise the full state machine without a real player.
fn run_to_completion(spec: EncounterSpec) -> (Vec<Event>, u32, bool) {
    let mut battle = Battle::new(spec).expect("built-in catalog is self-consistent");
    let mut turns = 0u32;
    let player_won = loop {
        if battle.state().hand.is_empty() {
            break false;
        }
        let uid = battle.state().hand[0].uid;
        if battle.submit_selection(vec![uid]).is_err() {
            break false;
        }
        if battle.begin_resolve().is_err() {
            break false;
        }

        let won = loop {
            match battle.step_once() {
                Ok(StepOutcome::TurnComplete) => break None,
                Ok(StepOutcome::BattleOver { player_won }) => break Some(player_won),
                Ok(StepOutcome::AwaitingSelection(_)) => {
                    let _ = battle.resolve_breach(0);
                    let _ = battle.begin_resolve();
                }
                Ok(StepOutcome::CardResolved(_)) => continue,
                Err(_) => break Some(false),
            }
        };
        if let Some(player_won) = won {
            break player_won;
        }

        turns += 1;
        if battle.finish_turn().is_err() {
            break false;
        }
    };
    (battle.events_since(0).to_vec(), turns, player_won)
}

fn simulate_seed(seed: u32) -> SeedReport {
    let (events_a, turns, player_won) = run_to_completion(default_spec(seed));
    let (events_b, _, _) = run_to_completion(default_spec(seed));

    let anomalies_logged = events_a.iter().filter(|e| matches!(e, Event::AnomalyDetected { .. })).count();

    SeedReport { seed, turns, player_won, anomalies_logged, replay_matched: events_a == events_b }
}

fn parse_seed_count() -> u32 {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--seeds" {
            if let Some(value) = args.next() {
                if let Ok(n) = value.parse() {
                    return n;
                }
            }
        }
    }
    100
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let seed_count = parse_seed_count();
    tracing::info!(seed_count, "starting simulation batch");

    let reports: Vec<SeedReport> = (0..seed_count).into_par_iter().map(simulate_seed).collect();

    let mut wins = 0u32;
    let mut total_turns = 0u64;
    let mut replay_failures = 0u32;
    let mut anomaly_total = 0usize;

    for report in &reports {
        if report.player_won {
            wins += 1;
        }
        total_turns += report.turns as u64;
        anomaly_total += report.anomalies_logged;
        if !report.replay_matched {
            replay_failures += 1;
            tracing::error!(seed = report.seed, "replay mismatch: same seed produced divergent event logs");
        }
    }

    println!("ran {seed_count} seeded battles");
    println!(
        "player won {wins}/{seed_count} ({:.1}%), average {:.1} turns",
        100.0 * wins as f64 / seed_count as f64,
        total_turns as f64 / seed_count as f64
    );
    println!("self-healed anomalies logged across all seeds: {anomaly_total}");
    println!("replay mismatches: {replay_failures}");

    if replay_failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
