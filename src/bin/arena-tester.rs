//! Arena Tester CLI Tool
//!
//! Command-line tool for exercising the matchmaking and rating engine
//! in-process, without the API layer in front of it.
//!
//! Usage:
//!   cargo run --bin arena-tester -- --help
//!   cargo run --bin arena-tester duel --player-a alice --player-b bob --winner alice
//!   cargo run --bin arena-tester ladder --players 8 --rounds 3
//!   cargo run --bin arena-tester spectate --watchers 3

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use duel_arena::config::AppConfig;
use duel_arena::matches::MatchLifecycle;
use duel_arena::metrics::MetricsCollector;
use duel_arena::queue::QueueManager;
use duel_arena::ranking::RankingService;
use duel_arena::rating::EloCalculator;
use duel_arena::season::{Season, StaticSeasonProvider};
use duel_arena::spectate::SpectatorRegistry;
use duel_arena::storage::{InMemoryMatchStore, InMemoryRankingStore, InMemorySpectatorStore};
use duel_arena::types::{JoinQueueOutcome, MatchType, SpectateOutcome};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "arena-tester")]
#[command(about = "Scenario driver for the duel-arena matchmaking and rating engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Match type to queue for (arena or duel)
    #[arg(long, default_value = "arena")]
    match_type: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one full match between two players
    Duel {
        /// First player id
        #[arg(long, default_value = "alice")]
        player_a: String,
        /// Second player id
        #[arg(long, default_value = "bob")]
        player_b: String,
        /// Winner id (omit for a draw)
        #[arg(long)]
        winner: Option<String>,
    },
    /// Run repeated rounds of matchmaking across a pool of players
    Ladder {
        /// Number of players in the pool
        #[arg(long, default_value = "8")]
        players: usize,
        /// Number of rounds to play
        #[arg(long, default_value = "3")]
        rounds: usize,
    },
    /// Exercise the spectator flow on a running match
    Spectate {
        /// Number of spectators to attach
        #[arg(long, default_value = "3")]
        watchers: usize,
    },
}

/// In-process engine wiring, mirroring the production AppState
struct Engine {
    queue: Arc<QueueManager>,
    lifecycle: Arc<MatchLifecycle>,
    spectators: Arc<SpectatorRegistry>,
    rankings: Arc<RankingService>,
}

impl Engine {
    fn new(config: &AppConfig) -> Result<Self> {
        let metrics = Arc::new(MetricsCollector::new()?);
        let calculator = EloCalculator::new(config.rating.clone())?;
        let season_provider = Arc::new(StaticSeasonProvider::new(Season::starting_now(
            config.matchmaking.season_name.clone(),
        )));

        let ranking_store = Arc::new(InMemoryRankingStore::new());
        let match_store = Arc::new(InMemoryMatchStore::new());

        let lifecycle = Arc::new(MatchLifecycle::new(
            match_store.clone(),
            ranking_store.clone(),
            calculator,
            metrics.clone(),
        ));
        let queue = Arc::new(QueueManager::new(
            season_provider.clone(),
            lifecycle.clone(),
            config.matchmaking.clone(),
            metrics.clone(),
        ));
        let spectators = Arc::new(SpectatorRegistry::new(
            Arc::new(InMemorySpectatorStore::new()),
            match_store,
            metrics,
        ));
        let rankings = Arc::new(RankingService::new(
            ranking_store,
            season_provider,
            config.rating.clone(),
        ));

        Ok(Self {
            queue,
            lifecycle,
            spectators,
            rankings,
        })
    }
}

fn parse_match_type(value: &str) -> Result<MatchType> {
    match value.to_lowercase().as_str() {
        "arena" => Ok(MatchType::Arena),
        "duel" => Ok(MatchType::Duel),
        _ => Err(anyhow!("Invalid match type. Use 'arena' or 'duel'")),
    }
}

/// Queue both players and return the created match id
async fn pair_players(
    engine: &Engine,
    player_a: &str,
    player_b: &str,
    match_type: MatchType,
) -> Result<uuid::Uuid> {
    let first = engine
        .queue
        .join_queue(player_a.to_string(), match_type, None)
        .await?;
    println!("  {} -> {:?}", player_a, first);

    let second = engine
        .queue
        .join_queue(player_b.to_string(), match_type, None)
        .await?;
    println!("  {} -> {:?}", player_b, second);

    match second {
        JoinQueueOutcome::Matched { match_id, .. } => Ok(match_id),
        other => Err(anyhow!("Expected a match, got {other:?}")),
    }
}

async fn run_duel(
    engine: &Engine,
    player_a: String,
    player_b: String,
    winner: Option<String>,
    match_type: MatchType,
) -> Result<()> {
    println!("⚔️  Pairing {player_a} vs {player_b}");
    let match_id = pair_players(engine, &player_a, &player_b, match_type).await?;

    engine.lifecycle.start_match(match_id).await?;
    println!("  match {match_id} started");

    let summary = engine
        .lifecycle
        .submit_result(match_id, winner, 3, 1, 24, 22)
        .await?;

    println!(
        "  finished in {}s, winner: {}",
        summary.duration_seconds,
        summary.winner_id.as_deref().unwrap_or("draw")
    );
    let a = &summary.rating_changes.player_a;
    let b = &summary.rating_changes.player_b;
    println!("  {}: {} -> {} ({:+})", a.player_id, a.old_rating, a.new_rating, a.delta);
    println!("  {}: {} -> {} ({:+})", b.player_id, b.old_rating, b.new_rating, b.delta);

    Ok(())
}

async fn run_ladder(engine: &Engine, players: usize, rounds: usize, match_type: MatchType) -> Result<()> {
    if players < 2 || players % 2 != 0 {
        return Err(anyhow!("Ladder needs an even number of players (>= 2)"));
    }

    println!("🏆 Running {rounds} rounds with {players} players");

    for round in 1..=rounds {
        println!("Round {round}:");
        for pair in 0..players / 2 {
            let a = format!("player-{}", pair * 2);
            let b = format!("player-{}", pair * 2 + 1);
            let match_id = pair_players(engine, &a, &b, match_type).await?;
            engine.lifecycle.start_match(match_id).await?;

            // Lower-numbered player wins every round, so streaks build up
            let summary = engine
                .lifecycle
                .submit_result(match_id, Some(a.clone()), 2, 0, 10, 10)
                .await?;
            println!(
                "  {a} beat {b} ({:+}/{:+})",
                summary.rating_changes.player_a.delta, summary.rating_changes.player_b.delta
            );
        }
    }

    println!("Final standings:");
    let board = engine.rankings.get_ranking_list(None, players, 0).await?;
    for row in board {
        println!(
            "  #{} {} rating={} (peak {}) {}W/{}L streak={}",
            row.rank,
            row.player_id,
            row.rating,
            row.max_rating,
            row.matches_won,
            row.matches_lost,
            row.current_streak
        );
    }

    Ok(())
}

async fn run_spectate(engine: &Engine, watchers: usize, match_type: MatchType) -> Result<()> {
    println!("👀 Spectator scenario with {watchers} watchers");
    let match_id = pair_players(engine, "alice", "bob", match_type).await?;
    engine.lifecycle.start_match(match_id).await?;

    let mut first_id = None;
    for i in 0..watchers {
        let outcome = engine
            .spectators
            .join_spectate(match_id, format!("watcher-{i}"))
            .await?;
        if let SpectateOutcome::Joined { spectator_id } = outcome {
            println!("  watcher-{i} joined as {spectator_id}");
            first_id.get_or_insert(spectator_id);
        }
    }

    let active = engine.spectators.list_spectators(match_id).await?;
    println!("  {} active spectators", active.len());

    if let Some(spectator_id) = first_id {
        engine.spectators.leave_spectate(spectator_id).await?;
        let active = engine.spectators.list_spectators(match_id).await?;
        println!("  after one leave: {} active spectators", active.len());
    }

    let m = engine.lifecycle.get_match(match_id).await?;
    println!("  match spectator_count = {}", m.spectator_count);

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let match_type = parse_match_type(&cli.match_type)?;

    let config = AppConfig::from_env()?;
    let engine = Engine::new(&config)?;

    match cli.command {
        Commands::Duel {
            player_a,
            player_b,
            winner,
        } => run_duel(&engine, player_a, player_b, winner, match_type).await?,
        Commands::Ladder { players, rounds } => {
            run_ladder(&engine, players, rounds, match_type).await?
        }
        Commands::Spectate { watchers } => run_spectate(&engine, watchers, match_type).await?,
    }

    println!("✅ Scenario completed");
    Ok(())
}
