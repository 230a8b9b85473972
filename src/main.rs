//! Adrenaline engine - command line driver
//!
//! Plays bot matches on the engine, one at a time or in parallel batches.

use adrenaline_engine::{
    bots::BotKind,
    core::CardCatalog,
    game::{MatchConfig, MatchResult, VerbosityLevel},
    simulate::{play_bot_match, run_simulation, SimulationConfig},
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

/// Verbosity level for match output (custom parser supporting both names and numbers)
#[derive(Debug, Clone, Copy)]
struct VerbosityArg(VerbosityLevel);

impl std::str::FromStr for VerbosityArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "silent" | "0" => Ok(VerbosityArg(VerbosityLevel::Silent)),
            "minimal" | "1" => Ok(VerbosityArg(VerbosityLevel::Minimal)),
            "normal" | "2" => Ok(VerbosityArg(VerbosityLevel::Normal)),
            "verbose" | "3" => Ok(VerbosityArg(VerbosityLevel::Verbose)),
            _ => Err(format!(
                "invalid verbosity level '{s}' (expected: silent/0, minimal/1, normal/2, verbose/3)"
            )),
        }
    }
}

/// Settings shared by every subcommand
#[derive(clap::Args, Debug, Clone)]
struct MatchArgs {
    /// Number of seats
    #[arg(long, short = 'p', default_value_t = 3)]
    players: usize,

    /// Bot driving every seat
    #[arg(long, value_enum, default_value = "random")]
    bot: BotKind,

    /// Stock board layout (1 or 2)
    #[arg(long, default_value_t = 1)]
    board: u8,

    /// Skulls on the kill track (5-8)
    #[arg(long, default_value_t = 8)]
    skulls: u8,

    /// End a match after this many turns
    #[arg(long, default_value_t = 200)]
    max_turns: u32,

    /// Seed for card shuffles and bot choices
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

impl MatchArgs {
    fn config(&self, verbosity: VerbosityLevel) -> MatchConfig {
        MatchConfig::default()
            .with_board(self.board)
            .with_skulls(self.skulls)
            .with_max_turns(self.max_turns)
            .with_seed(self.seed)
            .with_verbosity(verbosity)
    }
}

#[derive(Parser)]
#[command(name = "adrenaline")]
#[command(about = "Adrenaline match engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one bot match and print its log
    Play {
        #[command(flatten)]
        args: MatchArgs,

        /// Verbosity level for match output (0=silent, 1=minimal, 2=normal, 3=verbose)
        #[arg(long, default_value = "normal", short = 'v')]
        verbosity: VerbosityArg,
    },

    /// Run many bot matches in parallel and report statistics
    Simulate {
        #[command(flatten)]
        args: MatchArgs,

        /// Number of matches
        #[arg(long, short = 'm', default_value_t = 100)]
        matches: usize,

        /// Stop starting matches after this many seconds
        #[arg(long)]
        seconds: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play { args, verbosity } => run_play(&args, verbosity.0)?,
        Commands::Simulate {
            args,
            matches,
            seconds,
        } => run_simulate(&args, matches, seconds)?,
    }

    Ok(())
}

fn run_play(args: &MatchArgs, verbosity: VerbosityLevel) -> anyhow::Result<()> {
    let catalog = Arc::new(CardCatalog::standard().context("loading the card catalog")?);
    let config = args.config(verbosity);
    let result =
        play_bot_match(catalog, config, args.players, args.bot).context("running the match")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }
    Ok(())
}

fn print_result(result: &MatchResult) {
    println!("\n=== Match Over ===");
    println!("Turns played: {}", result.turns_played);
    println!("End reason: {:?}", result.end_reason);
    for (rank, standing) in result.standings.iter().enumerate() {
        println!(
            "  {}. {} ({}) {} points, {} kills, {} overkills",
            rank + 1,
            standing.name,
            standing.player,
            standing.score,
            standing.kills,
            standing.overkills
        );
    }
}

fn run_simulate(args: &MatchArgs, matches: usize, seconds: Option<u64>) -> anyhow::Result<()> {
    let config = SimulationConfig {
        matches,
        deadline: seconds.map(Duration::from_secs),
        players: args.players,
        bot: args.bot,
        match_config: args.config(VerbosityLevel::Silent),
    };
    if !args.json {
        println!("=== Adrenaline - Simulation ===\n");
        println!(
            "Running {} matches: {} {:?} bots, board {}, {} skulls, seed {}",
            matches, args.players, args.bot, args.board, args.skulls, args.seed
        );
    }

    let report = run_simulation(&config).context("running the simulation")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("\nMatches played: {} ({} failed)", report.matches, report.failed);
    println!("Completed with frenzy: {}", report.completed());
    println!("Average turns: {:.1}", report.average_turns());
    for (seat, wins) in report.wins.iter().enumerate() {
        let share = if report.matches == 0 {
            0.0
        } else {
            *wins as f64 * 100.0 / report.matches as f64
        };
        println!("  P{}: {} wins ({:.1}%)", seat, wins, share);
    }
    println!(
        "Elapsed: {:.2}s",
        Duration::from_millis(report.elapsed_ms as u64).as_secs_f64()
    );
    Ok(())
}
