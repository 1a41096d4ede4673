//! Demo binary: generates a dungeon from command-line parameters and prints
//! the maze sketch plus a short tour of its contents.

use clap::Parser;
use log::info;
use warren::{Direction, Dungeon, DungeonConfig, Player, WarrenResult};

#[derive(Parser, Debug)]
#[command(author, version, about = "Grid-based dungeon crawl generator")]
struct Args {
    /// Number of grid rows
    #[arg(long, default_value_t = 6)]
    rows: usize,

    /// Number of grid columns
    #[arg(long, default_value_t = 6)]
    cols: usize,

    /// Extra edges beyond the spanning tree
    #[arg(short, long, default_value_t = 2)]
    interconnectivity: usize,

    /// Wrap border cells to the opposite edge
    #[arg(short, long)]
    wrapping: bool,

    /// Fraction of caves receiving treasure, in (0, 1]
    #[arg(short, long, default_value_t = 0.3)]
    treasure_pct: f64,

    /// Total number of stationary monsters
    #[arg(short, long, default_value_t = 2)]
    monsters: usize,

    /// Seed for deterministic generation
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn run(args: Args) -> WarrenResult<()> {
    let config = DungeonConfig {
        rows: args.rows,
        cols: args.cols,
        interconnectivity: args.interconnectivity,
        wrapping: args.wrapping,
        treasure_pct: args.treasure_pct,
        force_interconnectivity_range: false,
        monster_count: args.monsters,
    };

    let mut dungeon = Dungeon::with_seed(config, args.seed)?;
    info!("dungeon generated with seed {}", args.seed);

    println!("{}", dungeon);
    println!(
        "start: {}   end: {} (marked * and +)",
        dungeon.start_position(),
        dungeon.end_position()
    );
    println!("lurkers at: {:?}", dungeon.lurker_positions());
    for (pos, treasures) in dungeon.treasure_locations() {
        println!("treasure at {}: {:?}", pos, treasures);
    }
    for (pos, count) in dungeon.arrow_locations() {
        println!("{} arrows at {}", count, pos);
    }
    if let Some(pos) = dungeon.stalker_position() {
        println!("a stalker prowls from {}", pos);
    }
    if let Some(pos) = dungeon.thief_position() {
        println!("a thief hides at {}", pos);
    }
    if let Some(pos) = dungeon.pit_position() {
        println!("a bottomless pit yawns at {}", pos);
    }

    dungeon.enter_player(Player::new("wanderer")?)?;
    println!();
    println!("{}", dungeon.describe_current_room()?);

    // Take one step through the first open door, just to show the loop.
    let dir = dungeon
        .player_node()?
        .open_directions()
        .first()
        .copied()
        .unwrap_or(Direction::North);
    let outcome = dungeon.move_player(dir)?;
    println!();
    println!("you walk {} to {}", dir, outcome.position);
    if outcome.player_died {
        println!("chomp! a lurker was waiting for you");
    } else {
        println!("{}", dungeon.describe_current_room()?);
    }

    Ok(())
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
