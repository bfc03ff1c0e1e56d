//! Console front-end for the Connect Four engine.
//!
//! ## Usage
//!
//! - `connect4` - Play against the engine
//! - `connect4 play --engine-first` - Play, letting the engine open
//! - `connect4 demo` - Watch the engine play itself

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use connect4::{BoardGeometry, Engine, GameState, Mask, Outcome, Player};

/// Connect Four: alpha-beta search engine with a console board
#[derive(Parser)]
#[command(name = "connect4")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Board rows (4-8)
    #[arg(long, default_value_t = 6)]
    rows: usize,

    /// Board columns (4-8)
    #[arg(long, default_value_t = 7)]
    cols: usize,

    /// Engine strength in rounds of lookahead
    #[arg(long, default_value_t = 4)]
    strength: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play against the engine on the console
    Play {
        /// Let the engine make the first move
        #[arg(long)]
        engine_first: bool,
    },
    /// Watch the engine play both sides
    Demo,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let geometry =
        BoardGeometry::new(cli.rows, cli.cols).context("unsupported board size")?;

    match cli.command {
        Some(Commands::Demo) => run_demo(geometry, cli.strength),
        Some(Commands::Play { engine_first }) => run_play(geometry, cli.strength, engine_first),
        None => run_play(geometry, cli.strength, false),
    }
}

fn run_play(geometry: BoardGeometry, strength: u8, engine_first: bool) -> Result<()> {
    let human = if engine_first {
        Player::Black
    } else {
        Player::White
    };
    println!(
        "You play {} ({}), the engine plays {} ({}).",
        human,
        human.symbol(),
        human.opponent(),
        human.opponent().symbol()
    );

    let mut engine = Engine::new(geometry);
    let mut state = GameState::EMPTY;
    let stdin = io::stdin();
    let mut input = stdin.lock();

    loop {
        println!("{}", state.render(engine.geometry()));

        let mov = if state.to_move() == human {
            prompt_column(&mut input, engine.geometry(), state)?
        } else {
            let result = engine.propose_move_with_stats(state, strength);
            let Some(mov) = result.best_move else {
                bail!("engine found no legal move");
            };
            println!(
                "Engine drops in column {} ({} nodes, {} ms).",
                engine.geometry().column_of(mov),
                result.nodes,
                result.time_ms
            );
            mov
        };

        state = state.apply_move(mov);
        match state.outcome_after(engine.geometry(), mov) {
            Outcome::NotFinished => {}
            Outcome::Drawn => {
                println!("{}", state.render(engine.geometry()));
                println!("Draw.");
                return Ok(());
            }
            Outcome::Won { winner, .. } => {
                println!("{}", state.render(engine.geometry()));
                if winner == human {
                    println!("{winner} wins - congratulations!");
                } else {
                    println!("{winner} wins.");
                }
                return Ok(());
            }
        }
    }
}

/// Ask for a column until the input names one that exists and has room.
fn prompt_column(
    input: &mut impl BufRead,
    geometry: &BoardGeometry,
    state: GameState,
) -> Result<Mask> {
    loop {
        print!("Your column (0-{}): ", geometry.cols() - 1);
        io::stdout().flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("input closed");
        }
        let entry = line.trim();

        let Ok(col) = entry.parse::<usize>() else {
            println!("'{entry}' is not a column number.");
            continue;
        };
        if col >= geometry.cols() {
            println!("Column {col} is off the board.");
            continue;
        }
        match state.lowest_free_square(geometry, col) {
            Some(square) => return Ok(Mask::single(square)),
            None => println!("Column {col} is full."),
        }
    }
}

fn run_demo(geometry: BoardGeometry, strength: u8) -> Result<()> {
    let mut engine = Engine::new(geometry);
    let mut state = GameState::EMPTY;

    loop {
        let mover = state.to_move();
        let result = engine.propose_move_with_stats(state, strength);
        let Some(mov) = result.best_move else {
            bail!("no legal move in an undecided position");
        };
        println!(
            "{} plays column {} (value {}, depth {}, {} nodes, {} ms)",
            mover,
            engine.geometry().column_of(mov),
            result.value,
            result.depth,
            result.nodes,
            result.time_ms
        );

        state = state.apply_move(mov);
        match state.outcome_after(engine.geometry(), mov) {
            Outcome::NotFinished => {}
            Outcome::Drawn => {
                println!("{}", state.render(engine.geometry()));
                println!("Draw.");
                return Ok(());
            }
            Outcome::Won { winner, .. } => {
                println!("{}", state.render(engine.geometry()));
                println!("{winner} wins.");
                return Ok(());
            }
        }
    }
}
