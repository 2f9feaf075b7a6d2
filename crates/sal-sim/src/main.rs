use std::error::Error;

use clap::{Parser, Subcommand};

use commands::place::{self, PlaceArgs};
use commands::sample::{self, SampleArgs};

mod commands;
mod spec;

#[derive(Parser, Debug)]
#[command(name = "sal-sim", about = "Sensor active-learning simulation CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Greedily place sensors on a simulated field and record each pick.
    Place(PlaceArgs),
    /// Draw autoregressive field samples and dump them as JSON.
    Sample(SampleArgs),
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Place(args) => place::run(&args),
        Command::Sample(args) => sample::run(&args),
    }
}
