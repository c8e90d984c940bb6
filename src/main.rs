use anyhow::Result;
use aquarium_sim::app;
use clap::Parser;

fn main() -> Result<()> {
    app::run(app::Args::parse())
}
