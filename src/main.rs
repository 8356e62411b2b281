mod config;
mod contact;
mod form;
mod roster;
mod search;
mod ui;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use roster::Roster;

#[derive(Parser, Debug)]
#[command(name = "rolo", about = "Terminal contact list manager")]
struct Cli {
    /// Path to the configuration file (defaults to the platform config dir)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;
    if let Some(path) = &config.config_path {
        println!("Loaded configuration from {}", path.display());
    }

    let mut roster = if config.seed_roster {
        Roster::seeded()
    } else {
        Roster::new()
    };

    let mut app = ui::app::App::new(&mut roster, &config);
    app.run()?;

    Ok(())
}
