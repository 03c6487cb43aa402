use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;

use skycast_core::{
    Config, OpenMeteoForecast, OpenMeteoGeocoder, SessionState, TemperatureUnit, WeatherSession,
};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Weather in your terminal, powered by Open-Meteo")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Look up a place by name and show its forecast.
    Show {
        /// City or country name.
        location: String,

        /// Temperature unit: "celsius"/"c" or "fahrenheit"/"f".
        /// Defaults to the configured unit.
        #[arg(long)]
        unit: Option<String>,

        /// Also show the detail view for this forecast day (0 = today).
        #[arg(long)]
        day: Option<usize>,
    },

    /// Choose and persist the default temperature unit.
    Configure,

    /// Interactive prompt: search places, toggle the unit, clear.
    Interactive,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Show {
                location,
                unit,
                day,
            } => show(&location, unit.as_deref(), day).await,
            Command::Configure => configure(),
            Command::Interactive => interactive().await,
        }
    }
}

fn session_with_unit(unit: TemperatureUnit) -> WeatherSession {
    WeatherSession::with_unit(
        Arc::new(OpenMeteoGeocoder::new()),
        Arc::new(OpenMeteoForecast::new()),
        unit,
    )
}

/// Block until the in-flight fetch (if any) reaches a terminal state.
async fn settled_state(session: &WeatherSession) -> Result<SessionState> {
    let mut rx = session.subscribe();
    let state = rx.wait_for(SessionState::is_settled).await?.clone();
    Ok(state)
}

async fn show(location: &str, unit_arg: Option<&str>, day: Option<usize>) -> Result<()> {
    let config = Config::load()?;
    let unit = match unit_arg {
        Some(s) => TemperatureUnit::try_from(s)?,
        None => config.default_unit()?,
    };

    let session = session_with_unit(unit);
    session.search(location);

    let state = settled_state(&session).await?;
    render::print_state(&state, day);
    Ok(())
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let options: Vec<&str> = TemperatureUnit::all().iter().map(|u| u.as_str()).collect();
    let choice = inquire::Select::new("Default temperature unit:", options).prompt()?;
    let unit = TemperatureUnit::try_from(choice)?;

    config.set_default_unit(unit);
    config.save()?;

    println!("Default unit set to {unit}.");
    Ok(())
}

async fn interactive() -> Result<()> {
    let config = Config::load()?;
    let session = session_with_unit(config.default_unit()?);

    println!("Type a city or country name. Commands: :unit, :clear, :quit.");

    loop {
        let input = inquire::Text::new("Where to?").prompt()?;

        match input.trim() {
            ":quit" | ":q" => break,
            ":clear" => {
                session.clear();
                println!("Cleared.");
            }
            ":unit" => {
                session.set_unit(session.unit().toggle());
                let state = settled_state(&session).await?;
                println!("Unit is now {}.", state.unit.symbol());
                render::print_state(&state, None);
            }
            _ => {
                session.search(&input);
                let state = settled_state(&session).await?;
                render::print_state(&state, None);
            }
        }
    }

    Ok(())
}
