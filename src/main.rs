use std::io::stdout;
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use ratatui::crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use ratatui::crossterm::execute;
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod domain;
mod inputter;
mod model;
mod ui;
mod warehouse;

use controller::Controller;
use domain::{Cli, LrvConfig, LrvError};
use model::{Model, Status};
use ui::TableUI;
use warehouse::{LoadRecord, WarehouseConfig};

fn main() -> ExitCode {
    match run() {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run() -> Result<(), LrvError> {
    let cli = Cli::parse();
    init_tracing()?;

    let warehouse_config = WarehouseConfig::from_cli(&cli)?;
    info!("Starting lrv for {}", warehouse_config.fq_table());

    // The one fetch of the whole program, before any UI exists.
    let records = warehouse::fetch_load_report(&warehouse_config)?;
    info!("Fetched {} records", records.len());

    let cfg = LrvConfig {
        event_poll_time: cli.event_poll_time,
    };
    let controller = Controller::new(&cfg);
    let ui = TableUI::new();

    let mut terminal = ratatui::init();
    execute!(stdout(), EnableMouseCapture)?;
    let result = event_loop(&mut terminal, &controller, &ui, &warehouse_config, records);
    execute!(stdout(), DisableMouseCapture).ok();
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut ratatui::DefaultTerminal,
    controller: &Controller,
    ui: &TableUI,
    warehouse_config: &WarehouseConfig,
    records: Vec<LoadRecord>,
) -> Result<(), LrvError> {
    let size = terminal.size()?;
    let mut model = Model::new(records, warehouse_config.fq_table(), size.width, size.height);

    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(model.get_uidata(), f))?;

        // Handle events and map them to a Message
        if let Some(message) = controller.handle_event(&model)? {
            model.update(message)?;
        }
    }
    Ok(())
}

fn init_tracing() -> Result<(), LrvError> {
    // The TUI owns the terminal, so logs go to a file.
    let logfile = std::fs::File::create("lrv.log")?;
    let filter = EnvFilter::try_from_env("LRV_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(logfile))
                .with_ansi(false),
        )
        .with(ErrorLayer::default())
        .init();
    Ok(())
}
