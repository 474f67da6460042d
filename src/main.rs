use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

mod config;
mod controller;
mod dashboard;
mod dataset;
mod domain;
mod filter;
mod inputter;
mod loader;
mod logging;
mod model;
mod projector;
mod report;
mod search;
mod table;
mod ui;
mod visibility;

use config::DashboardConfig;
use controller::Controller;
use dashboard::Dashboard;
use dataset::DatasetKind;
use domain::DashError;
use filter::CategorySelection;
use logging::{LogConfig, LogTarget, init_logging};
use model::{Model, Status};
use search::SearchQuery;
use ui::TableUI;

#[derive(Debug, Parser)]
#[command(version, about = "Inventory dashboard for warehouse stock and new arrivals")]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Warehouse stock spreadsheet
    #[arg(long)]
    stock: Option<PathBuf>,

    /// New arrivals spreadsheet
    #[arg(long)]
    arrival: Option<PathBuf>,

    #[arg(long)]
    stock_date: Option<String>,

    #[arg(long)]
    arrival_date: Option<String>,

    #[arg(long)]
    log_file: Option<PathBuf>,

    /// -v debug, -vv trace
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive dashboard (default)
    Tui,
    /// Print the browse view, or search results when a query is given
    Print {
        #[arg(short, long)]
        query: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        /// stock or new_arrival; both when omitted
        #[arg(short, long)]
        dataset: Option<String>,
    },
    /// List the category choices
    Categories,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Err(e) => {
            error!("{e}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn load_config(cli: &Cli) -> Result<DashboardConfig, DashError> {
    let mut cfg = match &cli.config {
        Some(path) => DashboardConfig::from_file(path)?,
        None => DashboardConfig::default(),
    };
    if let Some(path) = &cli.stock {
        cfg.stock = cfg.stock.with_path(path.clone());
    }
    if let Some(path) = &cli.arrival {
        cfg.new_arrival = cfg.new_arrival.with_path(path.clone());
    }
    if let Some(date) = &cli.stock_date {
        cfg.stock = cfg.stock.with_date(date.clone());
    }
    if let Some(date) = &cli.arrival_date {
        cfg.new_arrival = cfg.new_arrival.with_date(date.clone());
    }
    if cli.log_file.is_some() {
        cfg = cfg.with_log_file(cli.log_file.clone());
    }
    Ok(cfg)
}

fn run(cli: Cli) -> Result<(), DashError> {
    let cfg = load_config(&cli)?;
    let headless = !matches!(cli.command, None | Some(Command::Tui));
    let target = if headless {
        LogTarget::Stderr
    } else {
        LogTarget::Discard
    };
    init_logging(
        &LogConfig::from_verbosity(cli.verbose)
            .with_file(cfg.log_file.clone())
            .with_target(target),
    )?;

    match cli.command {
        None | Some(Command::Tui) => run_tui(&cfg),
        Some(Command::Print {
            query,
            category,
            dataset,
        }) => {
            let kinds = match dataset.as_deref() {
                None => DatasetKind::ALL.to_vec(),
                Some(key) => vec![DatasetKind::from_key(key).ok_or_else(|| {
                    DashError::LoadingFailed(format!("Unknown dataset: {key}"))
                })?],
            };
            let category = category
                .as_deref()
                .map(CategorySelection::parse)
                .unwrap_or(CategorySelection::All);
            let query = query.as_deref().and_then(SearchQuery::parse);
            let dashboard = load_dashboard(cfg);
            println!(
                "{}",
                report::render(&dashboard, query.as_ref(), &category, &kinds)?
            );
            Ok(())
        }
        Some(Command::Categories) => {
            let dashboard = load_dashboard(cfg);
            println!("{}", report::render_categories(&dashboard));
            Ok(())
        }
    }
}

fn load_dashboard(cfg: DashboardConfig) -> Dashboard {
    let mut dashboard = Dashboard::new(cfg);
    for message in dashboard.load_all() {
        eprintln!("{message}");
    }
    dashboard
}

fn run_tui(cfg: &DashboardConfig) -> Result<(), DashError> {
    info!("Starting stockview");
    let mut terminal = ratatui::init();
    let result = (|| -> Result<(), DashError> {
        let size = terminal.size()?;
        let mut model = Model::init(cfg, size.width as usize, size.height as usize);
        let mut ui = TableUI::new(cfg);
        let controller = Controller::new(cfg);

        while model.status != Status::QUITTING {
            terminal.draw(|f| ui.draw(&model, f))?;
            model.update(controller.handle_event(&model)?)?;
        }
        Ok(())
    })();
    ratatui::restore();
    result
}
