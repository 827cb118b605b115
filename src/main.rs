mod app;
mod color;
mod config;
mod data;
mod export;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use app::PageViewApp;
use clap::Parser;
use config::AppConfig;
use data::model::DuplicatePolicy;
use eframe::egui;
use state::{AppState, Dataset};

#[derive(Parser, Debug)]
#[command(name = "pageview-charts")]
#[command(about = "Chart daily page views after trimming outliers", long_about = None)]
struct Cli {
    /// Input file (CSV, JSON or Parquet) with `date` and `value` columns
    input: Option<PathBuf>,

    /// TOML config file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for exported PNGs
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Write line_plot.png, bar_plot.png and box_plot.png, then exit
    #[arg(long)]
    export: bool,

    /// Duplicate date handling (reject, keep-first, keep-last)
    #[arg(long)]
    duplicates: Option<DuplicatePolicy>,

    /// Lower quantile of the kept range
    #[arg(long)]
    lower_quantile: Option<f64>,

    /// Upper quantile of the kept range
    #[arg(long)]
    upper_quantile: Option<f64>,
}

impl Cli {
    /// Config file (or defaults) with command-line overrides applied.
    fn resolve_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::from_file(path)?,
            None => AppConfig::default(),
        };
        if let Some(input) = &self.input {
            config.input = Some(input.clone());
        }
        if let Some(out_dir) = &self.out_dir {
            config.out_dir = out_dir.clone();
        }
        if let Some(policy) = self.duplicates {
            config.duplicates = policy;
        }
        if let Some(q) = self.lower_quantile {
            config.lower_quantile = q;
        }
        if let Some(q) = self.upper_quantile {
            config.upper_quantile = q;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;
    let mut state = AppState::new(config);

    match state.config.input.clone() {
        // Every chart needs the data, so a failed load ends an export run.
        Some(path) if cli.export => {
            let dataset = Dataset::load(&path, &state.config)?;
            state.set_dataset(dataset);
            state.start_export();
            state.exit_after_export = true;
        }
        Some(path) => state.open(&path),
        None if cli.export => bail!("--export needs an input file"),
        None => {}
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([state.config.window_width, state.config.window_height])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Page View Charts",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::light());
            Ok(Box::new(PageViewApp::new(state)))
        }),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
    .context("running the chart window")
}
