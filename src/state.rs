use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::data::filter::remove_outliers;
use crate::data::loader::load_file;
use crate::data::model::{FilteredSeries, Series};
use crate::export::{ChartKind, ExportQueue};

// ---------------------------------------------------------------------------
// Dataset – loaded series plus its outlier-free view
// ---------------------------------------------------------------------------

/// A loaded file. Immutable once built; charts read `filtered` only.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: PathBuf,
    pub series: Series,
    pub filtered: FilteredSeries,
}

impl Dataset {
    /// Load `path` and remove outliers using the configured options.
    pub fn load(path: &Path, config: &AppConfig) -> Result<Self> {
        let series = load_file(path, &config.loader_options())
            .with_context(|| format!("loading {}", path.display()))?;
        let filtered = remove_outliers(&series, &config.filter_options())
            .with_context(|| format!("filtering {}", path.display()))?;
        Ok(Dataset {
            source: path.to_path_buf(),
            series,
            filtered,
        })
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: AppConfig,

    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Dataset>,

    /// Chart shown in the central panel.
    pub chart: ChartKind,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// In-progress PNG export, if any.
    pub export: Option<ExportQueue>,

    /// Close the window once the export queue drains.
    pub exit_after_export: bool,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            dataset: None,
            chart: ChartKind::default(),
            status_message: None,
            export: None,
            exit_after_export: false,
        }
    }

    /// Ingest a newly loaded dataset.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.dataset = Some(dataset);
        self.status_message = None;
    }

    /// Load a file; on failure keep the current dataset and show the error.
    pub fn open(&mut self, path: &Path) {
        match Dataset::load(path, &self.config) {
            Ok(dataset) => self.set_dataset(dataset),
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    /// Queue all three charts for PNG export into the configured directory.
    pub fn start_export(&mut self) {
        if self.dataset.is_none() {
            self.status_message = Some("Nothing to export: no dataset loaded".to_string());
            return;
        }
        log::info!("Exporting charts to {}", self.config.out_dir.display());
        self.export = Some(ExportQueue::new(self.config.out_dir.clone()));
    }

    pub fn is_exporting(&self) -> bool {
        self.export.is_some()
    }

    /// Chart to draw this frame: the export queue wins over the user's pick.
    pub fn visible_chart(&self) -> ChartKind {
        self.export
            .as_ref()
            .and_then(ExportQueue::current)
            .unwrap_or(self.chart)
    }

    /// Drop the export queue once it has drained, reporting what was written.
    pub fn finish_export_if_done(&mut self) -> bool {
        let Some(queue) = &self.export else {
            return false;
        };
        if !queue.is_done() {
            return false;
        }
        self.status_message = Some(format!("Exported {} charts", queue.written().len()));
        self.export = None;
        true
    }
}
