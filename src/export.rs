use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use eframe::egui::ColorImage;

// ---------------------------------------------------------------------------
// Chart kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChartKind {
    #[default]
    Line,
    Bar,
    Box,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [ChartKind::Line, ChartKind::Bar, ChartKind::Box];

    pub fn file_name(self) -> &'static str {
        match self {
            ChartKind::Line => "line_plot.png",
            ChartKind::Bar => "bar_plot.png",
            ChartKind::Box => "box_plot.png",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChartKind::Line => "Line",
            ChartKind::Bar => "Monthly bars",
            ChartKind::Box => "Box plots",
        })
    }
}

// ---------------------------------------------------------------------------
// PNG encoding
// ---------------------------------------------------------------------------

/// Encode a captured viewport as PNG.
pub fn save_png(image: &ColorImage, path: &Path) -> Result<()> {
    let [width, height] = image.size;
    let bytes: Vec<u8> = image.pixels.iter().flat_map(|c| c.to_array()).collect();
    let buffer = image::RgbaImage::from_raw(width as u32, height as u32, bytes)
        .context("screenshot buffer does not match its size")?;
    buffer
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("writing {}", path.display()))?;
    log::info!("Wrote {} ({width}x{height})", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Export queue
// ---------------------------------------------------------------------------

/// Frames a chart is shown before it is captured, so plot bounds settle.
const SETTLE_FRAMES: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Settling(u8),
    AwaitingScreenshot,
}

/// Drives the "show chart → capture → write PNG" cycle over several frames.
///
/// The app calls [`ExportQueue::poll`] once per frame and requests a
/// screenshot when it returns `true`; the captured image is handed back via
/// [`ExportQueue::on_screenshot`].
#[derive(Debug)]
pub struct ExportQueue {
    out_dir: PathBuf,
    pending: VecDeque<ChartKind>,
    phase: Phase,
    written: Vec<PathBuf>,
}

impl ExportQueue {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self::with_charts(out_dir, ChartKind::ALL)
    }

    pub fn with_charts(out_dir: impl Into<PathBuf>, charts: impl IntoIterator<Item = ChartKind>) -> Self {
        ExportQueue {
            out_dir: out_dir.into(),
            pending: charts.into_iter().collect(),
            phase: Phase::Settling(SETTLE_FRAMES),
            written: Vec::new(),
        }
    }

    /// Chart that must be on screen right now.
    pub fn current(&self) -> Option<ChartKind> {
        self.pending.front().copied()
    }

    pub fn is_done(&self) -> bool {
        self.pending.is_empty()
    }

    /// Files written so far.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Advance one frame. Returns `true` exactly once per chart, on the frame
    /// the screenshot should be requested.
    pub fn poll(&mut self) -> bool {
        if self.is_done() {
            return false;
        }
        match self.phase {
            Phase::Settling(0) => {
                self.phase = Phase::AwaitingScreenshot;
                true
            }
            Phase::Settling(n) => {
                self.phase = Phase::Settling(n - 1);
                false
            }
            Phase::AwaitingScreenshot => false,
        }
    }

    /// Write the captured image for the current chart and move to the next.
    ///
    /// Screenshots arriving while no capture is outstanding are ignored.
    pub fn on_screenshot(&mut self, image: &ColorImage) -> Result<Option<PathBuf>> {
        if self.phase != Phase::AwaitingScreenshot {
            return Ok(None);
        }
        let Some(chart) = self.pending.pop_front() else {
            return Ok(None);
        };
        self.phase = Phase::Settling(SETTLE_FRAMES);

        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("creating {}", self.out_dir.display()))?;
        let path = self.out_dir.join(chart.file_name());
        save_png(image, &path)?;
        self.written.push(path.clone());
        Ok(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::Color32;
    use pretty_assertions::assert_eq;

    use super::*;

    fn frame() -> ColorImage {
        ColorImage::new([4, 3], Color32::WHITE)
    }

    /// Poll until a capture is requested, returning the number of polls.
    fn polls_until_capture(queue: &mut ExportQueue) -> usize {
        let mut n = 1;
        while !queue.poll() {
            n += 1;
            assert!(n < 100, "capture never requested");
        }
        n
    }

    #[test]
    fn chart_file_names() {
        let names: Vec<&str> = ChartKind::ALL.iter().map(|c| c.file_name()).collect();
        assert_eq!(names, vec!["line_plot.png", "bar_plot.png", "box_plot.png"]);
    }

    #[test]
    fn exports_every_chart_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("charts");
        let mut queue = ExportQueue::new(&out);

        for expected in ChartKind::ALL {
            assert_eq!(queue.current(), Some(expected));
            assert_eq!(polls_until_capture(&mut queue), usize::from(SETTLE_FRAMES) + 1);
            // no second request while waiting for the image
            assert!(!queue.poll());
            let path = queue.on_screenshot(&frame()).unwrap().unwrap();
            assert_eq!(path, out.join(expected.file_name()));
        }

        assert!(queue.is_done());
        assert!(!queue.poll());
        assert_eq!(queue.written().len(), 3);

        let png = image::open(out.join("box_plot.png")).unwrap();
        assert_eq!((png.width(), png.height()), (4, 3));
    }

    #[test]
    fn unrequested_screenshot_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut queue = ExportQueue::with_charts(dir.path(), [ChartKind::Bar]);
        assert_eq!(queue.on_screenshot(&frame()).unwrap(), None);
        assert_eq!(queue.current(), Some(ChartKind::Bar));
        assert!(queue.written().is_empty());
    }

    #[test]
    fn save_png_rejects_mismatched_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let mut image = frame();
        image.pixels.pop();
        assert!(save_png(&image, &dir.path().join("bad.png")).is_err());
    }
}
