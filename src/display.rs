// src/display.rs

use crate::path_plot::show_path_plot;
use crate::types::{DisplayConfig, PlotConfig, Position};
use anyhow::Result;
use opencv::{core::Mat, highgui};
use tracing::info;

/// Everything that puts pixels on the user's screen.
pub trait Screen {
    /// Show an annotated frame; `true` when the user asked to quit.
    fn show(&mut self, frame: &Mat) -> Result<bool>;
    fn close(&mut self) -> Result<()>;
    /// Blocking trajectory chart, shown after everything else is released.
    fn show_plot(&mut self, path: &[Position]) -> Result<()>;
}

/// HighGUI preview window with quit-key polling.
pub struct DisplayWindow {
    name: String,
    quit_key: char,
    plot: PlotConfig,
}

impl DisplayWindow {
    pub fn new(config: &DisplayConfig, plot: &PlotConfig) -> Self {
        Self {
            name: config.window_name.clone(),
            quit_key: config.quit_key,
            plot: plot.clone(),
        }
    }
}

impl Screen for DisplayWindow {
    fn show(&mut self, frame: &Mat) -> Result<bool> {
        highgui::imshow(&self.name, frame)?;
        let key = highgui::wait_key(1)?;
        Ok(is_quit_key(key, self.quit_key))
    }

    fn close(&mut self) -> Result<()> {
        info!("Destroying all windows...");
        highgui::destroy_all_windows()?;
        Ok(())
    }

    fn show_plot(&mut self, path: &[Position]) -> Result<()> {
        show_path_plot(path, &self.plot)
    }
}

/// `wait_key` may carry modifier bits above the low byte.
pub fn is_quit_key(key: i32, quit_key: char) -> bool {
    key >= 0 && (key & 0xFF) as u32 == quit_key as u32
}
