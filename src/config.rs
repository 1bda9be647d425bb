use crate::cli::Args;
use crate::types::Config;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_yaml(&contents).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(contents)?;
        Ok(config)
    }

    /// File (or defaults) overridden by command-line flags, then validated.
    pub fn resolve(args: &Args) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(video) = &args.video {
            config.video.input = Some(video.to_string_lossy().into_owned());
        }
        if let Some(output) = &args.output {
            config.video.output = Some(output.to_string_lossy().into_owned());
        }
        if let Some(buffer) = args.buffer {
            config.tracking.buffer_size = buffer as usize;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tracking.buffer_size == 0 {
            bail!("tracking.buffer_size must be at least 1");
        }
        if self.tracking.min_radius < 0.0 {
            bail!("tracking.min_radius must not be negative");
        }

        let det = &self.detection;
        if det.blur_kernel <= 0 || det.blur_kernel % 2 == 0 {
            bail!(
                "detection.blur_kernel must be a positive odd number, got {}",
                det.blur_kernel
            );
        }
        if det.erode_iterations < 0 || det.dilate_iterations < 0 {
            bail!("detection erode/dilate iterations must not be negative");
        }
        if det
            .hsv_lower
            .iter()
            .zip(det.hsv_upper.iter())
            .any(|(lo, hi)| lo > hi)
        {
            bail!(
                "detection.hsv_lower {:?} exceeds hsv_upper {:?}",
                det.hsv_lower,
                det.hsv_upper
            );
        }

        if self.video.frame_width <= 0 {
            bail!("video.frame_width must be positive");
        }
        if self.video.output_fourcc.chars().count() != 4 {
            bail!(
                "video.output_fourcc must be exactly 4 characters, got {:?}",
                self.video.output_fourcc
            );
        }
        if self.video.output_fps <= 0.0 {
            bail!("video.output_fps must be positive");
        }

        if !self.display.quit_key.is_ascii() {
            bail!(
                "display.quit_key must be an ASCII character, got {:?}",
                self.display.quit_key
            );
        }

        if self.plot.width <= 0 || self.plot.height <= 0 {
            bail!("plot dimensions must be positive");
        }

        Ok(())
    }
}
