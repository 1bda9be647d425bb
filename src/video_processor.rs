// src/video_processor.rs

use crate::types::VideoConfig;
use anyhow::{bail, Context, Result};
use opencv::{
    core::{self, Mat},
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter},
};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Where frames come from. `Ok(None)` is end-of-stream.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Option<Mat>>;
    fn release(&mut self) -> Result<()>;
    fn describe(&self) -> String;
}

/// Open the camera or the file named in the config.
pub fn open_source(config: &VideoConfig) -> Result<Box<dyn FrameSource>> {
    match &config.input {
        Some(path) => Ok(Box::new(VideoFileSource::open(Path::new(path))?)),
        None => Ok(Box::new(CameraSource::open(
            config.camera_index,
            Duration::from_millis(config.camera_warmup_ms),
        )?)),
    }
}

pub struct CameraSource {
    cap: VideoCapture,
    index: i32,
}

impl CameraSource {
    pub fn open(index: i32, warmup: Duration) -> Result<Self> {
        info!("Starting video stream (camera {})...", index);

        let cap = VideoCapture::new(index, videoio::CAP_ANY)
            .with_context(|| format!("opening camera {}", index))?;
        if !cap.is_opened()? {
            bail!("Cannot open camera {}", index);
        }

        // Let exposure settle before the first read
        if !warmup.is_zero() {
            std::thread::sleep(warmup);
        }

        Ok(Self { cap, index })
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Option<Mat>> {
        read_frame(&mut self.cap)
    }

    fn release(&mut self) -> Result<()> {
        info!("Stopping video stream...");
        self.cap.release()?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("camera {}", self.index)
    }
}

pub struct VideoFileSource {
    cap: VideoCapture,
    path: PathBuf,
    pub fps: f64,
    pub total_frames: i32,
    pub current_frame: i32,
}

impl VideoFileSource {
    pub fn open(path: &Path) -> Result<Self> {
        info!("Opening video file: {}", path.display());

        let path_str = path
            .to_str()
            .with_context(|| format!("non UTF-8 video path {}", path.display()))?;
        let cap = VideoCapture::from_file(path_str, videoio::CAP_ANY)?;

        if !cap.is_opened()? {
            bail!("Cannot open video file {}", path.display());
        }

        let fps = cap.get(videoio::CAP_PROP_FPS)?;
        let total_frames = cap.get(videoio::CAP_PROP_FRAME_COUNT)? as i32;
        let width = cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;

        info!(
            "Video properties: {}x{} @ {:.1} FPS, {} frames",
            width, height, fps, total_frames
        );

        Ok(Self {
            cap,
            path: path.to_path_buf(),
            fps,
            total_frames,
            current_frame: 0,
        })
    }

    pub fn progress(&self) -> f32 {
        if self.total_frames <= 0 {
            return 0.0;
        }
        (self.current_frame as f32 / self.total_frames as f32) * 100.0
    }
}

impl FrameSource for VideoFileSource {
    fn next_frame(&mut self) -> Result<Option<Mat>> {
        let frame = read_frame(&mut self.cap)?;
        if frame.is_some() {
            self.current_frame += 1;
            if self.current_frame % 300 == 0 {
                debug!(
                    "Frame {}/{} ({:.1}%)",
                    self.current_frame,
                    self.total_frames,
                    self.progress()
                );
            }
        }
        Ok(frame)
    }

    fn release(&mut self) -> Result<()> {
        info!("Releasing video capture...");
        self.cap.release()?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{} ({:.1} FPS)", self.path.display(), self.fps)
    }
}

fn read_frame(cap: &mut VideoCapture) -> Result<Option<Mat>> {
    let mut mat = Mat::default();
    if !cap.read(&mut mat)? || mat.empty() {
        return Ok(None);
    }
    Ok(Some(mat))
}

// ============================================================================
// OUTPUT
// ============================================================================

pub trait FrameWriter {
    fn write(&mut self, frame: &Mat) -> Result<()>;
    fn release(&mut self) -> Result<()>;
}

impl FrameWriter for VideoWriter {
    fn write(&mut self, frame: &Mat) -> Result<()> {
        VideoWriterTrait::write(self, frame)?;
        Ok(())
    }

    fn release(&mut self) -> Result<()> {
        VideoWriterTrait::release(self)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    pub path: PathBuf,
    pub fourcc: [char; 4],
    pub fps: f64,
}

impl OutputSpec {
    pub fn from_config(config: &VideoConfig) -> Result<Option<Self>> {
        let Some(path) = &config.output else {
            return Ok(None);
        };

        let chars: Vec<char> = config.output_fourcc.chars().collect();
        let fourcc: [char; 4] = chars
            .try_into()
            .map_err(|_| anyhow::anyhow!("fourcc must be 4 characters: {:?}", config.output_fourcc))?;

        Ok(Some(Self {
            path: PathBuf::from(path),
            fourcc,
            fps: config.output_fps,
        }))
    }
}

type WriterOpener = Box<dyn Fn(&OutputSpec, core::Size) -> Result<Box<dyn FrameWriter>>>;

/// Output video that is only created once the first frame's size is known.
pub struct VideoSink {
    spec: Option<OutputSpec>,
    opener: WriterOpener,
    writer: Option<Box<dyn FrameWriter>>,
    frames_written: u64,
}

impl VideoSink {
    pub fn new(spec: Option<OutputSpec>) -> Self {
        Self::with_opener(spec, Box::new(open_video_writer))
    }

    pub fn with_opener(spec: Option<OutputSpec>, opener: WriterOpener) -> Self {
        Self {
            spec,
            opener,
            writer: None,
            frames_written: 0,
        }
    }

    /// Write a frame, opening the container on the first call. No-op when no
    /// output was configured.
    pub fn write(&mut self, frame: &Mat) -> Result<()> {
        let Some(spec) = &self.spec else {
            return Ok(());
        };

        if self.writer.is_none() {
            let size = core::Size::new(frame.cols(), frame.rows());
            info!(
                "Output video: {} ({}x{} @ {:.0} FPS)",
                spec.path.display(),
                size.width,
                size.height,
                spec.fps
            );
            self.writer = Some((self.opener)(spec, size)?);
        }

        if let Some(writer) = self.writer.as_mut() {
            writer.write(frame)?;
            self.frames_written += 1;
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Close the container if one was opened. Returns whether there was one.
    pub fn release(&mut self) -> Result<bool> {
        match self.writer.take() {
            Some(mut writer) => {
                info!("Releasing video writer...");
                writer.release()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

fn open_video_writer(spec: &OutputSpec, size: core::Size) -> Result<Box<dyn FrameWriter>> {
    if let Some(parent) = spec.path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let [a, b, c, d] = spec.fourcc;
    let fourcc = VideoWriter::fourcc(a, b, c, d)?;
    let path = spec
        .path
        .to_str()
        .with_context(|| format!("non UTF-8 output path {}", spec.path.display()))?;

    let writer = VideoWriter::new(path, fourcc, spec.fps, size, true)?;
    if !writer.is_opened()? {
        bail!("Cannot open output video {}", spec.path.display());
    }

    Ok(Box::new(writer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VideoConfig;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct RecordingWriter {
        frames: Rc<RefCell<Vec<(i32, i32, f64)>>>,
        released: Rc<RefCell<bool>>,
    }

    impl FrameWriter for RecordingWriter {
        fn write(&mut self, frame: &Mat) -> Result<()> {
            let marker = *frame.at_2d::<core::Vec3b>(0, 0)?;
            self.frames
                .borrow_mut()
                .push((frame.cols(), frame.rows(), marker[0] as f64));
            Ok(())
        }

        fn release(&mut self) -> Result<()> {
            *self.released.borrow_mut() = true;
            Ok(())
        }
    }

    fn frame(rows: i32, cols: i32, marker: f64) -> Mat {
        Mat::new_rows_cols_with_default(
            rows,
            cols,
            core::CV_8UC3,
            core::Scalar::new(marker, 0.0, 0.0, 0.0),
        )
        .unwrap()
    }

    fn spec() -> OutputSpec {
        OutputSpec {
            path: PathBuf::from("out.avi"),
            fourcc: ['M', 'J', 'P', 'G'],
            fps: 30.0,
        }
    }

    #[test]
    fn test_sink_opens_once_with_first_frame_size() {
        let opened = Rc::new(RefCell::new(Vec::new()));
        let frames = Rc::new(RefCell::new(Vec::new()));
        let released = Rc::new(RefCell::new(false));

        let (o, f, r) = (opened.clone(), frames.clone(), released.clone());
        let mut sink = VideoSink::with_opener(
            Some(spec()),
            Box::new(move |_spec: &OutputSpec, size: core::Size| -> Result<Box<dyn FrameWriter>> {
                o.borrow_mut().push(size);
                Ok(Box::new(RecordingWriter {
                    frames: f.clone(),
                    released: r.clone(),
                }))
            }),
        );

        assert!(!sink.is_open());
        sink.write(&frame(450, 600, 1.0)).unwrap();
        sink.write(&frame(450, 600, 2.0)).unwrap();
        sink.write(&frame(450, 600, 3.0)).unwrap();

        assert_eq!(opened.borrow().as_slice(), &[core::Size::new(600, 450)]);
        assert_eq!(
            frames.borrow().as_slice(),
            &[(600, 450, 1.0), (600, 450, 2.0), (600, 450, 3.0)]
        );
        assert_eq!(sink.frames_written(), 3);

        assert!(sink.release().unwrap());
        assert!(*released.borrow());
        assert!(!sink.release().unwrap());
    }

    #[test]
    fn test_sink_without_output_never_opens() {
        let opened = Rc::new(RefCell::new(0));
        let o = opened.clone();
        let mut sink = VideoSink::with_opener(
            None,
            Box::new(move |_spec: &OutputSpec, _size: core::Size| -> Result<Box<dyn FrameWriter>> {
                *o.borrow_mut() += 1;
                bail!("should not open")
            }),
        );

        sink.write(&frame(10, 10, 0.0)).unwrap();
        assert!(!sink.is_open());
        assert_eq!(*opened.borrow(), 0);
        assert!(!sink.release().unwrap());
    }

    #[test]
    fn test_output_spec_from_config() {
        let mut config = VideoConfig::default();
        assert!(OutputSpec::from_config(&config).unwrap().is_none());

        config.output = Some("runs/out.avi".to_string());
        let spec = OutputSpec::from_config(&config).unwrap().unwrap();
        assert_eq!(spec.path, PathBuf::from("runs/out.avi"));
        assert_eq!(spec.fourcc, ['M', 'J', 'P', 'G']);
        assert_eq!(spec.fps, 30.0);
    }

    #[test]
    fn test_missing_video_file_fails_to_open() {
        assert!(VideoFileSource::open(Path::new("/nonexistent/ball.mp4")).is_err());
    }
}
