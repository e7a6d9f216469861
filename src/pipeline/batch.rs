//! Batch deblurring of an input directory into side-by-side comparisons.

use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};
use crate::image::{load_rgb, output_to_image, pad_to_tile, save_image, side_by_side};
use crate::model::Deblur;
use crate::preview::{NoPreview, Preview};

use super::inputs::enumerate_inputs;

/// Window title used for previews.
const PREVIEW_TITLE: &str = "Combined";

/// What to do when one image in a batch fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop the run and return the first error.
    #[default]
    Abort,
    /// Log the error, record it in the report and continue with the next image.
    Skip,
}

/// Configuration for a batch run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the comparisons are written to. Created if missing.
    pub save_root: PathBuf,

    /// Output JPEG quality (1-100).
    pub output_quality: u8,

    /// Behaviour when a single image fails.
    pub on_error: ErrorPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_root: PathBuf::from("results"),
            output_quality: 95,
            on_error: ErrorPolicy::Abort,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.output_quality) {
            return Err(Error::InvalidParameter {
                name: "output_quality".to_string(),
                reason: "must be between 1 and 100".to_string(),
            });
        }

        if self.save_root.as_os_str().is_empty() {
            return Err(Error::InvalidParameter {
                name: "save_root".to_string(),
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Output files written, in processing order.
    pub processed: Vec<PathBuf>,
    /// Inputs that failed, with their errors. Only filled under [`ErrorPolicy::Skip`].
    pub failed: Vec<(PathBuf, Error)>,
}

impl BatchReport {
    /// Whether every input produced an output.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs every image through the model and writes `original | deblurred` pairs.
pub struct BatchProcessor<D, V = NoPreview> {
    config: Config,
    deblur: D,
    preview: V,
    written: HashSet<OsString>,
}

impl<D: Deblur> BatchProcessor<D> {
    /// Create a processor that does not show previews.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn headless(config: Config, deblur: D) -> Result<Self> {
        Self::new(config, deblur, NoPreview)
    }
}

impl<D: Deblur, V: Preview> BatchProcessor<D, V> {
    /// Create a new processor.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: Config, deblur: D, preview: V) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            deblur,
            preview,
            written: HashSet::new(),
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Process every supported image below `data_root`.
    ///
    /// Creates the output directory first. Under [`ErrorPolicy::Abort`] the
    /// first failure is returned as [`Error::Item`]; under
    /// [`ErrorPolicy::Skip`] failures are collected in the report.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory cannot be created, the input
    /// tree cannot be read, or (when aborting) any image fails.
    pub fn run<P: AsRef<Path>>(&mut self, data_root: P) -> Result<BatchReport> {
        let data_root = data_root.as_ref();

        fs::create_dir_all(&self.config.save_root)?;

        let inputs = enumerate_inputs(data_root)?;
        tracing::info!(
            "Found {} image(s) under {}",
            inputs.len(),
            data_root.display()
        );

        let pb = ProgressBar::new(inputs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} Processing images [{bar:40.cyan/blue}] {pos}/{len}")
                .expect("valid template")
                .progress_chars("#>-"),
        );

        let mut report = BatchReport::default();

        for path in inputs {
            match self.process_one(&path) {
                Ok(saved) => report.processed.push(saved),
                Err(err) => {
                    let err = err.for_item(&path);
                    match self.config.on_error {
                        ErrorPolicy::Abort => {
                            pb.abandon();
                            return Err(err);
                        }
                        ErrorPolicy::Skip => {
                            tracing::warn!("Skipping: {err}");
                            report.failed.push((path, err));
                        }
                    }
                }
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        tracing::info!(
            "Processed {} image(s), {} failed",
            report.processed.len(),
            report.failed.len()
        );

        Ok(report)
    }

    /// Deblur one image and write its comparison into the output directory.
    ///
    /// The output keeps the input's file name, extension included. Nothing is
    /// written if any step fails. The output directory must already exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the image cannot be decoded, has an unsupported
    /// size, the model fails or returns the wrong shape, or the output cannot
    /// be written.
    pub fn process_one<P: AsRef<Path>>(&mut self, path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        let name = path.file_name().ok_or_else(|| Error::InvalidParameter {
            name: "path".to_string(),
            reason: format!("{} has no file name", path.display()),
        })?;

        tracing::info!("Processing image: {}", path.display());

        let image = load_rgb(path)?;
        let padded = pad_to_tile(&image)?;

        let (side, region) = (padded.side(), padded.region);
        tracing::debug!("Running model on {side}x{side} canvas, content at {region:?}");
        let output = self.deblur.deblur(&padded.canvas)?;
        let restored = output_to_image(&output, side)?;

        let original = region.crop(&padded.canvas);
        let deblurred = region.crop(&restored);
        let combined = side_by_side(&original, &deblurred)?;

        let save_path = self.config.save_root.join(name);
        save_image(&combined, &save_path, self.config.output_quality)?;
        if !self.written.insert(name.to_os_string()) {
            tracing::warn!(
                "{} overwrote an earlier output with the same name",
                save_path.display()
            );
        }
        tracing::debug!("Saved {}", save_path.display());

        if let Err(err) = self.preview.show(PREVIEW_TITLE, &combined) {
            tracing::warn!("{err}");
        }

        Ok(save_path)
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};
    use ndarray::Array3;

    use super::*;
    use crate::image::OutputArray;

    /// Stand-in model that inverts every pixel.
    fn invert(img: &RgbImage) -> Result<OutputArray> {
        let (w, h) = (img.width() as usize, img.height() as usize);
        Ok(Array3::from_shape_fn((h, w, 3), |(y, x, c)| {
            #[allow(clippy::cast_possible_truncation)]
            let pixel = img.get_pixel(x as u32, y as u32);
            255.0 - f32::from(pixel[c])
        }))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_image(path: &Path, width: u32, height: u32) -> RgbImage {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 200) as u8 + 10, (y % 200) as u8 + 20, 77])
        });
        img.save(path).unwrap();
        img
    }

    fn config(save_root: &Path, on_error: ErrorPolicy) -> Config {
        Config {
            save_root: save_root.to_path_buf(),
            on_error,
            ..Config::default()
        }
    }

    fn output_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_config_validation() {
        assert!(Config::default().validate().is_ok());

        let config = Config {
            output_quality: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(Error::InvalidParameter { .. })
        ));

        let config = Config {
            save_root: PathBuf::new(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_combined_output_is_original_then_result() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in/photo.png");
        let original = write_image(&input, 300, 200);
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();

        let mut processor =
            BatchProcessor::headless(config(&out, ErrorPolicy::Abort), invert).unwrap();
        let saved = processor.process_one(&input).unwrap();

        assert_eq!(saved, out.join("photo.png"));
        let combined = image::open(&saved).unwrap().to_rgb8();
        assert_eq!(combined.dimensions(), (600, 200));
        for (x, y, pixel) in original.enumerate_pixels() {
            assert_eq!(combined.get_pixel(x, y), pixel);
            let inverted = pixel.0.map(|v| 255 - v);
            assert_eq!(combined.get_pixel(x + 300, y).0, inverted);
        }
    }

    #[test]
    fn test_exact_tile_input_passes_straight_through() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("square.png");
        let original = write_image(&input, 256, 256);
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();

        let mut seen = Vec::new();
        {
            let model = |img: &RgbImage| {
                seen.push(img.clone());
                invert(img)
            };
            let mut processor =
                BatchProcessor::headless(config(&out, ErrorPolicy::Abort), model).unwrap();
            processor.process_one(&input).unwrap();
        }

        assert_eq!(seen, vec![original]);
        let combined = image::open(out.join("square.png")).unwrap().to_rgb8();
        assert_eq!(combined.dimensions(), (512, 256));
    }

    #[test]
    fn test_model_sees_tile_aligned_square() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("tall.jpg");
        write_image(&input, 20, 700);
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();

        let mut sides = Vec::new();
        {
            let model = |img: &RgbImage| {
                sides.push(img.dimensions());
                invert(img)
            };
            let mut processor =
                BatchProcessor::headless(config(&out, ErrorPolicy::Abort), model).unwrap();
            processor.process_one(&input).unwrap();
        }

        assert_eq!(sides, vec![(768, 768)]);
        let combined = image::open(out.join("tall.jpg")).unwrap();
        assert_eq!((combined.width(), combined.height()), (40, 700));
    }

    #[test]
    fn test_bad_model_shape_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("x.png");
        write_image(&input, 10, 10);
        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();

        let model = |_: &RgbImage| Ok::<_, Error>(Array3::<f32>::zeros((10, 10, 3)));
        let mut processor =
            BatchProcessor::headless(config(&out, ErrorPolicy::Abort), model).unwrap();

        let err = processor.process_one(&input).unwrap_err();

        assert!(matches!(err, Error::ShapeMismatch { .. }));
        assert!(output_names(&out).is_empty());
    }

    #[test]
    fn test_skip_policy_excludes_oversized_image() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        write_image(&data.join("a.png"), 300, 200);
        write_image(&data.join("b.png"), 5000, 4);
        write_image(&data.join("nested/c.jpg"), 64, 64);
        let out = dir.path().join("results/deep");

        let mut processor =
            BatchProcessor::headless(config(&out, ErrorPolicy::Skip), invert).unwrap();
        let report = processor.run(&data).unwrap();

        assert_eq!(report.processed.len(), 2);
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_success());
        let (failed_path, err) = &report.failed[0];
        assert_eq!(failed_path, &data.join("b.png"));
        assert!(matches!(
            err.root(),
            Error::UnsupportedSize {
                width: 5000,
                target: 5120,
                ..
            }
        ));
        assert_eq!(output_names(&out), vec!["a.png", "c.jpg"]);
    }

    #[test]
    fn test_abort_policy_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        write_image(&data.join("a.png"), 30, 20);
        write_image(&data.join("b.png"), 5000, 4);
        write_image(&data.join("c.png"), 30, 20);
        let out = dir.path().join("out");

        let mut processor =
            BatchProcessor::headless(config(&out, ErrorPolicy::Abort), invert).unwrap();
        let err = processor.run(&data).unwrap_err();

        assert!(matches!(&err, Error::Item { path, .. } if path == &data.join("b.png")));
        assert!(matches!(err.root(), Error::UnsupportedSize { .. }));
        assert_eq!(output_names(&out), vec!["a.png"]);
    }

    #[test]
    fn test_undecodable_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("broken.jpg"), b"nope").unwrap();
        write_image(&data.join("fine.png"), 8, 8);
        let out = dir.path().join("out");

        let mut processor =
            BatchProcessor::headless(config(&out, ErrorPolicy::Skip), invert).unwrap();
        let report = processor.run(&data).unwrap();

        assert_eq!(report.processed, vec![out.join("fine.png")]);
        assert!(matches!(report.failed[0].1.root(), Error::ImageLoad { .. }));
    }

    #[test]
    fn test_empty_tree_still_creates_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        let out = dir.path().join("a/b/c");

        let mut processor =
            BatchProcessor::headless(config(&out, ErrorPolicy::Abort), invert).unwrap();
        let report = processor.run(&data).unwrap();

        assert!(report.is_success());
        assert!(report.processed.is_empty());
        assert!(out.is_dir());
    }

    #[test]
    fn test_same_name_in_subdirectories_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        write_image(&data.join("one/x.png"), 8, 8);
        write_image(&data.join("two/x.png"), 16, 8);
        let out = dir.path().join("out");

        let mut processor =
            BatchProcessor::headless(config(&out, ErrorPolicy::Abort), invert).unwrap();
        let report = processor.run(&data).unwrap();

        assert_eq!(report.processed.len(), 2);
        assert_eq!(output_names(&out), vec!["x.png"]);
        let last = image::open(out.join("x.png")).unwrap();
        assert_eq!(last.width(), 32);
    }

    struct CountingPreview {
        titles: Vec<String>,
    }

    impl Preview for CountingPreview {
        fn show(&mut self, title: &str, image: &RgbImage) -> Result<()> {
            assert!(image.width() > 0);
            self.titles.push(title.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_preview_runs_only_after_successful_write() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        write_image(&data.join("ok.png"), 8, 8);
        write_image(&data.join("big.png"), 4900, 2);
        let out = dir.path().join("out");

        let preview = CountingPreview { titles: Vec::new() };
        let mut processor =
            BatchProcessor::new(config(&out, ErrorPolicy::Skip), invert, preview).unwrap();
        let report = processor.run(&data).unwrap();

        assert_eq!(report.processed.len(), 1);
        assert_eq!(processor.preview.titles, vec![PREVIEW_TITLE.to_string()]);
    }
}
