//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP) | `image` crate (pure Rust decoders) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Crop | `DynamicImage::crop_imm` at offsets from [`plan_fit`](super::calculations::plan_fit) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (forced to RGB8) |
//! | Atomic write | `tempfile::NamedTempFile` in the output directory, then `persist` |

use super::backend::{BackendError, Dimensions, ImageBackend, OutputResults};
use super::operations::{fit_crop, render_icon, square_crop};
use super::params::{FitCropParams, IconParams, OutputFormat};
use image::{DynamicImage, ImageFormat, ImageReader};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Extensions whose decoders are compiled in.
const INPUT_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    INPUT_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// True if `path` has an extension with a compiled-in decoder.
pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(e))
        })
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
///
/// Missing, unreadable and undecodable files all map to `NotFound`: for the
/// caller each means "no usable image at this path".
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(|e| BackendError::not_found(path, e))?
        .with_guessed_format()
        .map_err(|e| BackendError::not_found(path, e))?
        .decode()
        .map_err(|e| BackendError::not_found(path, format!("decode failed: {e}")))
}

/// Convert to a pixel layout the chosen encoder accepts.
fn prepare_for_format(img: &DynamicImage, format: OutputFormat) -> DynamicImage {
    match format {
        OutputFormat::Jpeg => DynamicImage::ImageRgb8(img.to_rgb8()),
        OutputFormat::Png => match img {
            DynamicImage::ImageRgb32F(_) => DynamicImage::ImageRgb16(img.to_rgb16()),
            DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgba16(img.to_rgba16()),
            _ => img.clone(),
        },
    }
}

/// Encode `img` and write it to `path`, inferring the format from the extension.
///
/// The bytes go to a temporary file in the destination directory that is
/// renamed over `path` only after the encoder succeeded, so a failed write
/// never leaves a truncated image behind.
fn save_image(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let format = OutputFormat::from_path(path).ok_or_else(|| {
        BackendError::ProcessingFailed(format!(
            "Unsupported output format: {}",
            path.extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
        ))
    })?;

    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let prepared = prepare_for_format(img, format);
    let mut tmp = tempfile::Builder::new()
        .prefix(".storefit-")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        let encoded = match format {
            OutputFormat::Png => {
                prepared.write_with_encoder(image::codecs::png::PngEncoder::new(&mut writer))
            }
            OutputFormat::Jpeg => {
                prepared.write_with_encoder(image::codecs::jpeg::JpegEncoder::new_with_quality(
                    &mut writer,
                    quality.clamp(1, 100) as u8,
                ))
            }
        };
        encoded.map_err(|e| {
            BackendError::ProcessingFailed(format!(
                "{} encode failed for {}: {}",
                format.extension(),
                path.display(),
                e
            ))
        })?;
        writer.flush()?;
    }
    tmp.persist(path).map_err(|e| BackendError::Io(e.error))?;
    debug!(output = %path.display(), "wrote image");
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) =
            image::image_dimensions(path).map_err(|e| BackendError::not_found(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn fit_crop(&self, params: &FitCropParams) -> Result<OutputResults, BackendError> {
        let img = load_image(&params.source)?;
        debug!(
            source = %params.source.display(),
            width = img.width(),
            height = img.height(),
            canvases = params.canvases.len(),
            "decoded screenshot source"
        );

        Ok(params
            .canvases
            .iter()
            .map(|canvas| {
                let fitted = fit_crop(&img, canvas.width, canvas.height)?;
                save_image(&fitted, &canvas.output, params.quality.value())
            })
            .collect())
    }

    fn icons(&self, params: &IconParams) -> Result<OutputResults, BackendError> {
        let img = load_image(&params.source)?;
        let square = square_crop(&img)?;
        debug!(
            source = %params.source.display(),
            side = square.width(),
            "square-cropped icon source"
        );

        Ok(params
            .icons
            .iter()
            .map(|icon| {
                let rendered = render_icon(&square, icon.size)?;
                save_image(&rendered, &icon.output, params.quality.value())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::params::{Canvas, IconTarget, Quality};
    use image::{ImageEncoder, RgbImage, Rgba, RgbaImage};

    #[test]
    fn supported_extensions_match_decodable_formats() {
        let exts = super::supported_input_extensions();
        for expected in &["png", "jpg", "jpeg", "tif", "tiff", "webp"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
        assert!(is_supported_input(Path::new("a/02_today.PNG")));
        assert!(!is_supported_input(Path::new("a/notes.txt")));
    }

    /// Create a small valid PNG file with the given dimensions.
    fn create_test_png(path: &Path, width: u32, height: u32) {
        let img = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        });
        img.save(path).unwrap();
    }

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        image::codecs::jpeg::JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    #[test]
    fn identify_synthetic_png() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("shot.png");
        create_test_png(&path, 200, 150);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!((dims.width, dims.height), (200, 150));
    }

    #[test]
    fn identify_nonexistent_file_is_not_found() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.png"));
        assert!(matches!(result, Err(BackendError::NotFound { .. })));
    }

    #[test]
    fn fit_crop_writes_exact_canvases() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("02_today.png");
        create_test_png(&source, 192, 108);

        let a = tmp.path().join("out/appstore/02_today_67.png");
        let b = tmp.path().join("out/playstore/02_today.jpg");
        let results = RustBackend::new()
            .fit_crop(&FitCropParams {
                source,
                canvases: vec![
                    Canvas {
                        width: 129,
                        height: 280,
                        output: a.clone(),
                    },
                    Canvas {
                        width: 108,
                        height: 192,
                        output: b.clone(),
                    },
                ],
                quality: Quality::new(85),
            })
            .unwrap();

        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(image::image_dimensions(&a).unwrap(), (129, 280));
        assert_eq!(image::image_dimensions(&b).unwrap(), (108, 192));
    }

    #[test]
    fn fit_crop_png_keeps_alpha_jpeg_drops_it() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("src.png");
        create_test_png(&source, 60, 90);

        let png = tmp.path().join("a.png");
        let jpg = tmp.path().join("a.jpg");
        RustBackend::new()
            .fit_crop(&FitCropParams {
                source,
                canvases: vec![
                    Canvas {
                        width: 30,
                        height: 30,
                        output: png.clone(),
                    },
                    Canvas {
                        width: 30,
                        height: 30,
                        output: jpg.clone(),
                    },
                ],
                quality: Quality::default(),
            })
            .unwrap();

        assert!(image::open(&png).unwrap().color().has_alpha());
        assert!(!image::open(&jpg).unwrap().color().has_alpha());
    }

    #[test]
    fn fit_crop_missing_source_is_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let result = RustBackend::new().fit_crop(&FitCropParams {
            source: tmp.path().join("missing.png"),
            canvases: vec![Canvas {
                width: 10,
                height: 10,
                output: tmp.path().join("out.png"),
            }],
            quality: Quality::default(),
        });
        assert!(matches!(result, Err(BackendError::NotFound { .. })));
        assert!(!tmp.path().join("out.png").exists());
    }

    #[test]
    fn fit_crop_undecodable_source_is_not_found() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("broken.png");
        std::fs::write(&source, b"not an image").unwrap();
        let result = RustBackend::new().fit_crop(&FitCropParams {
            source,
            canvases: vec![],
            quality: Quality::default(),
        });
        assert!(matches!(result, Err(BackendError::NotFound { .. })));
    }

    #[test]
    fn fit_crop_per_canvas_failures_are_independent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("src.jpg");
        create_test_jpeg(&source, 100, 100);

        let good = tmp.path().join("good.png");
        let results = RustBackend::new()
            .fit_crop(&FitCropParams {
                source,
                canvases: vec![
                    Canvas {
                        width: 0,
                        height: 50,
                        output: tmp.path().join("zero.png"),
                    },
                    Canvas {
                        width: 50,
                        height: 50,
                        output: tmp.path().join("bad.webp"),
                    },
                    Canvas {
                        width: 50,
                        height: 50,
                        output: good.clone(),
                    },
                ],
                quality: Quality::default(),
            })
            .unwrap();

        assert!(matches!(
            results[0],
            Err(BackendError::InvalidDimensions { .. })
        ));
        assert!(matches!(results[1], Err(BackendError::ProcessingFailed(_))));
        assert!(results[2].is_ok());
        assert!(good.exists());
        assert!(!tmp.path().join("zero.png").exists());
        assert!(!tmp.path().join("bad.webp").exists());
    }

    #[test]
    fn rejected_canvas_writes_nothing() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("src.png");
        create_test_png(&source, 40, 40);

        let out_dir = tmp.path().join("out");
        RustBackend::new()
            .fit_crop(&FitCropParams {
                source,
                canvases: vec![Canvas {
                    width: 0,
                    height: 20,
                    output: out_dir.join("a.png"),
                }],
                quality: Quality::default(),
            })
            .unwrap();

        let leftovers = std::fs::read_dir(&out_dir)
            .map(|rd| rd.count())
            .unwrap_or(0);
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn icons_square_crop_and_nested_outputs() {
        let tmp = tempfile::TempDir::new().unwrap();
        let source = tmp.path().join("logo.jpg");
        create_test_jpeg(&source, 300, 400);

        let out = tmp.path().join("icons");
        let targets = vec![
            IconTarget {
                size: 1024,
                output: out.join("appstore_icon_1024.png"),
            },
            IconTarget {
                size: 48,
                output: out.join("android/mipmap-mdpi/ic_launcher.png"),
            },
            IconTarget {
                size: 29,
                output: out.join("ios/Icon-29.png"),
            },
        ];
        let results = RustBackend::new()
            .icons(&IconParams {
                source,
                icons: targets.clone(),
                quality: Quality::default(),
            })
            .unwrap();

        assert!(results.iter().all(|r| r.is_ok()));
        for target in &targets {
            let img = image::open(&target.output).unwrap();
            assert_eq!((img.width(), img.height()), (target.size, target.size));
            assert!(!img.color().has_alpha());
        }
    }
}
