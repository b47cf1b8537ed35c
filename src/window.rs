//! Window-size strings and figure sizing
//!
//! The terminal reports its size as `<cols>x<rows>;<width>x<height>`, the
//! second half in pixels. Only the pixel half matters here: it is turned into
//! a default figure size in inches for the plotting backend.

use std::fmt;

use crate::error::{DisplayError, Result};

/// Share of the window width a new figure takes
const WIDTH_FRACTION: f64 = 0.8;

/// Share of the window height a new figure takes
const HEIGHT_FRACTION: f64 = 0.7;

/// Parsed window-size string
#[derive(Clone, Debug, PartialEq)]
pub struct WindowSize {
    /// Character dimensions, kept verbatim
    pub chars: String,
    /// Pixel width and height, when reported
    pub pixels: Option<(f64, f64)>,
}

impl WindowSize {
    /// Parse `<cols>x<rows>;<width>x<height>`. A missing pixel half is not
    /// an error; a malformed one is.
    pub fn parse(spec: &str) -> Result<Self> {
        let (chars, pixel_dims) = spec.split_once(';').unwrap_or((spec, ""));
        let pixel_dims = pixel_dims.trim();
        if pixel_dims.is_empty() {
            return Ok(Self {
                chars: chars.to_string(),
                pixels: None,
            });
        }

        let lowered = pixel_dims.to_lowercase();
        let parts: Vec<&str> = lowered.split('x').collect();
        let [width, height] = parts.as_slice() else {
            return Err(config_error(format!(
                "expected <width>x<height> pixels, got '{}'",
                pixel_dims
            )));
        };
        let width = parse_pixels(width)?;
        let height = parse_pixels(height)?;
        Ok(Self {
            chars: chars.to_string(),
            pixels: Some((width, height)),
        })
    }

    /// Ask the controlling terminal for its size
    pub fn detect() -> Option<String> {
        let size = crossterm::terminal::window_size().ok()?;
        if size.width == 0 || size.height == 0 {
            return None;
        }
        Some(format!(
            "{}x{};{}x{}",
            size.columns, size.rows, size.width, size.height
        ))
    }

    /// Figure size for this window at `dpi`, if pixels are known
    pub fn figure_size(&self, dpi: f64) -> Result<Option<FigureSize>> {
        match self.pixels {
            Some((width, height)) => FigureSize::from_pixels(width, height, dpi).map(Some),
            None => Ok(None),
        }
    }
}

fn parse_pixels(text: &str) -> Result<f64> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|e: std::num::ParseFloatError| config_error(e.to_string()))?;
    if !value.is_finite() || value <= 0.0 {
        return Err(config_error(format!("pixel size must be positive, got {}", text.trim())));
    }
    Ok(value)
}

fn config_error(message: String) -> DisplayError {
    DisplayError::Configuration { message }
}

/// Figure size in inches
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FigureSize {
    pub width: f64,
    pub height: f64,
}

impl FigureSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Size that leaves some room around the figure in a window of the
    /// given pixel dimensions
    pub fn from_pixels(width: f64, height: f64, dpi: f64) -> Result<Self> {
        if !dpi.is_finite() || dpi <= 0.0 {
            return Err(config_error(format!("dpi must be positive, got {}", dpi)));
        }
        Ok(Self {
            width: WIDTH_FRACTION * width / dpi,
            height: HEIGHT_FRACTION * height / dpi,
        })
    }
}

impl Default for FigureSize {
    fn default() -> Self {
        Self::new(4.0, 3.0)
    }
}

impl fmt::Display for FigureSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}, {:.2}", self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_spec() {
        let size = WindowSize::parse("80x24;1000X500").unwrap();
        assert_eq!(size.chars, "80x24");
        assert_eq!(size.pixels, Some((1000.0, 500.0)));
    }

    #[test]
    fn test_parse_without_pixels() {
        assert_eq!(WindowSize::parse("80x24").unwrap().pixels, None);
        assert_eq!(WindowSize::parse("80x24;").unwrap().pixels, None);
    }

    #[test]
    fn test_malformed_pixels_wrap_parse_error() {
        let err = WindowSize::parse("80x24;wide x 500").unwrap_err();
        assert!(matches!(err, DisplayError::Configuration { .. }));
        let message = err.to_string();
        assert!(message.starts_with("Error in resizing: "));
        assert!(message.contains("invalid float literal"));
    }

    #[test]
    fn test_wrong_arity() {
        let err = WindowSize::parse("80x24;100x200x300").unwrap_err();
        assert!(err.to_string().contains("100x200x300"));
    }

    #[test]
    fn test_figure_size_from_pixels() {
        let size = WindowSize::parse("80x24;1000x500").unwrap();
        let figure = size.figure_size(100.0).unwrap().unwrap();
        assert_eq!(figure.to_string(), "8.00, 3.50");
    }

    #[test]
    fn test_bad_dpi() {
        assert!(FigureSize::from_pixels(100.0, 100.0, 0.0).is_err());
    }
}
