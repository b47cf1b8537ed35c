//! Figure capture adapter
//!
//! The plotting library stays on the other side of two traits:
//! - [`Figure`]: something that can serialize itself in a given format
//! - [`PlotBackend`]: the library's figure lifecycle (current figure, new
//!   figure, default size)
//!
//! [`FigureAdapter`] is what the library's integration shim binds its
//! draw/figure/show entry points to. It tracks cell and plot boundaries in
//! the [`Display`] state so that successive draws of the same plot overwrite
//! each other instead of piling up.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::blob::{ImageAttrs, ImageFormat};
use crate::config::Config;
use crate::display::{Display, FigureOptions};
use crate::error::Result;
use crate::window::{FigureSize, WindowSize};

/// Anything that can write itself out as an image
pub trait Figure {
    /// Serialize into `out` in `format`
    fn write_to(&self, out: &mut dyn Write, format: &ImageFormat) -> io::Result<()>;

    /// Serialize into a file
    fn save_to(&self, path: &Path, format: &ImageFormat) -> io::Result<()> {
        let mut file = BufWriter::new(File::create(path)?);
        self.write_to(&mut file, format)?;
        file.flush()
    }
}

/// Already-encoded image bytes
impl Figure for [u8] {
    fn write_to(&self, out: &mut dyn Write, _format: &ImageFormat) -> io::Result<()> {
        out.write_all(self)
    }
}

/// An image file on disk, streamed as-is (no format conversion)
#[derive(Clone, Debug)]
pub struct FileFigure {
    path: PathBuf,
}

impl FileFigure {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format implied by the file extension
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_path(&self.path)
    }
}

impl Figure for FileFigure {
    fn write_to(&self, out: &mut dyn Write, _format: &ImageFormat) -> io::Result<()> {
        let mut file = File::open(&self.path)?;
        io::copy(&mut file, out)?;
        Ok(())
    }

    fn save_to(&self, path: &Path, _format: &ImageFormat) -> io::Result<()> {
        fs::copy(&self.path, path).map(|_| ())
    }
}

/// The plotting library's side of the adapter
pub trait PlotBackend {
    /// The figure a draw or show should capture
    fn current_figure(&self) -> Option<&dyn Figure>;

    /// Start a new figure
    fn new_figure(&mut self);

    /// Whether the library redraws after every plotting call
    fn is_interactive(&self) -> bool {
        false
    }

    /// Default size for new figures
    fn set_figure_size(&mut self, size: FigureSize);

    /// Dots per inch used to convert pixels to inches, when the library
    /// has its own; otherwise the configured dpi applies
    fn dpi(&self) -> Option<f64> {
        None
    }
}

/// Adapter-wide defaults, usually taken from [`Config`]
#[derive(Clone, Debug)]
pub struct PlotDefaults {
    /// Format for draws and captures
    pub format: ImageFormat,
    /// Format for explicit shows
    pub show_format: ImageFormat,
    pub size_limit: usize,
    pub figsize: FigureSize,
    pub dpi: f64,
    /// Window-size string used by `resize` when none is given
    pub window_size: Option<String>,
}

impl Default for PlotDefaults {
    fn default() -> Self {
        Self {
            format: ImageFormat::default(),
            show_format: ImageFormat::Svg,
            size_limit: crate::blob::DEFAULT_SIZE_LIMIT,
            figsize: FigureSize::default(),
            dpi: 100.0,
            window_size: None,
        }
    }
}

impl From<&Config> for PlotDefaults {
    fn from(config: &Config) -> Self {
        Self {
            format: ImageFormat::parse(&config.format),
            show_format: ImageFormat::parse(&config.show_format),
            size_limit: config.size_limit,
            figsize: config.figure_size(),
            dpi: config.dpi,
            window_size: config.resolve_window_size(None),
        }
    }
}

/// Options for an explicit show
#[derive(Clone, Debug, Default)]
pub struct ShowOptions {
    /// Overwrite the previous figure; defaults to "not a new plot"
    pub overwrite: Option<bool>,
    pub format: Option<ImageFormat>,
    pub outfile: Option<PathBuf>,
    pub title: Option<String>,
    pub fullscreen: bool,
}

/// Binds a plotting backend to a display
pub struct FigureAdapter<B: PlotBackend> {
    backend: B,
    defaults: PlotDefaults,
}

impl<B: PlotBackend> FigureAdapter<B> {
    pub fn new(backend: B, defaults: PlotDefaults) -> Self {
        Self { backend, defaults }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn defaults(&self) -> &PlotDefaults {
        &self.defaults
    }

    /// Create the display state and apply the default figure size
    pub fn setup<W: Write>(&mut self, display: &mut Display<W>) {
        display.setup();
        self.backend.set_figure_size(self.defaults.figsize);
    }

    /// A new cell begins: its first draw is left to the cell machinery
    pub fn cell_start<W: Write>(&mut self, display: &mut Display<W>) -> Result<()> {
        display.state_mut()?.cell_just_started = true;
        self.figure(display)
    }

    pub fn cell_end<W: Write>(&mut self, display: &mut Display<W>) -> Result<()> {
        display.state()?;
        Ok(())
    }

    /// Start a new figure; its first draw appends
    pub fn figure<W: Write>(&mut self, display: &mut Display<W>) -> Result<()> {
        display.state_mut()?.is_new_logical_plot = true;
        self.backend.new_figure();
        Ok(())
    }

    /// Draw the current figure, replacing the previous draw of the same plot
    pub fn draw<W: Write>(&mut self, display: &mut Display<W>) -> Result<()> {
        let options = FigureOptions {
            overwrite: !display.state()?.is_new_logical_plot,
            format: self.defaults.format.clone(),
            size_limit: self.defaults.size_limit,
            ..Default::default()
        };
        self.display_current(display, &options)
    }

    /// Show the current figure with explicit options
    pub fn show<W: Write>(&mut self, display: &mut Display<W>, show: ShowOptions) -> Result<()> {
        let options = FigureOptions {
            overwrite: match show.overwrite {
                Some(overwrite) => overwrite,
                None => !display.state()?.is_new_logical_plot,
            },
            format: show.format.unwrap_or_else(|| self.defaults.show_format.clone()),
            outfile: show.outfile,
            attrs: ImageAttrs {
                title: show.title,
                fullscreen: show.fullscreen,
                ..Default::default()
            },
            size_limit: self.defaults.size_limit,
        };
        display.state()?;
        self.display_current(display, &options)
    }

    /// Opportunistic redraw after a plotting call (draw-if-interactive).
    ///
    /// Runs after arbitrary user operations, so it never fails.
    pub fn capture<W: Write>(&mut self, display: &mut Display<W>) {
        if !self.backend.is_interactive() || self.backend.current_figure().is_none() {
            return;
        }
        if let Err(e) = self.draw(display) {
            log::warn!("interactive redraw failed: {}", e);
        }
    }

    /// Size new figures to the terminal window
    pub fn resize<W: Write>(
        &mut self,
        display: &mut Display<W>,
        window_size: Option<&str>,
    ) -> Result<()> {
        display.state()?;
        let spec = match window_size.or(self.defaults.window_size.as_deref()) {
            Some(spec) if !spec.trim().is_empty() => spec,
            _ => return Ok(()),
        };
        let dpi = self.backend.dpi().unwrap_or(self.defaults.dpi);
        if let Some(size) = WindowSize::parse(spec)?.figure_size(dpi)? {
            log::debug!("resizing figures to {}", size);
            self.backend.set_figure_size(size);
        }
        Ok(())
    }

    /// New figure, shown right away
    pub fn new_figure<W: Write>(&mut self, display: &mut Display<W>) -> Result<()> {
        self.figure(display)?;
        self.show(display, ShowOptions::default())
    }

    /// Resize to the window, then start and show a new figure
    pub fn resize_new_figure<W: Write>(
        &mut self,
        display: &mut Display<W>,
        window_size: Option<&str>,
    ) -> Result<()> {
        self.resize(display, window_size)?;
        self.new_figure(display)
    }

    fn display_current<W: Write>(
        &mut self,
        display: &mut Display<W>,
        options: &FigureOptions,
    ) -> Result<()> {
        match self.backend.current_figure() {
            Some(figure) => display.display_figure(figure, options)?,
            None => log::debug!("no current figure to display"),
        }
        // also after file output: the next draw replaces rather than appends
        display.state_mut()?.is_new_logical_plot = false;
        Ok(())
    }
}
