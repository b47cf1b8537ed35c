//! Display context: output stream, lifecycle state and the re-entrancy guard
//!
//! Everything that writes to the terminal goes through a [`Display`]. It is
//! passed explicitly to the figure adapter and the display hook instead of
//! living in a global, so the overwrite-by-key slot has a single owner.

use std::io::{self, Write};
use std::path::PathBuf;

use crate::blob::{self, ImageAttrs, ImageFormat, DEFAULT_SIZE_LIMIT};
use crate::config::Config;
use crate::error::{DisplayError, Result};
use crate::figure::Figure;
use crate::framer;

/// Default replace key for figures
pub const DEFAULT_KEY: &str = "inline_image";

/// Figure lifecycle state, reset by `setup()`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayState {
    /// A cell started and its first draw has not happened yet
    pub cell_just_started: bool,
    /// The next draw starts a new plot (append rather than overwrite)
    pub is_new_logical_plot: bool,
    /// An encode/frame call is running
    pub render_in_progress: bool,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            cell_just_started: false,
            is_new_logical_plot: true,
            render_in_progress: false,
        }
    }
}

/// Per-call options for [`Display::display_figure`]
#[derive(Clone, Debug)]
pub struct FigureOptions {
    /// Replace the last figure instead of appending
    pub overwrite: bool,
    pub format: ImageFormat,
    /// File-output mode: save here and skip the terminal entirely
    pub outfile: Option<PathBuf>,
    pub attrs: ImageAttrs,
    pub size_limit: usize,
}

impl Default for FigureOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            format: ImageFormat::default(),
            outfile: None,
            attrs: ImageAttrs::default(),
            size_limit: DEFAULT_SIZE_LIMIT,
        }
    }
}

/// Output stream plus the state that ties successive figures together
pub struct Display<W: Write = io::Stdout> {
    out: W,
    state: DisplayState,
    /// Whether `setup()` has run; the guard works either way
    initialized: bool,
    key: String,
    size_limit: usize,
}

impl Display<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> Display<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            state: DisplayState::default(),
            initialized: false,
            key: DEFAULT_KEY.to_string(),
            size_limit: DEFAULT_SIZE_LIMIT,
        }
    }

    pub fn from_config(out: W, config: &Config) -> Self {
        Self::new(out)
            .with_key(&config.replace_key)
            .with_size_limit(config.size_limit)
    }

    pub fn with_key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    pub fn with_size_limit(mut self, size_limit: usize) -> Self {
        self.size_limit = size_limit;
        self
    }

    /// Create (or reset) the lifecycle state
    pub fn setup(&mut self) {
        self.state = DisplayState {
            render_in_progress: self.state.render_in_progress,
            ..DisplayState::default()
        };
        self.initialized = true;
    }

    pub fn is_setup(&self) -> bool {
        self.initialized
    }

    pub fn state(&self) -> Result<&DisplayState> {
        if !self.initialized {
            return Err(DisplayError::SetupOrder);
        }
        Ok(&self.state)
    }

    pub fn state_mut(&mut self) -> Result<&mut DisplayState> {
        if !self.initialized {
            return Err(DisplayError::SetupOrder);
        }
        Ok(&mut self.state)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn size_limit(&self) -> usize {
        self.size_limit
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Run `f` with the re-entrancy guard held, set up or not.
    ///
    /// Returns `Ok(None)` without running `f` when another render is
    /// already in progress.
    pub(crate) fn guarded<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<Option<T>> {
        if self.state.render_in_progress {
            log::debug!("display already in progress, dropping nested output");
            return Ok(None);
        }
        self.state.render_in_progress = true;
        let result = f(self);
        self.state.render_in_progress = false;
        result.map(Some)
    }

    /// Encode a figure and show it in the figure slot.
    ///
    /// The first draw after a cell starts only flips the state: the cell
    /// machinery shows that figure itself.
    pub fn display_figure<F: Figure + ?Sized>(
        &mut self,
        figure: &F,
        options: &FigureOptions,
    ) -> Result<()> {
        if let Some(path) = &options.outfile {
            return blob::write_file(figure, path, &options.format);
        }
        self.state()?;

        self.guarded(|display| {
            let html =
                blob::encode(figure, &options.format, options.size_limit)?.to_html(&options.attrs);
            let state = display.state_mut()?;
            if state.cell_just_started {
                state.cell_just_started = false;
                state.is_new_logical_plot = true;
                log::debug!("first draw of a new cell, not emitting");
                return Ok(());
            }
            framer::emit(&mut display.out, &html, &display.key, options.overwrite)?;
            Ok(())
        })
        .map(|_| ())
    }

    /// Show an in-memory payload of the given content type
    pub fn show_data(
        &mut self,
        content_type: &str,
        data: &[u8],
        overwrite: bool,
        attrs: &ImageAttrs,
    ) -> Result<()> {
        self.guarded(|display| {
            let blob = blob::encode_bytes(content_type, data, display.size_limit)?;
            framer::emit(&mut display.out, &blob.to_html(attrs), &display.key, overwrite)?;
            Ok(())
        })
        .map(|_| ())
    }

    /// Frame arbitrary markup for `key`
    pub fn show_html(&mut self, markup: &str, key: &str, overwrite: bool) -> Result<()> {
        self.guarded(|display| Ok(framer::emit(&mut display.out, markup, key, overwrite)?))
            .map(|_| ())
    }

    /// Write markup in the basic print envelope
    pub fn print_html(&mut self, markup: &str) -> Result<()> {
        self.guarded(|display| Ok(framer::print_html(&mut display.out, markup)?))
            .map(|_| ())
    }

    /// Write text, optionally followed by a newline, and flush
    pub(crate) fn write_text(&mut self, text: &str, newline: bool) -> Result<()> {
        self.out.write_all(text.as_bytes())?;
        if newline {
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        Ok(())
    }
}
