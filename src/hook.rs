//! Auto-display of evaluated values
//!
//! A REPL hands every evaluated expression to [`DisplayHook::invoke`]. When
//! the hook is enabled the value goes through the bounded renderer and comes
//! out as pretty-printing markup; when disabled it prints the way a plain
//! REPL would.

use std::fmt;
use std::io::Write;

use crate::display::Display;
use crate::error::Result;
use crate::render::{self, Capability, RenderContext, Value};

/// Callback run before each enabled display, for its side effects only
pub type PreDisplay<W> = Box<dyn FnMut(&Value, &mut Display<W>)>;

pub struct DisplayHook<W: Write> {
    enabled: bool,
    pre_display: Option<PreDisplay<W>>,
    ctx: RenderContext,
}

impl<W: Write> DisplayHook<W> {
    pub fn new(ctx: RenderContext) -> Self {
        Self {
            enabled: false,
            pre_display: None,
            ctx,
        }
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Back to plain printing; the pre-display callback stays registered
    /// but is not consulted
    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn context(&self) -> RenderContext {
        self.ctx
    }

    pub fn set_context(&mut self, ctx: RenderContext) {
        self.ctx = ctx;
    }

    pub fn set_pre_display(&mut self, hook: impl FnMut(&Value, &mut Display<W>) + 'static) {
        self.pre_display = Some(Box::new(hook));
    }

    pub fn clear_pre_display(&mut self) {
        self.pre_display = None;
    }

    /// Display the result of an evaluation
    pub fn invoke(&mut self, display: &mut Display<W>, value: &Value) -> Result<()> {
        if value.is_null() {
            return Ok(());
        }
        if !self.enabled {
            return display.write_text(&value.to_string(), true);
        }

        let ctx = self.ctx;
        let pre_display = &mut self.pre_display;
        display
            .guarded(|display| {
                if let Some(hook) = pre_display.as_mut() {
                    hook(value, display);
                }
                let rendered = render::render(value, ctx);
                // rich markup is a complete envelope of its own
                let newline = !matches!(value.capability(), Capability::Rich(_));
                display.write_text(&rendered, newline)
            })
            .map(|_| ())
    }
}

impl<W: Write> Default for DisplayHook<W> {
    fn default() -> Self {
        Self::new(RenderContext::default())
    }
}

impl<W: Write> fmt::Debug for DisplayHook<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayHook")
            .field("enabled", &self.enabled)
            .field("pre_display", &self.pre_display.is_some())
            .field("ctx", &self.ctx)
            .finish()
    }
}
