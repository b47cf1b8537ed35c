//! Clickable, styled tracebacks
//!
//! Frame header lines of the form `  File "<path>", line <N>...` get an OSC 8
//! hyperlink to `file://<path>#position=<N>` and every physical line is
//! wrapped in a styled region, so the terminal can show the whole report as
//! error output and jump to the faulting source line.
//!
//! [`install`] hooks this into panics. The hook must never panic itself (a
//! panic inside a panic hook aborts the process), so everything on that path
//! degrades through `Option` to the undecorated text.

use std::backtrace::Backtrace;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Write};
use std::panic::{self, PanicHookInfo};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use regex::Regex;

use crate::escape;

/// Pseudo-path of code typed at an interactive prompt; never linked
pub const ANONYMOUS_INPUT: &str = "<stdin>";

static INSTALLED: AtomicBool = AtomicBool::new(false);

fn frame_header() -> Option<&'static Regex> {
    static HEADER: OnceLock<Option<Regex>> = OnceLock::new();
    HEADER
        .get_or_init(|| Regex::new(r#"^  File "(.*)", line ([0-9]+)(.*)$"#).ok())
        .as_ref()
}

fn link_header(re: &Regex, line: &str) -> String {
    let Some(caps) = re.captures(line) else {
        return line.to_string();
    };
    let (path, number, rest) = (&caps[1], &caps[2], &caps[3]);
    if path == ANONYMOUS_INPUT {
        return line.to_string();
    }
    let target = format!("file://{}#position={}", path, number);
    format!(
        "  {}{}",
        escape::hyperlink(&target, &format!("File \"{}\", line {}", path, number)),
        rest
    )
}

fn try_decorate(text: &str) -> Option<String> {
    let re = frame_header()?;
    let mut out = String::with_capacity(text.len() * 2);
    for line in text.lines() {
        out.push_str(&escape::styled(&link_header(re, line)));
        out.push('\n');
    }
    Some(out)
}

/// Decorate a single physical line
pub fn decorate_line(line: &str) -> String {
    match frame_header() {
        Some(re) => escape::styled(&link_header(re, line)),
        None => line.to_string(),
    }
}

/// Decorate traceback text, one styled region per line
pub fn decorate(text: &str) -> String {
    try_decorate(text).unwrap_or_else(|| text.to_string())
}

/// Decorate pre-split traceback entries; an entry may span several lines
pub fn decorate_entries<S: AsRef<str>>(entries: &[S]) -> String {
    entries.iter().map(|entry| decorate(entry.as_ref())).collect()
}

/// One call frame with a source location
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub path: String,
    pub line: u32,
    pub function: Option<String>,
}

impl Frame {
    /// Header line plus the source line when the file can be read
    pub fn entry(&self) -> String {
        let mut entry = format!("  File \"{}\", line {}", self.path, self.line);
        if let Some(function) = &self.function {
            let _ = write!(entry, ", in {}", function);
        }
        entry.push('\n');
        if let Some(source) = source_line(&self.path, self.line) {
            let _ = writeln!(entry, "    {}", source);
        }
        entry
    }
}

fn source_line(path: &str, line: u32) -> Option<String> {
    if path == ANONYMOUS_INPUT {
        return None;
    }
    let index = usize::try_from(line).ok()?.checked_sub(1)?;
    let text = fs::read_to_string(path).ok()?;
    let source = text.lines().nth(index)?.trim();
    (!source.is_empty()).then(|| source.to_string())
}

/// A panic in the multi-frame text form, most recent call last
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Traceback {
    pub frames: Vec<Frame>,
    pub summary: String,
}

impl Traceback {
    /// Frames from the text form of a [`Backtrace`].
    ///
    /// Frames without a source location and frames inside the standard
    /// library are left out.
    pub fn frames_from_backtrace(text: &str) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut function: Option<String> = None;
        for line in text.lines().map(str::trim) {
            if let Some(location) = line.strip_prefix("at ") {
                let Some(frame) = parse_location(location, function.clone()) else {
                    continue;
                };
                if !frame.path.starts_with("/rustc/") {
                    frames.push(frame);
                }
                continue;
            }
            if let Some((index, symbol)) = line.split_once(": ") {
                if index.chars().all(|c| c.is_ascii_digit()) {
                    function = Some(symbol.to_string());
                }
            }
        }
        frames.reverse();
        frames
    }

    pub fn new(frames: Vec<Frame>, summary: impl Into<String>) -> Self {
        Self {
            frames,
            summary: summary.into(),
        }
    }

    /// Capture the current panic
    pub fn from_panic(info: &PanicHookInfo<'_>, backtrace: &Backtrace) -> Self {
        let thread = std::thread::current();
        let name = thread.name().unwrap_or("<unnamed>");
        let message = panic_message(info);
        let mut frames = Self::frames_from_backtrace(&backtrace.to_string());

        let summary = match info.location() {
            Some(location) => {
                if frames.is_empty() {
                    frames.push(Frame {
                        path: absolute_path(location.file()),
                        line: location.line(),
                        function: None,
                    });
                }
                format!(
                    "thread '{}' panicked at {}:{}:{}:\n{}",
                    name,
                    location.file(),
                    location.line(),
                    location.column(),
                    message
                )
            }
            None => format!("thread '{}' panicked:\n{}", name, message),
        };
        Self::new(frames, summary)
    }

    /// Entries in order: heading, one per frame, then the summary
    pub fn entries(&self) -> Vec<String> {
        let mut entries = Vec::with_capacity(self.frames.len() + 2);
        if !self.frames.is_empty() {
            entries.push("Traceback (most recent call last):\n".to_string());
        }
        entries.extend(self.frames.iter().map(Frame::entry));
        entries.push(format!("{}\n", self.summary));
        entries
    }

    /// Undecorated text form
    pub fn to_text(&self) -> String {
        self.entries().concat()
    }
}

fn parse_location(location: &str, function: Option<String>) -> Option<Frame> {
    // path:line:column, where the path itself may contain ':'
    let (rest, _column) = location.rsplit_once(':')?;
    let (path, line) = rest.rsplit_once(':')?;
    Some(Frame {
        path: absolute_path(path),
        line: line.parse().ok()?,
        function,
    })
}

/// Resolve a relative frame path against the working directory, since a
/// relative `file://` target would read its first component as a host
fn absolute_path(path: &str) -> String {
    let relative = Path::new(path);
    if relative.is_absolute() {
        return path.to_string();
    }
    let relative = relative.strip_prefix("./").unwrap_or(relative);
    match env::current_dir() {
        Ok(dir) => dir.join(relative).display().to_string(),
        Err(_) => relative.display().to_string(),
    }
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Report panics as decorated tracebacks on stderr.
///
/// Installing twice is a no-op.
pub fn install() {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        report_panic(info, &mut io::stderr().lock(), &*previous);
    }));
}

/// Body of the installed hook: write the report, or hand the panic to
/// `previous` when `out` cannot take it
fn report_panic(
    info: &PanicHookInfo<'_>,
    out: &mut dyn Write,
    previous: &dyn Fn(&PanicHookInfo<'_>),
) {
    if write_report(info, out).is_err() {
        previous(info);
    }
}

fn write_report(info: &PanicHookInfo<'_>, out: &mut dyn Write) -> io::Result<()> {
    let backtrace = Backtrace::force_capture();
    let text = Traceback::from_panic(info, &backtrace).to_text();
    let report = match try_decorate(&text) {
        Some(decorated) => decorated,
        None => {
            log::warn!("traceback decoration unavailable, printing plain text");
            text
        }
    };
    out.write_all(report.as_bytes())?;
    out.flush()
}

/// Restore the default panic hook. Uninstalling twice is a no-op.
pub fn uninstall() {
    if !INSTALLED.swap(false, Ordering::SeqCst) {
        return;
    }
    let _ = panic::take_hook();
}

pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex, MutexGuard};

    const LINK_OPEN: &str = "\x1b]8;;";

    /// The panic hook is process-wide; tests that swap it take turns
    fn hook_lock() -> MutexGuard<'static, ()> {
        static LOCK: Mutex<()> = Mutex::new(());
        LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Panic once with `hook` installed, then put the old hook back
    fn panic_with_hook(hook: impl Fn(&PanicHookInfo<'_>) + Sync + Send + 'static) {
        let _guard = hook_lock();
        let saved = panic::take_hook();
        panic::set_hook(Box::new(hook));
        let result = panic::catch_unwind(|| panic!("boom in {}", "worker"));
        let _ = panic::take_hook();
        panic::set_hook(saved);
        assert!(result.is_err());
    }

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_real_path_is_linked() {
        let line = r#"  File "/src/app.py", line 12, in main"#;
        assert_eq!(
            decorate_line(line),
            concat!(
                "\x1b[12u  \x1b]8;;file:///src/app.py#position=12\x07",
                "File \"/src/app.py\", line 12\x1b]8;;\x07, in main\x1b[11u",
            )
        );
    }

    #[test]
    fn test_exactly_one_link_pair() {
        let out = decorate_line(r#"  File "a.rs", line 3"#);
        assert_eq!(out.matches(LINK_OPEN).count(), 2);
        assert!(out.contains("line 3\x1b]8;;\x07\x1b[11u"));
    }

    #[test]
    fn test_anonymous_input_is_not_linked() {
        let line = r#"  File "<stdin>", line 1, in <module>"#;
        assert_eq!(decorate_line(line), format!("\x1b[12u{}\x1b[11u", line));
    }

    #[test]
    fn test_every_line_styled() {
        let text = concat!(
            "Traceback (most recent call last):\n",
            "  File \"x.py\", line 2, in f\n",
            "    boom()\n",
            "ValueError: bad\n",
        );
        let out = decorate(text);
        assert_eq!(out.lines().count(), 4);
        for line in out.lines() {
            assert!(line.starts_with("\x1b[12u"));
            assert!(line.ends_with("\x1b[11u"));
        }
        assert!(out.contains("\x1b[12u    boom()\x1b[11u\n"));
    }

    #[test]
    fn test_entries_split_into_lines() {
        let entries = ["  File \"m.py\", line 7, in g\n    x = 1\n", "KeyError: 'k'\n"];
        let out = decorate_entries(&entries);
        assert_eq!(out.matches("\x1b[12u").count(), 3);
        assert_eq!(out.matches(LINK_OPEN).count(), 2);
    }

    #[test]
    fn test_header_needs_exact_indent() {
        let line = r#"    File "a.py", line 1"#;
        assert!(!decorate_line(line).contains(LINK_OPEN));
    }

    #[test]
    fn test_frames_from_backtrace() {
        let text = "   0: std::panicking::begin_panic
             at /rustc/abc/library/std/src/panicking.rs:652:5
   1: inlay::worker::step
             at ./src/worker.rs:10:9
   2: inlay::main
             at ./src/main.rs:3:5
   3: __libc_start_main
";
        let frames = Traceback::frames_from_backtrace(text);
        assert_eq!(
            frames,
            vec![
                Frame {
                    path: absolute_path("src/main.rs"),
                    line: 3,
                    function: Some("inlay::main".into()),
                },
                Frame {
                    path: absolute_path("src/worker.rs"),
                    line: 10,
                    function: Some("inlay::worker::step".into()),
                },
            ]
        );
    }

    #[test]
    fn test_traceback_text_decorates() {
        let traceback = Traceback::new(
            vec![Frame {
                path: "/nonexistent/lib.rs".into(),
                line: 42,
                function: Some("lib::run".into()),
            }],
            "thread 'main' panicked at /nonexistent/lib.rs:42:1:\nboom",
        );
        let text = traceback.to_text();
        assert_eq!(
            text,
            concat!(
                "Traceback (most recent call last):\n",
                "  File \"/nonexistent/lib.rs\", line 42, in lib::run\n",
                "thread 'main' panicked at /nonexistent/lib.rs:42:1:\n",
                "boom\n",
            )
        );
        let out = decorate(&text);
        assert!(out.contains("file:///nonexistent/lib.rs#position=42"));
        assert_eq!(out.lines().count(), 4);
    }

    #[test]
    fn test_frame_entry_reads_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.rs");
        fs::write(&path, "fn main() {\n    explode();\n}\n").unwrap();
        let frame = Frame {
            path: path.display().to_string(),
            line: 2,
            function: None,
        };
        assert!(frame.entry().ends_with(", line 2\n    explode();\n"));
    }

    #[test]
    fn test_relative_paths_become_absolute() {
        let cwd = env::current_dir().unwrap();
        assert_eq!(absolute_path("./src/main.rs"), cwd.join("src/main.rs").display().to_string());
        assert_eq!(absolute_path("/abs/lib.rs"), "/abs/lib.rs");

        let frame = parse_location("./src/main.rs:3:5", None).unwrap();
        let out = decorate(&frame.entry());
        assert!(out.contains(&format!("file://{}#position=3", cwd.join("src/main.rs").display())));
        assert!(!out.contains("file://src/"));
    }

    #[test]
    fn test_panic_report_is_decorated() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&captured);
        panic_with_hook(move |info| {
            let mut out = Vec::new();
            report_panic(info, &mut out, &|_: &PanicHookInfo<'_>| {});
            *sink.lock().unwrap_or_else(|e| e.into_inner()) = out;
        });

        let report = String::from_utf8(captured.lock().unwrap().clone()).unwrap();
        assert!(report.contains("boom in worker"));
        assert!(report.contains("panicked at "));
        assert!(report.contains("file:///"));
        assert!(report.contains(file!().rsplit('/').next().unwrap()));
        for line in report.lines() {
            assert!(line.starts_with(escape::STYLED_START));
            assert!(line.ends_with(escape::STYLED_END));
        }
    }

    #[test]
    fn test_unwritable_report_falls_back_to_previous_hook() {
        let called = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&called);
        panic_with_hook(move |info| {
            report_panic(info, &mut Closed, &|_: &PanicHookInfo<'_>| {
                flag.store(true, Ordering::SeqCst)
            });
        });
        assert!(called.load(Ordering::SeqCst));
    }

    #[test]
    fn test_install_is_idempotent() {
        let _guard = hook_lock();
        install();
        install();
        assert!(is_installed());
        uninstall();
        uninstall();
        assert!(!is_installed());
    }
}
