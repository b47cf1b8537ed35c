//! CLI argument parsing
//!
//! Hand-rolled parsing of the `inlay` subcommands. Values given on the
//! command line override the configuration file.

use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use crate::blob::ImageFormat;

pub const USAGE: &str = "\
usage: inlay <command> [options]

commands:
  show <file>          embed an image, SVG or PDF file inline
      --overwrite          replace the previous image with the same key
      --key K              replace key
      --format F           format (default: from the file extension)
      --outfile P          write to P instead of the terminal
      --title T            alternate text
      --fullscreen         stretch to the terminal width
      --toggle             hide on click
      --limit N            byte budget
  value [<json>|-]     pretty-print a JSON document
      --depth N  --items N  --entries N  --string N
      --plain              print without markup
  html <markup>        frame markup directly
      --key K  --overwrite
  traceback [<file>|-] decorate traceback text
  size [<window-size>] print the figure size for a window
  config               print the effective configuration";

/// Subcommand to run
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    Show {
        path: PathBuf,
        overwrite: bool,
        key: Option<String>,
        format: Option<ImageFormat>,
        outfile: Option<PathBuf>,
        title: Option<String>,
        fullscreen: bool,
        toggle: bool,
        limit: Option<usize>,
    },
    Value {
        /// None reads stdin
        input: Option<PathBuf>,
        depth: Option<usize>,
        items: Option<usize>,
        entries: Option<usize>,
        string: Option<usize>,
        plain: bool,
    },
    Html {
        markup: String,
        key: Option<String>,
        overwrite: bool,
    },
    Traceback {
        input: Option<PathBuf>,
    },
    Size {
        window_size: Option<String>,
    },
    Config,
    Help,
}

/// Parse the process arguments
pub fn parse_args() -> Result<Command> {
    parse_from(env::args().skip(1)) // Skip the binary name
}

/// Parse arguments following the binary name
pub fn parse_from<I>(args: I) -> Result<Command>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let mut iter = args.into_iter().map(Into::<String>::into);
    let Some(command) = iter.next() else {
        return Ok(Command::Help);
    };

    match command.as_str() {
        "show" => {
            let mut path = None;
            let mut overwrite = false;
            let mut key = None;
            let mut format = None;
            let mut outfile = None;
            let mut title = None;
            let mut fullscreen = false;
            let mut toggle = false;
            let mut limit = None;

            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--overwrite" | "-o" => overwrite = true,
                    "--key" | "-k" => key = Some(value(&mut iter, &arg)?),
                    "--format" | "-f" => {
                        format = Some(ImageFormat::parse(&value(&mut iter, &arg)?))
                    }
                    "--outfile" => outfile = Some(PathBuf::from(value(&mut iter, &arg)?)),
                    "--title" | "-t" => title = Some(value(&mut iter, &arg)?),
                    "--fullscreen" => fullscreen = true,
                    "--toggle" => toggle = true,
                    "--limit" => limit = Some(number(&mut iter, &arg)?),
                    _ if !arg.starts_with('-') && path.is_none() => path = Some(PathBuf::from(arg)),
                    _ => bail!("unexpected argument '{}' for show", arg),
                }
            }

            Ok(Command::Show {
                path: path.context("show needs a file")?,
                overwrite,
                key,
                format,
                outfile,
                title,
                fullscreen,
                toggle,
                limit,
            })
        }
        "value" => {
            let mut input = None;
            let mut depth = None;
            let mut items = None;
            let mut entries = None;
            let mut string = None;
            let mut plain = false;

            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--depth" | "-d" => depth = Some(number(&mut iter, &arg)?),
                    "--items" => items = Some(number(&mut iter, &arg)?),
                    "--entries" => entries = Some(number(&mut iter, &arg)?),
                    "--string" => string = Some(number(&mut iter, &arg)?),
                    "--plain" => plain = true,
                    "-" => input = None,
                    _ if !arg.starts_with('-') && input.is_none() => {
                        input = Some(PathBuf::from(arg))
                    }
                    _ => bail!("unexpected argument '{}' for value", arg),
                }
            }

            Ok(Command::Value {
                input,
                depth,
                items,
                entries,
                string,
                plain,
            })
        }
        "html" => {
            let mut markup = None;
            let mut key = None;
            let mut overwrite = false;

            while let Some(arg) = iter.next() {
                match arg.as_str() {
                    "--overwrite" | "-o" => overwrite = true,
                    "--key" | "-k" => key = Some(value(&mut iter, &arg)?),
                    _ if markup.is_none() => markup = Some(arg),
                    _ => bail!("unexpected argument '{}' for html", arg),
                }
            }

            Ok(Command::Html {
                markup: markup.context("html needs markup")?,
                key,
                overwrite,
            })
        }
        "traceback" | "tb" => {
            let input = iter.next().filter(|a| a != "-").map(PathBuf::from);
            Ok(Command::Traceback { input })
        }
        "size" => Ok(Command::Size {
            window_size: iter.next(),
        }),
        "config" => Ok(Command::Config),
        "help" | "--help" | "-h" => Ok(Command::Help),
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }
}

fn value(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    iter.next()
        .with_context(|| format!("{} needs a value", flag))
}

fn number(iter: &mut impl Iterator<Item = String>, flag: &str) -> Result<usize> {
    let text = value(iter, flag)?;
    text.parse()
        .with_context(|| format!("{} expects a number, got '{}'", flag, text))
}
