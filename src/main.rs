use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use env_logger::{Builder, Env, Target};

use inlay::cli::{self, Command, USAGE};
use inlay::{
    traceback, Config, Display, DisplayHook, FigureOptions, FileFigure, ImageAttrs, ImageFormat,
    Value, WindowSize,
};

fn main() -> Result<()> {
    Builder::from_env(Env::default().default_filter_or("warn"))
        .target(Target::Stderr)
        .init();
    traceback::install();

    let command = cli::parse_args()?;
    let config = Config::load()?;
    run(command, &config)
}

fn run(command: Command, config: &Config) -> Result<()> {
    match command {
        Command::Show {
            path,
            overwrite,
            key,
            format,
            outfile,
            title,
            fullscreen,
            toggle,
            limit,
        } => {
            let figure = FileFigure::new(&path);
            let format = format
                .or_else(|| figure.format())
                .unwrap_or_else(|| ImageFormat::parse(&config.format));
            let options = FigureOptions {
                overwrite,
                format,
                outfile,
                attrs: ImageAttrs {
                    toggle,
                    title,
                    fullscreen,
                    ..Default::default()
                },
                size_limit: limit.unwrap_or(config.size_limit),
            };

            let mut display = Display::from_config(io::stdout(), config);
            if let Some(key) = &key {
                display = display.with_key(key);
            }
            display.setup();
            display
                .display_figure(&figure, &options)
                .with_context(|| format!("Failed to show {}", path.display()))?;
        }
        Command::Value {
            input,
            depth,
            items,
            entries,
            string,
            plain,
        } => {
            let text = read_input(input.as_deref())?;
            let json: serde_json::Value =
                serde_json::from_str(&text).context("Failed to parse JSON input")?;

            let mut ctx = config.render_context();
            ctx.depth = depth.unwrap_or(ctx.depth);
            ctx.max_items = items.unwrap_or(ctx.max_items);
            ctx.max_entries = entries.unwrap_or(ctx.max_entries);
            ctx.max_string = string.unwrap_or(ctx.max_string);

            let mut hook = DisplayHook::new(ctx);
            hook.set_enabled(config.notebook && !plain);
            let mut display = Display::from_config(io::stdout(), config);
            display.setup();
            hook.invoke(&mut display, &Value::from(json))?;
        }
        Command::Html {
            markup,
            key,
            overwrite,
        } => {
            let mut display = Display::from_config(io::stdout(), config);
            let key = key.unwrap_or_else(|| config.replace_key.clone());
            display.show_html(&markup, &key, overwrite)?;
        }
        Command::Traceback { input } => {
            let text = read_input(input.as_deref())?;
            let mut stdout = io::stdout().lock();
            stdout.write_all(traceback::decorate(&text).as_bytes())?;
            stdout.flush()?;
        }
        Command::Size { window_size } => {
            let Some(spec) = config.resolve_window_size(window_size.as_deref()) else {
                bail!("window size unknown: pass one or set INLAY_WINDOW_SIZE");
            };
            let size = WindowSize::parse(&spec)?;
            match size.figure_size(config.dpi)? {
                Some(figure) => println!("{}", figure),
                None => bail!("window size '{}' has no pixel dimensions", spec),
            }
        }
        Command::Config => print!("{}", config.to_toml()?),
        Command::Help => println!("{}", USAGE),
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}
