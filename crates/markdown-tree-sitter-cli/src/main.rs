use anyhow::{Context, Result};
use clap::Parser;
use markdown_tree_sitter_config::Config;
use markdown_tree_sitter_engine::{Converter, Options, Registry};
use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
    process,
};

/// Convert Markdown to HTML, passing code through a syntax highlighter.
#[derive(Parser, Debug)]
#[command(name = "markdown-tree-sitter")]
#[command(version)]
struct Args {
    /// Markdown file to convert. Reads stdin when omitted or `-`.
    input: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Highlighter to use, overriding the config file
    #[arg(long, conflicts_with = "no_highlighter")]
    highlighter: Option<String>,

    /// Render code without any highlighter
    #[arg(long)]
    no_highlighter: bool,

    /// Directory holding tree-sitter grammars
    #[arg(long, value_name = "DIR")]
    parsers_dir: Option<PathBuf>,

    /// Print the registered highlighter names and exit
    #[arg(long)]
    list_highlighters: bool,
}

fn main() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Warn)
        .parse_default_env()
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    if args.list_highlighters {
        let mut stdout = io::stdout().lock();
        for name in Registry::builtin().names() {
            writeln!(stdout, "{name}")?;
        }
        return Ok(());
    }

    let config = load_config(args.config.as_deref())?;
    let options = apply_overrides(Options::from(config), &args);
    log::debug!("Converting with {options:?}");

    let markdown = read_input(args.input.as_deref())?;
    let conversion = Converter::new(options).convert(&markdown)?;
    log::debug!(
        "Converted {} bytes of Markdown with {} warning(s)",
        markdown.len(),
        conversion.warnings.len()
    );

    let mut stdout = io::stdout().lock();
    stdout.write_all(conversion.html.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

fn load_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => Config::load_from_path(path)?
            .with_context(|| format!("config file '{}' not found", path.display())),
        None => {
            let config = Config::load()?;
            if config.is_some() {
                log::info!("Loaded config from {}", Config::config_path().display());
            }
            Ok(config.unwrap_or_default())
        }
    }
}

fn apply_overrides(mut options: Options, args: &Args) -> Options {
    if args.no_highlighter {
        options.syntax_highlighter = None;
    } else if let Some(name) = &args.highlighter {
        options.syntax_highlighter = Some(name.clone());
    }
    if let Some(dir) = &args.parsers_dir {
        options.syntax_highlighter_opts.tree_sitter_parsers_dir = Some(dir.clone());
    }
    options
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display())),
        _ => {
            let mut markdown = String::new();
            io::stdin()
                .read_to_string(&mut markdown)
                .context("failed to read stdin")?;
            Ok(markdown)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["markdown-tree-sitter"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn flags_override_config() {
        let options = Options::default().with_highlighter("from-config");
        let options = apply_overrides(options, &args(&["--highlighter", "tree-sitter"]));
        assert_eq!(options.syntax_highlighter.as_deref(), Some("tree-sitter"));
    }

    #[test]
    fn no_highlighter_clears_config_choice() {
        let options = Options::default().with_highlighter("tree-sitter");
        let options = apply_overrides(options, &args(&["--no-highlighter"]));
        assert_eq!(options.syntax_highlighter, None);
    }

    #[test]
    fn parsers_dir_flag_is_applied() {
        let options = apply_overrides(Options::default(), &args(&["--parsers-dir", "/p"]));
        assert_eq!(
            options.syntax_highlighter_opts.tree_sitter_parsers_dir,
            Some(PathBuf::from("/p"))
        );
    }

    #[test]
    fn highlighter_flags_conflict() {
        let result = Args::try_parse_from([
            "markdown-tree-sitter",
            "--highlighter",
            "tree-sitter",
            "--no-highlighter",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let err = load_config(Some(Path::new("/no/such/config.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
