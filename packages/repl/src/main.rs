use std::path::PathBuf;

use clap::Parser;
use modefile_core::TextEncoding;
use modefile_repl::config::{self, EditMode, ShellConfig};

/// modefile - Interactive shell for mode-aware file handles
#[derive(Parser, Debug)]
#[command(name = "modefile")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to <config dir>/modefile/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Identifier kind: numeric or text
    #[arg(long, value_parser = parse_id_kind)]
    id_kind: Option<modefile_core::IdentifierKind>,

    /// Default text encoding for new handles: utf-8, ascii or latin-1
    #[arg(long)]
    encoding: Option<TextEncoding>,

    /// Force vi editing mode
    #[arg(long, conflicts_with = "emacs")]
    vi: bool,

    /// Force emacs editing mode
    #[arg(long)]
    emacs: bool,

    /// Do not read or write command history
    #[arg(long)]
    no_history: bool,

    /// Log filter, e.g. `debug` or `modefile_core=trace` (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

fn parse_id_kind(value: &str) -> Result<modefile_core::IdentifierKind, String> {
    config::parse_identifier_kind(value)
        .ok_or_else(|| format!("expected `numeric` or `text`, got {:?}", value))
}

impl Args {
    fn apply(&self, config: &mut ShellConfig) {
        if let Some(kind) = self.id_kind {
            config.identifier_kind = kind;
        }
        if let Some(encoding) = self.encoding {
            config.default_encoding = encoding;
        }
        if self.vi {
            config.edit_mode = Some(EditMode::Vi);
        } else if self.emacs {
            config.edit_mode = Some(EditMode::Emacs);
        }
        if self.no_history {
            config.history = false;
        }
    }
}

fn main() {
    let args = Args::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(filter) = &args.log_level {
        logger.parse_filters(filter);
    }
    logger.init();

    let mut config = match ShellConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    args.apply(&mut config);
    log::debug!("Starting with {:?}", config);

    if let Err(e) = modefile_repl::run(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
