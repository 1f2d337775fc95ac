//! Katari command line front end.
//!
//! Usage:
//!   katari menu /root/admin/users --grant "administer users"
//!   katari deps /lib/calendar.js --debug
//!   katari bundle /lib/calendar.js --out calendar.bundle.js

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use katari_kernel::config::Config;
use katari_kernel::error::{AppError, AppResult};
use katari_kernel::jsmodule::{
    BundleCache, Bundler, DependencyResolver, ManifestFinder, ResolveDependencies,
};
use katari_kernel::menu::{AccessRules, MenuRegistry, MenuSelector, SecureMenuFilterer};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the menu entries to display for a selected path.
    Menu {
        /// Selected menu path, e.g. /root/admin/users.
        current: String,

        /// Menu level to list. Defaults to the children of `current`.
        #[arg(long)]
        level: Option<usize>,

        /// Permission granted to the current user (repeatable).
        #[arg(long = "grant")]
        grants: Vec<String>,

        /// Treat the current user as an administrator.
        #[arg(long)]
        admin: bool,

        /// Directory of `<module>.menu.json` files.
        #[arg(long)]
        menus_dir: Option<PathBuf>,
    },

    /// Print the scripts needed by the given scripts.
    Deps {
        /// Scripts requested by the page, e.g. /lib/calendar.js.
        #[arg(required = true)]
        files: Vec<String>,

        /// List scripts individually instead of bundling them.
        #[arg(long)]
        debug: bool,

        /// Root directory of scripts and manifests.
        #[arg(long)]
        js_root: Option<PathBuf>,
    },

    /// Write a bundle holding the given scripts and their dependencies.
    Bundle {
        #[arg(required = true)]
        files: Vec<String>,

        /// Output file. Defaults to standard output.
        #[arg(long)]
        out: Option<PathBuf>,

        #[arg(long)]
        js_root: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}

fn run(args: Args) -> AppResult<()> {
    let config = Config::from_env().context("failed to load configuration")?;

    match args.command {
        Command::Menu {
            current,
            level,
            grants,
            admin,
            menus_dir,
        } => {
            let menus_dir = menus_dir.unwrap_or_else(|| config.menus_dir.clone());
            let registry = MenuRegistry::load_dir(&menus_dir)?;
            info!(modules = registry.modules().len(), "menus loaded");

            let rules = match &config.access_rules {
                Some(path) => AccessRules::parse(path)?,
                None => AccessRules::default(),
            };
            let granted: HashSet<String> = grants.into_iter().collect();
            let filterer = SecureMenuFilterer::new(rules.for_principal(granted, admin));

            let selector = MenuSelector::new(registry.menu_bar(), filterer)
                .with_fallback_link(config.menu_fallback_link.clone());
            let entries = match level {
                Some(level) => selector.select_level(&current, level)?,
                None => selector.select_for_path(&current)?,
            };

            let json: Vec<_> = entries.iter().map(|e| e.to_json()).collect();
            print_json(&serde_json::Value::Array(json))
        }
        Command::Deps {
            files,
            debug,
            js_root,
        } => {
            let js_root = js_root.unwrap_or_else(|| config.js_root.clone());
            let debug = debug || config.debug;
            let command = ResolveDependencies::new(
                DependencyResolver::new(ManifestFinder::new(&js_root, debug)),
                Bundler::new(&js_root),
                Arc::new(BundleCache::new()),
                debug,
            )
            .with_bundle_path(config.bundle_path.clone());

            print_json(&command.execute(&files)?)
        }
        Command::Bundle {
            files,
            out,
            js_root,
        } => {
            let js_root = js_root.unwrap_or_else(|| config.js_root.clone());
            let resolver = DependencyResolver::new(ManifestFinder::new(&js_root, config.debug));
            let scripts = resolver.resolve(&files)?;
            let bundle = Bundler::new(&js_root).bundle_files(&scripts)?;

            match out {
                Some(path) => {
                    std::fs::write(&path, bundle)
                        .with_context(|| format!("failed to write {}", path.display()))?;
                    info!(path = %path.display(), scripts = scripts.len(), "bundle written");
                }
                None => print!("{bundle}"),
            }
            Ok(())
        }
    }
}

fn print_json(value: &serde_json::Value) -> AppResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Internal(anyhow::Error::new(e)))?;
    println!("{text}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
