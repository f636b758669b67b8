//! `pathsense-cli` – PathSense Command Line Interface
//!
//! This binary is the primary entry point for a PathSense device or bench
//! session.  It:
//!
//! 1. Checks for `~/.pathsense/config.toml`; runs a **First-Run Wizard**
//!    when the file is absent.
//! 2. Assembles the device control loop (simulated range beams on a bench,
//!    the configured storage backend for the map).
//! 3. Drops the user into an **interactive shell** with slash-commands
//!    (`/fix`, `/waypoint`, `/goto`, `/route`, `/stats`, `/help`).
//! 4. Intercepts **Ctrl-C** to save the map and exit safely.

mod config;
mod shell;

use colored::Colorize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::warn;

use pathsense_map::{JsonFileStorage, MapStorage, SqliteStorage};
use pathsense_runtime::{telemetry, ControlLoop, ControlLoopConfig};
use pathsense_sense::SimRangeSensor;

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // init_tracing wires RUST_LOG filtering, the optional OTLP exporter
    // (OTEL_EXPORTER_OTLP_ENDPOINT), and PATHSENSE_LOG_FORMAT=json for
    // log aggregators.  The shell's user-facing output still uses
    // println! for UX consistency.
    let _telemetry_guard = telemetry::init_tracing("pathsense");

    print_banner();

    // ── Shared shutdown flag ──────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    let shutdown_clone = shutdown.clone();

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!(
            "{}",
            "⚠  Ctrl-C received – shutting down …".yellow().bold()
        );
        shutdown_clone.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }

    // ── First-Run Wizard ──────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(None) => run_first_run_wizard(),
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    // ── Device assembly ───────────────────────────────────────────────────
    let map_path = cfg.resolved_map_path();
    let storage: Box<dyn MapStorage> = match cfg.storage_backend {
        config::StorageBackend::Json => Box::new(JsonFileStorage::new(&map_path)),
        config::StorageBackend::Sqlite => Box::new(SqliteStorage::new(&map_path)),
    };
    println!(
        "  Map storage: {} ({})",
        map_path.display().to_string().bold(),
        cfg.storage_backend
    );

    let device = ControlLoop::new(
        ControlLoopConfig {
            save_interval: Duration::from_secs(cfg.save_interval_secs),
            snap_radius_m: cfg.snap_radius_m,
        },
        // Bench sessions run on simulated beams reporting open space;
        // hardware builds swap in real drivers here.
        SimRangeSensor::open("ranger_lower"),
        SimRangeSensor::open("ranger_upper"),
        storage,
    );

    println!();
    println!("  Type {} for a list of commands.\n", "/help".bold().cyan());

    // ── Interactive shell ─────────────────────────────────────────────────
    shell::run(device, shutdown);
}

// ─────────────────────────────────────────────────────────────────────────────
// First-Run Wizard
// ─────────────────────────────────────────────────────────────────────────────

fn run_first_run_wizard() -> config::Config {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║      PathSense First-Run Wizard      ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
    println!("  No configuration found.  Let's set up PathSense.\n");

    let mut cfg = config::Config::default();

    // Storage backend
    println!("  Which map storage backend would you like to use?");
    println!("    1) Single JSON file  (default, human-readable)");
    println!("    2) SQLite database");
    let choice = prompt_line("  Enter choice [1]: ", "1");
    if choice.trim() == "2" {
        cfg.storage_backend = config::StorageBackend::Sqlite;
        cfg.map_path = "~/.pathsense/map.db".to_string();
    }

    // Save interval
    let interval_str = prompt_line(
        &format!("  Autosave interval in seconds [{}]: ", cfg.save_interval_secs),
        &cfg.save_interval_secs.to_string(),
    );
    if let Ok(secs) = interval_str.trim().parse::<u64>() {
        cfg.save_interval_secs = secs;
    }

    match config::save(&cfg) {
        Ok(()) => println!(
            "\n  {} Config saved to {}\n",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => println!("{}: {}", "Error saving config".red(), e),
    }

    cfg
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"   ___      __  __   _____                "#.bold().cyan());
    println!("{}", r#"  / _ \___ / /_/ /  / ___/__ ___  ___ ___ "#.bold().cyan());
    println!("{}", r#" / ___/ _ `/ __/ _ \\__ \/ -_) _ \(_-</ -_)"#.bold().cyan());
    println!("{}", r#"/_/   \_,_/\__/_//_/___/\__/_//_/___/\__/ "#.bold().cyan());
    println!();
    println!(
        "  {} {}",
        "PathSense".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Smart Cane Spatial Memory");
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn prompt_line(msg: &str, default: &str) -> String {
    use std::io::{BufRead, Write};
    print!("{}", msg);
    std::io::stdout().flush().ok();
    let mut line = String::new();
    match std::io::stdin().lock().read_line(&mut line) {
        Ok(0) => default.to_string(),
        Ok(_) => {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                default.to_string()
            } else {
                trimmed.to_string()
            }
        }
        Err(_) => default.to_string(),
    }
}
