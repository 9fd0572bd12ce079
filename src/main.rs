use anyhow::{Context, Result};
use fs2::FileExt;
use signal_hook::{
    consts::signal::{SIGINT, SIGTERM},
    iterator::Signals,
};
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
    sync::atomic::{AtomicBool, Ordering},
    thread,
    time::Duration,
};

use poolpump::args::{CliAction, ParsedArgs, display_help, display_version_info};
use poolpump::constants::*;
use poolpump::host::{FileStateReader, FileStatusSink, FileSwitch, PumpSwitch};
use poolpump::manager::{CycleReport, PoolPumpManager, SwitchOutcome};
use poolpump::sun::sunrise_provider_from_config;
use poolpump::{Config, Log};

const CHECK_INTERVAL: Duration = Duration::from_secs(CHECK_INTERVAL_SECS);

/// Release the lock and remove the lock file.
fn cleanup(lock_file: File, lock_path: &Path) {
    Log::log_decorated("Performing cleanup...");

    drop(lock_file);

    if let Err(e) = std::fs::remove_file(lock_path) {
        Log::log_decorated(&format!("Warning: Failed to remove lock file: {}", e));
    } else {
        Log::log_decorated("Lock file removed successfully");
    }

    Log::log_decorated("Cleanup complete");
}

/// Load the explicit config file, or the default one (created when missing).
fn load_config(config_path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    match config_path {
        Some(path) => Ok((Config::load_from_path(&path)?, path)),
        None => Ok((Config::load()?, Config::get_config_path()?)),
    }
}

/// Load the configuration while holding the instance lock.
///
/// On failure the lock is released and the lock file removed before the error is returned.
fn load_config_holding_lock(
    config_path: Option<PathBuf>,
    lock_file: File,
    lock_path: &Path,
) -> Result<(Config, PathBuf, File)> {
    match load_config(config_path) {
        Ok((config, shown_path)) => Ok((config, shown_path, lock_file)),
        Err(e) => {
            Log::log_critical(&format!("Failed to load configuration: {:#}", e));
            cleanup(lock_file, lock_path);
            Log::log_end();
            Err(e)
        }
    }
}

fn log_report(report: &CycleReport) {
    match report {
        CycleReport::Manual { mode } => {
            Log::log_decorated(&format!("Pump mode is '{}', leaving the pump alone", mode));
        }
        CycleReport::Auto {
            should_be_on,
            schedule_label,
            switch,
        } => {
            Log::log_decorated(&format!(
                "Pump should be {} (schedule: {})",
                if *should_be_on { STATE_ON } else { STATE_OFF },
                schedule_label
            ));
            match switch {
                SwitchOutcome::Switched { from, to } => Log::log_indented(&format!(
                    "Switched from '{}' to '{}'",
                    from.as_str(),
                    to.as_str()
                )),
                SwitchOutcome::Unchanged(state) => {
                    Log::log_indented(&format!("Switch already '{}'", state.as_str()))
                }
                SwitchOutcome::MissingTarget => {
                    Log::log_indented("No switch configured, decision not applied")
                }
                SwitchOutcome::Unavailable => {
                    Log::log_indented("Switch unavailable, will retry next cycle")
                }
            }
        }
    }
}

fn run(config: &Config, running: &AtomicBool, once: bool) -> Result<()> {
    let reader = FileStateReader::from_config(config);
    let switch = FileSwitch::from_config(config);
    let status = FileStatusSink::from_config(config);
    let sunrise = sunrise_provider_from_config(config)?;

    let manager = PoolPumpManager {
        reader: &reader,
        sunrise: sunrise.as_ref(),
        switch: switch.as_ref().map(|s| s as &dyn PumpSwitch),
        status: &status,
        season: config.season(),
    };

    let scan_interval = Duration::from_secs(config.scan_interval());

    while running.load(Ordering::SeqCst) {
        let now = chrono::Local::now().naive_local();
        Log::log_block_start(&format!("Check at {}", now.format("%Y-%m-%d %H:%M:%S")));

        match manager.check(now) {
            Ok(report) => log_report(&report),
            Err(e) => {
                Log::log_warning(&format!("Skipping cycle: {:#}", e));
                if once {
                    return Err(e);
                }
            }
        }

        if once {
            break;
        }

        // Sleep in smaller intervals to check running status
        let mut slept = Duration::from_secs(0);
        while slept < scan_interval && running.load(Ordering::SeqCst) {
            let sleep_chunk = CHECK_INTERVAL.min(scan_interval - slept);
            thread::sleep(sleep_chunk);
            slept += sleep_chunk;
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let (debug_enabled, once, config_path) = match ParsedArgs::from_env().action {
        CliAction::ShowVersion => {
            display_version_info();
            return Ok(());
        }
        CliAction::ShowHelp => {
            display_help();
            return Ok(());
        }
        CliAction::ShowHelpDueToError => {
            display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Run {
            debug_enabled,
            once,
            config_path,
        } => (debug_enabled, once, config_path),
    };

    Log::set_debug(debug_enabled);
    Log::log_version();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    let mut signals = Signals::new([SIGTERM, SIGINT])?;
    thread::spawn(move || {
        for signal in signals.forever() {
            Log::log_pipe();
            Log::log_info(&format!("Shutdown signal received: {:?}", signal));
            r.store(false, Ordering::SeqCst);
        }
    });

    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    let lock_path = PathBuf::from(runtime_dir).join("poolpump.lock");
    let lock_file = File::create(&lock_path)
        .with_context(|| format!("Failed to create lock file {}", lock_path.display()))?;

    if lock_file.try_lock_exclusive().is_err() {
        Log::log_critical(
            "Another instance of poolpump is already running.\n\
            • Stop it before starting a new one.",
        );
        std::process::exit(EXIT_FAILURE);
    }

    Log::log_decorated("Lock acquired, starting poolpump...");

    let (config, shown_path, lock_file) =
        load_config_holding_lock(config_path, lock_file, &lock_path)?;
    config.log_config(&shown_path);

    let result = run(&config, &running, once);

    Log::log_block_start("Shutting down poolpump...");
    cleanup(lock_file, &lock_path);
    Log::log_end();

    result
}
