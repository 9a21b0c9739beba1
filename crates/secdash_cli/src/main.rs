//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `secdash_core` linkage and print host diagnostics.
//! - Optionally open a configured store and report its account state.
//!
//! Usage: `secdash [config.toml]`

use secdash_core::{
    core_version, ping, CoreConfig, CoreRuntime, DeviceFingerprint, EnvironmentSnapshot,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("secdash_core ping={}", ping());
    println!("secdash_core version={}", core_version());

    let fingerprint = DeviceFingerprint::generate(&EnvironmentSnapshot::from_host());
    println!("device fingerprint={}", fingerprint.hash);
    println!("device info={}", fingerprint.device_info());

    let Some(config_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    let config = match CoreConfig::load(&config_path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match CoreRuntime::open(config) {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let active = runtime.start();
    println!("accounts={}", runtime.accounts().load_accounts().len());
    match active {
        Some(email) => {
            let info = runtime.sessions().get_session_time_info(&email);
            println!("active={email}");
            println!("session={}", info.formatted_session_duration);
            println!("total={}", info.formatted_total_time);
            println!(
                "first_login={}",
                runtime.sessions().get_first_login_date(&email)
            );
        }
        None => println!("active=none"),
    }
    println!("dev_mode={}", runtime.dev_mode().is_enabled());
    log::info!("event=cli_probe module=cli status=ok");

    runtime.shutdown();
    ExitCode::SUCCESS
}
