mod app;
mod binding;
mod cli;
mod config;
mod error;
mod exports;
mod host_env;
mod library;
mod marshal;
mod record;

use std::io;

use anyhow::Context;

use crate::binding::NativeBinding;
use crate::config::Config;
use crate::library::DynamicLibrary;
use crate::record::RecordClass;

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let convention = cli::parse_convention(std::env::args_os()).unwrap_or_else(|e| e.exit());
    let config = Config::from_env(convention);
    log::info!("using the {} calling convention", config.convention);
    log::debug!("native library: {}", config.library);

    let binding = DynamicLibrary::global(&config.library)
        .map(|library| library as &dyn NativeBinding)
        .map_err(Clone::clone);

    app::run(
        &mut io::stdout(),
        config.convention,
        RecordClass::global(),
        binding,
    )
    .context("failed to write to stdout")?;

    Ok(())
}
