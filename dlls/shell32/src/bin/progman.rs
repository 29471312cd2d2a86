use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::Parser;

use shell32::dde::{dmlerr_name, DdeServer, DMLERR_NO_ERROR, PROGMAN_TOPIC};
use shell32::{ProgmanConfig, ProgmanServer, PROGMAN_SERVICE};

/// Send Program Manager DDE commands, one transaction per script
#[derive(Parser, Debug)]
#[command(author, version, about = "Program Manager DDE command interpreter")]
struct Args {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Programs folder holding the groups
    #[arg(long)]
    programs_dir: Option<PathBuf>,

    /// Title group windows with the full folder path
    #[arg(long)]
    full_path_title: bool,

    /// Transaction to execute; read from stdin when absent
    #[arg(long = "exec", value_name = "SCRIPT")]
    exec: Vec<String>,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ProgmanConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ProgmanConfig::default(),
    };
    if let Some(dir) = args.programs_dir {
        config.programs_dir = dir;
    }
    if args.full_path_title {
        config.full_path_title = true;
    }

    let dde = DdeServer::new(Arc::new(ProgmanServer::new(config)));
    let hconv = dde
        .connect(PROGMAN_SERVICE, PROGMAN_TOPIC)
        .map_err(|code| anyhow!("DdeConnect failed: {}", dmlerr_name(code)))?;

    let scripts: Vec<String> = if args.exec.is_empty() {
        io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<_>>()
            .context("reading transactions from stdin")?
    } else {
        args.exec
    };

    let mut failed = 0usize;
    for script in scripts.iter().filter(|line| !line.trim().is_empty()) {
        let code = dde.execute(hconv, script.as_bytes());
        println!("{}", dmlerr_name(code));
        if code != DMLERR_NO_ERROR {
            failed += 1;
        }
    }

    dde.disconnect(hconv);

    if failed > 0 {
        log::warn!("{} transaction(s) not processed", failed);
        Ok(ExitCode::FAILURE)
    } else {
        Ok(ExitCode::SUCCESS)
    }
}
