use clap::Parser;

mod cli;
mod commands;
mod domain;
mod services;

use cli::Cli;
use domain::models::{ErrorBody, JsonErr};
use services::invoke::ClusterError;

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        emit_error(cli.json, &err);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    if commands::handle_doctor_command(cli)? {
        return Ok(());
    }
    if commands::handle_query_commands(cli)? {
        return Ok(());
    }
    if commands::handle_key_commands(cli)? {
        return Ok(());
    }
    if commands::handle_address_commands(cli)? {
        return Ok(());
    }
    if commands::handle_stake_commands(cli)? {
        return Ok(());
    }
    commands::handle_chain_commands(cli)
}

fn emit_error(json: bool, err: &anyhow::Error) {
    let code = match err.downcast_ref::<ClusterError>() {
        Some(
            ClusterError::StateDirMissing(_)
            | ClusterError::RequiredFileMissing(_)
            | ClusterError::GenesisField(_),
        ) => "CONFIG_ERROR",
        Some(ClusterError::CommandFailed { .. } | ClusterError::Spawn { .. }) => "COMMAND_FAILED",
        Some(ClusterError::FeeParse(_) | ClusterError::MalformedOutput { .. }) => "BAD_OUTPUT",
        Some(ClusterError::Io { .. }) | None => "ERROR",
    };
    if json {
        let envelope = JsonErr {
            ok: false,
            error: ErrorBody {
                code,
                message: format!("{:#}", err),
            },
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&envelope).unwrap_or_default()
        );
    } else {
        eprintln!("error: {:#}", err);
    }
}
