use crate::cli::{Cli, Commands, QueryCommands};
use crate::domain::models::{GenesisInfo, JsonOut};
use crate::services::cluster::ClusterClient;
use crate::services::doctor::state_doctor;
use crate::services::output::print_one;

pub fn handle_doctor_command(cli: &Cli) -> anyhow::Result<bool> {
    let Commands::Doctor = &cli.command else {
        return Ok(false);
    };

    let report = state_doctor(&cli.cli_path, &cli.state_dir);
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&JsonOut {
                ok: report.overall == "ok",
                data: &report
            })?
        );
    } else {
        println!("cluster doctor: {}", report.overall);
        for c in &report.checks {
            println!("{}\t{}", c.name, c.status);
        }
        if report.overall != "ok" {
            std::process::exit(1);
        }
    }
    Ok(true)
}

pub fn handle_query_commands(cli: &Cli) -> anyhow::Result<bool> {
    let Commands::Query { command } = &cli.command else {
        return Ok(false);
    };

    let client = ClusterClient::new(&cli.cli_path, cli.magic, &cli.state_dir)?;
    match command {
        QueryCommands::Tip => {
            let tip = client.get_tip()?;
            print_one(cli.json, tip, |t| {
                format!(
                    "slot {} block {}",
                    t.slot_no,
                    t.block_no.map(|b| b.to_string()).unwrap_or_default()
                )
            })?;
        }
        QueryCommands::Epoch => {
            let epoch = client.get_current_epoch_no()?;
            print_one(cli.json, epoch, |e| format!("epoch {}", e))?;
        }
        QueryCommands::Genesis => {
            let info = GenesisInfo {
                slot_length: client.slot_length,
                epoch_length: client.epoch_length,
                genesis_utxo_addr: client.genesis_utxo_addr.clone(),
                raw: client.genesis.clone(),
            };
            print_one(cli.json, info, |g| {
                format!(
                    "slot_length={} epoch_length={} genesis_utxo_addr={}",
                    g.slot_length, g.epoch_length, g.genesis_utxo_addr
                )
            })?;
        }
        QueryCommands::Pparams => {
            // construction already fetched a snapshot; no second round-trip
            print_one(cli.json, client.pparams.clone(), |p| {
                serde_json::to_string_pretty(p).unwrap_or_default()
            })?;
        }
        QueryCommands::Utxo { address } => {
            let utxo = client.get_utxo(address)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&JsonOut {
                        ok: true,
                        data: &utxo
                    })?
                );
            } else {
                for (key, entry) in &utxo {
                    println!("{}\t{}\t{}", key, entry.amount, entry.address);
                }
            }
        }
        QueryCommands::StakeAddressInfo { address } => {
            let info = client.get_stake_address_info(address)?;
            print_one(cli.json, info, |i| {
                format!(
                    "delegation={} rewards={}",
                    i.delegation.as_deref().unwrap_or("none"),
                    i.reward_account_balance
                )
            })?;
        }
    }
    Ok(true)
}
