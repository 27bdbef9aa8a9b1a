use crate::cli::{AddressCommands, Cli, Commands, GovernanceCommands, KeyCommands, StakeCommands};
use crate::domain::models::TxOut;
use crate::services::audit::audit;
use crate::services::cluster::ClusterClient;
use crate::services::output::print_one;
use anyhow::Context;

pub fn handle_key_commands(cli: &Cli) -> anyhow::Result<bool> {
    let Commands::Keys { command } = &cli.command else {
        return Ok(false);
    };

    let client = ClusterClient::new(&cli.cli_path, cli.magic, &cli.state_dir)?;
    match command {
        KeyCommands::Payment { name, out_dir } => {
            let pair = client.create_payment_key_pair(out_dir, name)?;
            print_one(cli.json, pair, |p| {
                format!("{}\t{}", p.vkey.display(), p.skey.display())
            })?;
        }
        KeyCommands::Stake { name, out_dir } => {
            let pair = client.create_stake_key_pair(out_dir, name)?;
            print_one(cli.json, pair, |p| {
                format!("{}\t{}", p.vkey.display(), p.skey.display())
            })?;
        }
    }
    Ok(true)
}

pub fn handle_address_commands(cli: &Cli) -> anyhow::Result<bool> {
    let Commands::Address { command } = &cli.command else {
        return Ok(false);
    };

    let client = ClusterClient::new(&cli.cli_path, cli.magic, &cli.state_dir)?;
    let address = match command {
        AddressCommands::Payment {
            payment_vkey,
            stake_vkey,
        } => client.build_payment_address(payment_vkey, stake_vkey.as_deref())?,
        AddressCommands::Stake { stake_vkey } => client.build_stake_address(stake_vkey)?,
        AddressCommands::Genesis { vkey } => match vkey {
            Some(vkey) => client.get_genesis_addr(vkey)?,
            None => client.genesis_utxo_addr.clone(),
        },
    };
    print_one(cli.json, address, |a| a.clone())?;
    Ok(true)
}

pub fn handle_stake_commands(cli: &Cli) -> anyhow::Result<bool> {
    let Commands::Stake { command } = &cli.command else {
        return Ok(false);
    };

    let client = ClusterClient::new(&cli.cli_path, cli.magic, &cli.state_dir)?;
    match command {
        StakeCommands::Delegate {
            signing_key,
            pool_id,
            delegation_fee,
        } => {
            let result = client.delegate_stake_address(signing_key, pool_id, *delegation_fee);
            audit(
                &cli.state_dir,
                "stake_delegate",
                serde_json::json!({
                    "pool_id": pool_id,
                    "delegation_fee": delegation_fee,
                    "outcome": outcome(&result)
                }),
            );
            result?;
            print_one(cli.json, "delegated", |_| {
                format!("stake address delegated to {}", pool_id)
            })?;
        }
    }
    Ok(true)
}

pub fn handle_chain_commands(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Send {
            to,
            certificates,
            signing_keys,
        } => {
            let client = ClusterClient::new(&cli.cli_path, cli.magic, &cli.state_dir)?;
            let txouts = to
                .iter()
                .map(|raw| parse_txout(raw))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let result = client.send_tx_genesis(&txouts, certificates, signing_keys, None);
            audit(
                &cli.state_dir,
                "send",
                serde_json::json!({
                    "txouts": to,
                    "certificates": certificates,
                    "signing_keys": signing_keys,
                    "outcome": outcome(&result)
                }),
            );
            result?;
            print_one(cli.json, "submitted", |_| {
                "transaction submitted".to_string()
            })?;
        }
        Commands::Governance { command } => {
            let GovernanceCommands::Propose {
                epoch,
                proposal_args,
            } = command;
            let client = ClusterClient::new(&cli.cli_path, cli.magic, &cli.state_dir)?;
            let result = client.submit_update_proposal(proposal_args, *epoch);
            audit(
                &cli.state_dir,
                "governance_propose",
                serde_json::json!({
                    "epoch": epoch,
                    "proposal_args": proposal_args,
                    "outcome": outcome(&result)
                }),
            );
            result?;
            print_one(cli.json, "submitted", |_| {
                "update proposal submitted".to_string()
            })?;
        }
        _ => anyhow::bail!("command not handled"),
    }
    Ok(())
}

fn outcome<T, E>(result: &Result<T, E>) -> &'static str {
    if result.is_ok() {
        "ok"
    } else {
        "error"
    }
}

fn parse_txout(raw: &str) -> anyhow::Result<TxOut> {
    let (address, amount) = raw
        .rsplit_once('+')
        .with_context(|| format!("invalid output `{raw}`, expected `address+amount`"))?;
    let amount = amount
        .parse()
        .with_context(|| format!("invalid amount in output `{raw}`"))?;
    Ok(TxOut {
        address: address.to_string(),
        amount,
    })
}
