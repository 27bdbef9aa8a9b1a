use crate::domain::models::{KeyPair, StakeAddrInfo, Tip, TxIn, TxOut, UtxoSet};
use crate::services::invoke::{self, prepend_flag, CliOutput, ClusterError};
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Fixed ttl for built transactions; the CLI has no tip-derived ttl yet.
const DEFAULT_TTL: u64 = 100_000;
/// Deposit charged against the change output. Always zero on this track.
const DEFAULT_DEPOSIT: u64 = 0;

pub const BODY_FILE: &str = "tx.body";
pub const BODY_ESTIMATE_FILE: &str = "tx.body_estimate";
pub const SIGNED_FILE: &str = "tx.signed";
pub const UTXO_FILE: &str = "utxo.json";
pub const PROPOSAL_FILE: &str = "update.proposal";

/// Marker the CLI prints on stderr when a stake-address subcommand is not
/// implemented by the node yet.
const STAKE_CMD_UNIMPLEMENTED: &str = "runStakeAddressCmd";

/// Well-known files under the cluster state directory.
pub struct StatePaths {
    pub genesis_json: PathBuf,
    pub genesis_utxo_vkey: PathBuf,
    pub genesis_utxo_skey: PathBuf,
    pub genesis_vkey: PathBuf,
    pub delegate_skey: PathBuf,
    pub pparams_file: PathBuf,
}

impl StatePaths {
    pub fn new(state_dir: &Path) -> Self {
        let keys = state_dir.join("keys");
        Self {
            genesis_json: keys.join("genesis.json"),
            genesis_utxo_vkey: keys.join("genesis-utxo.vkey"),
            genesis_utxo_skey: keys.join("genesis-utxo.skey"),
            genesis_vkey: keys.join("genesis-keys").join("genesis1.vkey"),
            delegate_skey: keys.join("delegate-keys").join("delegate1.skey"),
            pparams_file: state_dir.join("pparams.json"),
        }
    }

    /// Files that must exist before any subprocess is invoked.
    pub fn required(&self) -> [(&'static str, &PathBuf); 5] {
        [
            ("genesis_json", &self.genesis_json),
            ("genesis_utxo_vkey", &self.genesis_utxo_vkey),
            ("genesis_utxo_skey", &self.genesis_utxo_skey),
            ("genesis_vkey", &self.genesis_vkey),
            ("delegate_skey", &self.delegate_skey),
        ]
    }
}

/// Synchronous wrapper around the node CLI for one cluster state dir.
///
/// Every operation blocks on a single subprocess. Fixed-name transaction
/// artifacts land in the process working directory, so callers sharing a
/// working directory must run sequentially.
pub struct ClusterClient {
    cli_path: String,
    pub network_magic: u32,
    pub state_dir: PathBuf,
    pub paths: StatePaths,
    pub genesis: serde_json::Value,
    pub slot_length: f64,
    pub epoch_length: u64,
    pub genesis_utxo_addr: String,
    /// Snapshot taken at construction. Fee estimation always re-fetches via
    /// `refresh_pparams`, which returns a fresh snapshot instead of mutating.
    pub pparams: serde_json::Value,
}

impl ClusterClient {
    pub fn new(cli_path: &str, network_magic: u32, state_dir: &Path) -> Result<Self, ClusterError> {
        let paths = StatePaths::new(state_dir);
        check_state_dir(state_dir, &paths)?;

        let genesis = read_json(&paths.genesis_json, "genesis")?;
        let slot_length = genesis
            .get("slotLength")
            .and_then(|v| v.as_f64())
            .ok_or(ClusterError::GenesisField("slotLength"))?;
        let epoch_length = genesis
            .get("epochLength")
            .and_then(|v| v.as_u64())
            .ok_or(ClusterError::GenesisField("epochLength"))?;

        let mut client = Self {
            cli_path: cli_path.to_string(),
            network_magic,
            state_dir: state_dir.to_path_buf(),
            paths,
            genesis,
            slot_length,
            epoch_length,
            genesis_utxo_addr: String::new(),
            pparams: serde_json::Value::Null,
        };
        client.genesis_utxo_addr = client.get_genesis_addr(&client.paths.genesis_utxo_vkey)?;
        client.pparams = client.refresh_pparams()?;
        Ok(client)
    }

    fn cli(&self, args: &[String]) -> Result<CliOutput, ClusterError> {
        invoke::run(&self.cli_path, args)
    }

    fn query_cli(&self, args: &[&str]) -> Result<CliOutput, ClusterError> {
        let mut full: Vec<String> = vec!["shelley".into(), "query".into()];
        full.extend(args.iter().map(|s| s.to_string()));
        full.push("--testnet-magic".into());
        full.push(self.network_magic.to_string());
        self.cli(&full)
    }

    /// Fetch protocol parameters from the tip and return a fresh snapshot.
    pub fn refresh_pparams(&self) -> Result<serde_json::Value, ClusterError> {
        let out_file = self.paths.pparams_file.display().to_string();
        self.query_cli(&["protocol-parameters", "--out-file", &out_file])?;
        read_json(&self.paths.pparams_file, "protocol parameters")
    }

    pub fn get_utxo(&self, address: &str) -> Result<UtxoSet, ClusterError> {
        self.query_cli(&["utxo", "--address", address, "--out-file", UTXO_FILE])?;
        let raw = read_json(Path::new(UTXO_FILE), "utxo")?;
        serde_json::from_value(raw).map_err(|e| ClusterError::MalformedOutput {
            what: "utxo".into(),
            detail: e.to_string(),
        })
    }

    pub fn get_tip(&self) -> Result<Tip, ClusterError> {
        let out = self.query_cli(&["tip"])?;
        serde_json::from_slice(&out.stdout).map_err(|e| ClusterError::MalformedOutput {
            what: "tip".into(),
            detail: e.to_string(),
        })
    }

    pub fn get_current_epoch_no(&self) -> Result<u64, ClusterError> {
        let tip = self.get_tip()?;
        Ok(tip.slot_no / self.epoch_length)
    }

    pub fn get_stake_address_info(&self, stake_addr: &str) -> Result<StakeAddrInfo, ClusterError> {
        let out = self.query_cli(&["stake-address-info", "--address", stake_addr])?;
        let raw: serde_json::Value =
            serde_json::from_slice(&out.stdout).map_err(|e| ClusterError::MalformedOutput {
                what: "stake-address-info".into(),
                detail: e.to_string(),
            })?;
        let entry = raw
            .get(stake_addr)
            .ok_or_else(|| ClusterError::MalformedOutput {
                what: "stake-address-info".into(),
                detail: format!("no entry for `{stake_addr}`"),
            })?;
        let delegation = entry
            .get("delegation")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string());
        let reward_account_balance = entry
            .get("rewardAccountBalance")
            .and_then(|v| v.as_u64())
            .ok_or_else(|| ClusterError::MalformedOutput {
                what: "stake-address-info".into(),
                detail: "missing rewardAccountBalance".into(),
            })?;
        Ok(StakeAddrInfo {
            delegation,
            reward_account_balance,
            raw,
        })
    }

    /// Parse the leading stdout token of `calculate-min-fee` as the fee.
    pub fn estimate_fee(
        &self,
        txbody_file: &Path,
        txins: usize,
        txouts: usize,
        witnesses: usize,
        byron_witnesses: usize,
    ) -> Result<u64, ClusterError> {
        self.refresh_pparams()?;
        let args: Vec<String> = vec![
            "shelley".into(),
            "transaction".into(),
            "calculate-min-fee".into(),
            "--testnet-magic".into(),
            self.network_magic.to_string(),
            "--protocol-params-file".into(),
            self.paths.pparams_file.display().to_string(),
            "--tx-in-count".into(),
            txins.to_string(),
            "--tx-out-count".into(),
            txouts.to_string(),
            "--byron-witness-count".into(),
            byron_witnesses.to_string(),
            "--witness-count".into(),
            witnesses.to_string(),
            "--tx-body-file".into(),
            txbody_file.display().to_string(),
        ];
        let out = self.cli(&args)?;
        parse_fee(&out.stdout_text())
    }

    /// Build a zero-fee draft body and estimate the fee for it.
    pub fn get_tx_fee(
        &self,
        txins: &[TxIn],
        txouts: &[TxOut],
        certificates: &[PathBuf],
        signing_keys: &[PathBuf],
        proposal_file: Option<&Path>,
    ) -> Result<u64, ClusterError> {
        let mut draft = txouts.to_vec();
        draft.push(TxOut {
            address: self.genesis_utxo_addr.clone(),
            amount: 0,
        });
        self.cli(&build_raw_args(
            Path::new(BODY_ESTIMATE_FILE),
            txins,
            &draft,
            certificates,
            0,
            proposal_file,
        ))?;
        self.estimate_fee(
            Path::new(BODY_ESTIMATE_FILE),
            txins.len(),
            draft.len(),
            signing_keys.len(),
            0,
        )
    }

    /// Build the raw transaction body. The change output (total input minus
    /// fee minus deposit) goes back to the genesis UTXO address.
    pub fn build_tx(
        &self,
        out_file: &Path,
        txins: &[TxIn],
        txouts: &[TxOut],
        certificates: &[PathBuf],
        fee: u64,
        proposal_file: Option<&Path>,
    ) -> Result<(), ClusterError> {
        let total_input: u64 = txins.iter().map(|i| i.amount).sum();
        let mut outs = txouts.to_vec();
        outs.push(TxOut {
            address: self.genesis_utxo_addr.clone(),
            amount: change_amount(total_input, fee, DEFAULT_DEPOSIT),
        });
        self.cli(&build_raw_args(
            out_file,
            txins,
            &outs,
            certificates,
            fee,
            proposal_file,
        ))?;
        Ok(())
    }

    pub fn sign_tx(
        &self,
        tx_body_file: &Path,
        out_file: &Path,
        signing_keys: &[PathBuf],
    ) -> Result<(), ClusterError> {
        let key_args = prepend_flag(
            "--signing-key-file",
            &signing_keys
                .iter()
                .map(|k| k.display().to_string())
                .collect::<Vec<_>>(),
        );
        let mut args: Vec<String> = vec![
            "shelley".into(),
            "transaction".into(),
            "sign".into(),
            "--tx-body-file".into(),
            tx_body_file.display().to_string(),
            "--out-file".into(),
            out_file.display().to_string(),
            "--testnet-magic".into(),
            self.network_magic.to_string(),
        ];
        args.extend(key_args);
        self.cli(&args)?;
        Ok(())
    }

    pub fn submit_tx(&self, tx_file: &Path) -> Result<(), ClusterError> {
        let args: Vec<String> = vec![
            "shelley".into(),
            "transaction".into(),
            "submit".into(),
            "--testnet-magic".into(),
            self.network_magic.to_string(),
            "--tx-file".into(),
            tx_file.display().to_string(),
        ];
        self.cli(&args)?;
        Ok(())
    }

    pub fn create_payment_key_pair(
        &self,
        destination_dir: &Path,
        key_name: &str,
    ) -> Result<KeyPair, ClusterError> {
        self.key_gen("address", destination_dir, key_name)
    }

    pub fn create_stake_key_pair(
        &self,
        destination_dir: &Path,
        key_name: &str,
    ) -> Result<KeyPair, ClusterError> {
        self.key_gen("stake-address", destination_dir, key_name)
    }

    fn key_gen(
        &self,
        group: &str,
        destination_dir: &Path,
        key_name: &str,
    ) -> Result<KeyPair, ClusterError> {
        let vkey = destination_dir.join(format!("{key_name}.vkey"));
        let skey = destination_dir.join(format!("{key_name}.skey"));
        let args: Vec<String> = vec![
            "shelley".into(),
            group.into(),
            "key-gen".into(),
            "--verification-key-file".into(),
            vkey.display().to_string(),
            "--signing-key-file".into(),
            skey.display().to_string(),
        ];
        self.cli(&args)?;
        Ok(KeyPair { vkey, skey })
    }

    pub fn build_payment_address(
        &self,
        payment_vkey: &Path,
        stake_vkey: Option<&Path>,
    ) -> Result<String, ClusterError> {
        let mut args: Vec<String> = vec![
            "shelley".into(),
            "address".into(),
            "build".into(),
            "--payment-verification-key-file".into(),
            payment_vkey.display().to_string(),
        ];
        if let Some(stake) = stake_vkey {
            args.push("--stake-verification-key-file".into());
            args.push(stake.display().to_string());
        }
        args.push("--testnet-magic".into());
        args.push(self.network_magic.to_string());
        Ok(self.cli(&args)?.stdout_text().trim().to_string())
    }

    pub fn build_stake_address(&self, stake_vkey: &Path) -> Result<String, ClusterError> {
        let args: Vec<String> = vec![
            "shelley".into(),
            "stake-address".into(),
            "build".into(),
            "--stake-verification-key-file".into(),
            stake_vkey.display().to_string(),
            "--testnet-magic".into(),
            self.network_magic.to_string(),
        ];
        Ok(self.cli(&args)?.stdout_text().trim().to_string())
    }

    pub fn get_genesis_addr(&self, vkey_path: &Path) -> Result<String, ClusterError> {
        let args: Vec<String> = vec![
            "shelley".into(),
            "genesis".into(),
            "initial-addr".into(),
            "--testnet-magic".into(),
            self.network_magic.to_string(),
            "--verification-key-file".into(),
            vkey_path.display().to_string(),
        ];
        Ok(self.cli(&args)?.stdout_text().trim().to_string())
    }

    pub fn delegate_stake_address(
        &self,
        stake_addr_skey: &Path,
        pool_id: &str,
        delegation_fee: u64,
    ) -> Result<(), ClusterError> {
        let args: Vec<String> = vec![
            "shelley".into(),
            "stake-address".into(),
            "delegate".into(),
            "--signing-key-file".into(),
            stake_addr_skey.display().to_string(),
            "--pool-id".into(),
            pool_id.to_string(),
            "--delegation-fee".into(),
            delegation_fee.to_string(),
        ];
        let out = self.cli(&args)?;
        let stderr = out.stderr_text();
        if stderr.contains(STAKE_CMD_UNIMPLEMENTED) {
            return Err(ClusterError::CommandFailed {
                command: invoke::render_command(&self.cli_path, &args),
                stderr,
            });
        }
        Ok(())
    }

    /// Fund outputs from the genesis UTXO: snapshot the UTXO set, derive the
    /// inputs, then fee-estimate, build, sign and submit in sequence.
    ///
    /// Failed steps leave their artifacts behind; nothing is rolled back.
    pub fn send_tx_genesis(
        &self,
        txouts: &[TxOut],
        certificates: &[PathBuf],
        signing_keys: &[PathBuf],
        proposal_file: Option<&Path>,
    ) -> anyhow::Result<()> {
        let utxo = self.get_utxo(&self.genesis_utxo_addr)?;
        let txins: Vec<TxIn> = utxo
            .iter()
            .filter_map(|(key, entry)| TxIn::from_utxo_key(key, entry.amount))
            .collect();
        let mut keys = signing_keys.to_vec();
        keys.push(self.paths.genesis_utxo_skey.clone());

        let flow = || -> Result<(), ClusterError> {
            let fee = self.get_tx_fee(&txins, txouts, certificates, &keys, proposal_file)?;
            self.build_tx(
                Path::new(BODY_FILE),
                &txins,
                txouts,
                certificates,
                fee,
                proposal_file,
            )?;
            self.sign_tx(Path::new(BODY_FILE), Path::new(SIGNED_FILE), &keys)?;
            self.submit_tx(Path::new(SIGNED_FILE))
        };
        flow().with_context(|| {
            format!(
                "sending a genesis transaction failed\nutxo: {}\ntxins: {:?} txouts: {:?} signing keys: {:?}",
                serde_json::to_string(&utxo).unwrap_or_else(|_| "<unprintable>".into()),
                txins,
                txouts,
                keys,
            )
        })
    }

    /// Build a governance update proposal and submit it as a transaction
    /// funded by the genesis UTXO and signed by the delegate key.
    pub fn submit_update_proposal(
        &self,
        proposal_args: &[String],
        epoch: Option<u64>,
    ) -> anyhow::Result<()> {
        let epoch = match epoch {
            Some(e) => e,
            None => self.get_current_epoch_no()?,
        };
        let mut args: Vec<String> = vec![
            "shelley".into(),
            "governance".into(),
            "create-update-proposal".into(),
        ];
        args.extend(proposal_args.iter().cloned());
        args.push("--out-file".into());
        args.push(PROPOSAL_FILE.into());
        args.push("--epoch".into());
        args.push(epoch.to_string());
        args.push("--genesis-verification-key-file".into());
        args.push(self.paths.genesis_vkey.display().to_string());
        self.cli(&args)?;

        self.send_tx_genesis(
            &[],
            &[],
            &[self.paths.delegate_skey.clone()],
            Some(Path::new(PROPOSAL_FILE)),
        )
        .with_context(|| format!("submitting the update proposal for epoch {epoch} failed"))
    }
}

fn check_state_dir(state_dir: &Path, paths: &StatePaths) -> Result<(), ClusterError> {
    if !state_dir.exists() {
        return Err(ClusterError::StateDirMissing(state_dir.to_path_buf()));
    }
    for (_, file) in paths.required() {
        if !file.exists() {
            return Err(ClusterError::RequiredFileMissing(file.clone()));
        }
    }
    Ok(())
}

fn read_json(path: &Path, what: &str) -> Result<serde_json::Value, ClusterError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ClusterError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|e| ClusterError::MalformedOutput {
        what: what.to_string(),
        detail: e.to_string(),
    })
}

fn parse_fee(stdout: &str) -> Result<u64, ClusterError> {
    stdout
        .split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| ClusterError::FeeParse(stdout.trim().to_string()))
}

fn change_amount(total_input: u64, fee: u64, deposit: u64) -> u64 {
    total_input.saturating_sub(fee).saturating_sub(deposit)
}

fn build_raw_args(
    out_file: &Path,
    txins: &[TxIn],
    txouts: &[TxOut],
    certificates: &[PathBuf],
    fee: u64,
    proposal_file: Option<&Path>,
) -> Vec<String> {
    let txin_args = prepend_flag(
        "--tx-in",
        &txins.iter().map(TxIn::to_arg).collect::<Vec<_>>(),
    );
    let txout_args = prepend_flag(
        "--tx-out",
        &txouts.iter().map(TxOut::to_arg).collect::<Vec<_>>(),
    );
    let cert_args = prepend_flag(
        "--certificate-file",
        &certificates
            .iter()
            .map(|c| c.display().to_string())
            .collect::<Vec<_>>(),
    );

    let mut args: Vec<String> = vec![
        "shelley".into(),
        "transaction".into(),
        "build-raw".into(),
        "--ttl".into(),
        DEFAULT_TTL.to_string(),
        "--fee".into(),
        fee.to_string(),
        "--out-file".into(),
        out_file.display().to_string(),
    ];
    args.extend(txin_args);
    args.extend(txout_args);
    args.extend(cert_args);
    if let Some(proposal) = proposal_file {
        args.push("--update-proposal-file".into());
        args.push(proposal.display().to_string());
    }
    args
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fee_is_first_whitespace_token() {
        assert_eq!(parse_fee("167 Lovelace").unwrap(), 167);
        assert_eq!(parse_fee("42\n").unwrap(), 42);
    }

    #[test]
    fn fee_parse_rejects_non_numeric_stdout() {
        let err = parse_fee("Lovelace 167").unwrap_err();
        assert!(matches!(err, ClusterError::FeeParse(_)));
    }

    #[test]
    fn change_is_input_minus_fee_with_zero_deposit() {
        assert_eq!(change_amount(1_000_000, 167, 0), 999_833);
    }

    #[test]
    fn change_does_not_underflow() {
        assert_eq!(change_amount(100, 200, 0), 0);
    }

    #[test]
    fn txin_parses_utxo_key() {
        let txin = TxIn::from_utxo_key("aabb#3", 500).unwrap();
        assert_eq!(txin.txhash, "aabb");
        assert_eq!(txin.index, 3);
        assert_eq!(txin.amount, 500);
        assert_eq!(txin.to_arg(), "aabb#3");
        assert!(TxIn::from_utxo_key("no-index", 1).is_none());
    }

    #[test]
    fn build_raw_args_interleave_flags_in_order() {
        let txins = vec![
            TxIn::from_utxo_key("aa#0", 10).unwrap(),
            TxIn::from_utxo_key("bb#1", 20).unwrap(),
        ];
        let txouts = vec![TxOut {
            address: "addr1".into(),
            amount: 5,
        }];
        let args = build_raw_args(Path::new("tx.body"), &txins, &txouts, &[], 7, None);

        let tx_in_positions: Vec<usize> = args
            .iter()
            .enumerate()
            .filter(|(_, a)| *a == "--tx-in")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(tx_in_positions.len(), 2);
        assert_eq!(args[tx_in_positions[0] + 1], "aa#0");
        assert_eq!(args[tx_in_positions[1] + 1], "bb#1");

        let out_pos = args.iter().position(|a| a == "--tx-out").unwrap();
        assert_eq!(args[out_pos + 1], "addr1+5");

        let fee_pos = args.iter().position(|a| a == "--fee").unwrap();
        assert_eq!(args[fee_pos + 1], "7");
        assert!(!args.iter().any(|a| a == "--update-proposal-file"));
    }

    #[test]
    fn build_raw_args_append_proposal_file() {
        let args = build_raw_args(
            Path::new("tx.body"),
            &[],
            &[],
            &[],
            0,
            Some(Path::new("update.proposal")),
        );
        let pos = args
            .iter()
            .position(|a| a == "--update-proposal-file")
            .unwrap();
        assert_eq!(args[pos + 1], "update.proposal");
    }
}
