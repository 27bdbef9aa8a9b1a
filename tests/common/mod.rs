use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Isolated test environment: a fixture state dir, an empty working dir for
/// transaction artifacts, and a mock `cardano-cli` on PATH that logs every
/// invocation to `MOCK_LOG`.
pub struct TestEnv {
    tmp: TempDir,
    pub state: PathBuf,
    pub work: PathBuf,
    bin: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let state = make_fixture_state(tmp.path());
        let work = tmp.path().join("work");
        fs::create_dir_all(&work).expect("create work dir");
        let bin = tmp.path().join("bin");
        write_mock_cli(&bin);
        Self {
            tmp,
            state,
            work,
            bin,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("clusterctl");
        let path = format!(
            "{}:{}",
            self.bin.display(),
            std::env::var("PATH").unwrap_or_default()
        );
        cmd.env("PATH", path)
            .env("MOCK_LOG", self.log_path())
            .current_dir(&self.work)
            .arg("--state-dir")
            .arg(&self.state);
        cmd
    }

    pub fn log_path(&self) -> PathBuf {
        self.tmp.path().join("mock-cli.log")
    }

    /// Every mock tool invocation so far, one command line per entry.
    pub fn invocations(&self) -> Vec<String> {
        if !self.log_path().exists() {
            return vec![];
        }
        fs::read_to_string(self.log_path())
            .expect("read mock log")
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    pub fn remove_state_file(&self, rel: &str) {
        fs::remove_file(self.state.join(rel)).expect("remove state file");
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let mut cmd = self.cmd();
        let out = cmd
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    pub fn run_json_fail(&self, args: &[&str]) -> Value {
        let mut cmd = self.cmd();
        let out = cmd
            .arg("--json")
            .args(args)
            .assert()
            .failure()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json error output")
    }
}

fn make_fixture_state(base: &Path) -> PathBuf {
    let state = base.join("state");
    let keys = state.join("keys");
    fs::create_dir_all(keys.join("genesis-keys")).expect("create genesis-keys dir");
    fs::create_dir_all(keys.join("delegate-keys")).expect("create delegate-keys dir");

    let genesis = serde_json::json!({
        "slotLength": 0.2,
        "epochLength": 1000,
        "securityParam": 10
    });
    fs::write(
        keys.join("genesis.json"),
        serde_json::to_string_pretty(&genesis).expect("serialize genesis"),
    )
    .expect("write genesis.json");

    fs::write(
        keys.join("genesis-utxo.vkey"),
        "type: GenesisUTxOVerificationKey\n",
    )
    .expect("write genesis-utxo.vkey");
    fs::write(
        keys.join("genesis-utxo.skey"),
        "type: GenesisUTxOSigningKey\n",
    )
    .expect("write genesis-utxo.skey");
    fs::write(
        keys.join("genesis-keys/genesis1.vkey"),
        "type: GenesisVerificationKey\n",
    )
    .expect("write genesis1.vkey");
    fs::write(
        keys.join("delegate-keys/delegate1.skey"),
        "type: GenesisDelegateSigningKey\n",
    )
    .expect("write delegate1.skey");

    state
}

/// Transaction hash the mock tool reports for the single genesis UTXO.
pub const MOCK_UTXO_KEY: &str =
    "1e4f4a6a3a957e746d83a9fd5d1e4e29a1a2a3a4a5a6a7a8a9b0b1b2b3b4b5b6#0";

const MOCK_CLI_SCRIPT: &str = r##"#!/usr/bin/env bash
set -u

if [ -n "${MOCK_LOG:-}" ]; then
  echo "$*" >> "$MOCK_LOG"
fi

if [ -n "${MOCK_FAIL:-}" ]; then
  echo "mock failure: ${MOCK_FAIL}" >&2
  exit 1
fi

# fail only one subcommand, leaving everything up to it working
if [ -n "${MOCK_FAIL_CMD:-}" ] && [ "${3:-}" = "${MOCK_FAIL_CMD}" ]; then
  echo "mock failure: ${MOCK_FAIL_CMD} refused" >&2
  exit 1
fi

if [ "${1:-}" = "--version" ]; then
  echo "mock node cli 1.0.0"
  exit 0
fi

out_file=""
address=""
vkey=""
skey=""
prev=""
for arg in "$@"; do
  case "$prev" in
    --out-file) out_file="$arg" ;;
    --address) address="$arg" ;;
    --verification-key-file) vkey="$arg" ;;
    --signing-key-file) skey="$arg" ;;
  esac
  prev="$arg"
done

group="${2:-}"
sub="${3:-}"

case "$group" in
  query)
    case "$sub" in
      protocol-parameters)
        printf '{"minFeeA": 44, "minFeeB": 155381, "keyDeposit": 0}\n' > "$out_file"
        ;;
      utxo)
        printf '{"1e4f4a6a3a957e746d83a9fd5d1e4e29a1a2a3a4a5a6a7a8a9b0b1b2b3b4b5b6#0": {"amount": 1000000, "address": "%s"}}\n' "$address" > "$out_file"
        ;;
      tip)
        echo '{"slotNo": 2100, "blockNo": 7, "headerHash": "aa11bb22"}'
        ;;
      stake-address-info)
        printf '{"%s": {"delegation": null, "rewardAccountBalance": 0}}\n' "$address"
        ;;
    esac
    ;;
  genesis)
    echo "addr_test1_genesis_mock"
    ;;
  transaction)
    case "$sub" in
      calculate-min-fee) echo "167 Lovelace" ;;
      build-raw) : > "$out_file" ;;
      sign) : > "$out_file" ;;
      submit) : ;;
    esac
    ;;
  address)
    case "$sub" in
      key-gen)
        echo "mock-vkey" > "$vkey"
        echo "mock-skey" > "$skey"
        ;;
      build) echo "addr_test1_payment_mock" ;;
    esac
    ;;
  stake-address)
    case "$sub" in
      key-gen)
        echo "mock-vkey" > "$vkey"
        echo "mock-skey" > "$skey"
        ;;
      build) echo "stake_test1_mock" ;;
      delegate)
        if [ -n "${MOCK_DELEGATE_UNSUPPORTED:-}" ]; then
          echo "runStakeAddressCmd: command not implemented yet" >&2
        fi
        ;;
    esac
    ;;
  governance)
    : > "$out_file"
    ;;
esac

exit 0
"##;

fn write_mock_cli(bin_dir: &Path) {
    fs::create_dir_all(bin_dir).expect("create mock bin dir");
    let script = bin_dir.join("cardano-cli");
    fs::write(&script, MOCK_CLI_SCRIPT).expect("write mock cli");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod mock cli");
    }
}
