use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_CLI_PATH: &str = "cardano-cli";

#[derive(Parser, Debug)]
#[command(name = "clusterctl", version, about = "Local test-cluster node CLI wrapper")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,
    #[arg(
        long,
        global = true,
        default_value = "./state",
        help = "Cluster state directory holding genesis and key files"
    )]
    pub state_dir: PathBuf,
    #[arg(long, global = true, default_value_t = 42, help = "Testnet magic number")]
    pub magic: u32,
    #[arg(
        long,
        global = true,
        default_value = DEFAULT_CLI_PATH,
        help = "Name or path of the node CLI binary"
    )]
    pub cli_path: String,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Query {
        #[command(subcommand)]
        command: QueryCommands,
    },
    Keys {
        #[command(subcommand)]
        command: KeyCommands,
    },
    Address {
        #[command(subcommand)]
        command: AddressCommands,
    },
    Stake {
        #[command(subcommand)]
        command: StakeCommands,
    },
    Send {
        #[arg(
            long = "to",
            required = true,
            help = "Destination as `address+amount`, repeatable"
        )]
        to: Vec<String>,
        #[arg(long = "certificate-file")]
        certificates: Vec<PathBuf>,
        #[arg(long = "signing-key-file")]
        signing_keys: Vec<PathBuf>,
    },
    Governance {
        #[command(subcommand)]
        command: GovernanceCommands,
    },
    Doctor,
}

#[derive(Subcommand, Debug)]
pub enum QueryCommands {
    Tip,
    Epoch,
    Genesis,
    Pparams,
    Utxo {
        #[arg(long)]
        address: String,
    },
    StakeAddressInfo {
        #[arg(long)]
        address: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum KeyCommands {
    Payment {
        name: String,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
    Stake {
        name: String,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Subcommand, Debug)]
pub enum AddressCommands {
    Payment {
        #[arg(long)]
        payment_vkey: PathBuf,
        #[arg(long)]
        stake_vkey: Option<PathBuf>,
    },
    Stake {
        #[arg(long)]
        stake_vkey: PathBuf,
    },
    Genesis {
        #[arg(long, help = "Verification key file (defaults to the genesis UTXO vkey)")]
        vkey: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum StakeCommands {
    Delegate {
        #[arg(long)]
        signing_key: PathBuf,
        #[arg(long)]
        pool_id: String,
        #[arg(long)]
        delegation_fee: u64,
    },
}

#[derive(Subcommand, Debug)]
pub enum GovernanceCommands {
    Propose {
        #[arg(long, help = "Target epoch (defaults to the current epoch)")]
        epoch: Option<u64>,
        #[arg(
            trailing_var_arg = true,
            allow_hyphen_values = true,
            help = "Raw arguments forwarded to the proposal subcommand"
        )]
        proposal_args: Vec<String>,
    },
}
