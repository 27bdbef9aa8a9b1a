use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Serialize)]
pub struct JsonOut<T: Serialize> {
    pub ok: bool,
    pub data: T,
}

#[derive(Serialize)]
pub struct JsonErr {
    pub ok: bool,
    pub error: ErrorBody,
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

/// Verification/signing key file pair produced by a key-gen call.
#[derive(Debug, Clone, Serialize)]
pub struct KeyPair {
    pub vkey: PathBuf,
    pub skey: PathBuf,
}

/// Transaction input, keyed on chain as `txhash#index`.
#[derive(Debug, Clone, Serialize)]
pub struct TxIn {
    pub txhash: String,
    pub index: u64,
    pub amount: u64,
}

impl TxIn {
    pub fn from_utxo_key(key: &str, amount: u64) -> Option<Self> {
        let (txhash, index) = key.split_once('#')?;
        Some(Self {
            txhash: txhash.to_string(),
            index: index.parse().ok()?,
            amount,
        })
    }

    pub fn to_arg(&self) -> String {
        format!("{}#{}", self.txhash, self.index)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TxOut {
    pub address: String,
    pub amount: u64,
}

impl TxOut {
    pub fn to_arg(&self) -> String {
        format!("{}+{}", self.address, self.amount)
    }
}

/// One entry of the node CLI's UTXO query output. Unknown fields are kept
/// verbatim so `--json` output round-trips the tool's view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UtxoEntry {
    pub amount: u64,
    pub address: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

pub type UtxoSet = BTreeMap<String, UtxoEntry>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tip {
    #[serde(rename = "slotNo")]
    pub slot_no: u64,
    #[serde(rename = "blockNo", default)]
    pub block_no: Option<u64>,
    #[serde(rename = "headerHash", default)]
    pub header_hash: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StakeAddrInfo {
    pub delegation: Option<String>,
    pub reward_account_balance: u64,
    pub raw: serde_json::Value,
}

/// Summary of the genesis parameters the client loads at construction.
#[derive(Serialize)]
pub struct GenesisInfo {
    pub slot_length: f64,
    pub epoch_length: u64,
    pub genesis_utxo_addr: String,
    pub raw: serde_json::Value,
}

#[derive(Serialize)]
pub struct CheckItem {
    pub name: String,
    pub status: String,
}

#[derive(Serialize)]
pub struct DoctorReport {
    pub overall: String,
    pub checks: Vec<CheckItem>,
}
