use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::router::Route;
use crate::search::LookupResolution;

/// Integer quantity as sent by the indexer: U64/U256 values arrive either as
/// JSON numbers or as decimal strings, so they are kept textual.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Quantity(pub String);

impl Quantity {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.trim_start_matches('0').is_empty()
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&crate::util_text::group_thousands(&self.0))
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        match Value::deserialize(d)? {
            Value::String(s) => Ok(Quantity(s)),
            Value::Number(n) => Ok(Quantity(n.to_string())),
            other => Err(de::Error::custom(format!("expected quantity, got {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDoc {
    pub hash: String,
    pub number: u64,
    #[serde(default)]
    pub parent_hash: Option<String>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub mining_reward: Option<Quantity>,
    #[serde(default)]
    pub transactions_count: Option<u64>,
    #[serde(default)]
    pub transactions: Vec<TransactionDoc>,
}

impl BlockDoc {
    pub fn tx_count(&self) -> u64 {
        self.transactions_count
            .unwrap_or(self.transactions.len() as u64)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDoc {
    pub hash: String,
    #[serde(default)]
    pub block_number: Option<u64>,
    #[serde(default)]
    pub transaction_index: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub is_pending: bool,
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub error_hint: Option<String>,
    #[serde(default)]
    pub signer: Option<String>,
    #[serde(default)]
    pub fee: Option<Quantity>,
    #[serde(default)]
    pub seq: Option<u64>,
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(flatten)]
    pub action: TransactionAction,
}

/// Transaction payload, keyed on the indexer's `type` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TransactionAction {
    #[serde(rename = "mintAsset")]
    MintAsset {
        #[serde(rename = "mintAsset")]
        mint_asset: MintAsset,
    },
    #[serde(rename = "transferAsset")]
    TransferAsset {
        #[serde(rename = "transferAsset")]
        transfer_asset: TransferAsset,
    },
    #[serde(rename = "composeAsset")]
    ComposeAsset {
        #[serde(rename = "composeAsset")]
        compose_asset: ComposeAsset,
    },
    #[serde(rename = "decomposeAsset")]
    DecomposeAsset {
        #[serde(rename = "decomposeAsset")]
        decompose_asset: DecomposeAsset,
    },
    #[serde(rename = "pay")]
    Pay { pay: Pay },
    #[serde(rename = "setRegularKey")]
    SetRegularKey {
        #[serde(rename = "setRegularKey")]
        set_regular_key: SetRegularKey,
    },
    #[serde(other)]
    Other,
}

impl TransactionAction {
    /// Short badge label for lists.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionAction::MintAsset { .. } => "Mint",
            TransactionAction::TransferAsset { .. } => "Transfer",
            TransactionAction::ComposeAsset { .. } => "Compose",
            TransactionAction::DecomposeAsset { .. } => "Decompose",
            TransactionAction::Pay { .. } => "Pay",
            TransactionAction::SetRegularKey { .. } => "SetRegularKey",
            TransactionAction::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintAsset {
    pub asset_type: String,
    #[serde(default)]
    pub supply: Option<Quantity>,
    #[serde(default)]
    pub approver: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrevOut {
    pub asset_type: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub quantity: Quantity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransferInput {
    pub prev_out: PrevOut,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetTransferOutput {
    pub asset_type: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub quantity: Quantity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferAsset {
    #[serde(default)]
    pub inputs: Vec<AssetTransferInput>,
    #[serde(default)]
    pub outputs: Vec<AssetTransferOutput>,
    #[serde(default)]
    pub burns: Vec<AssetTransferInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeAsset {
    pub asset_type: String,
    #[serde(default)]
    pub inputs: Vec<AssetTransferInput>,
    #[serde(default)]
    pub supply: Option<Quantity>,
    #[serde(default)]
    pub approver: Option<String>,
    #[serde(default)]
    pub recipient: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecomposeAsset {
    pub input: AssetTransferInput,
    #[serde(default)]
    pub outputs: Vec<AssetTransferOutput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pay {
    pub receiver: String,
    pub quantity: Quantity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRegularKey {
    pub key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSchemeDoc {
    #[serde(default)]
    pub metadata: String,
    #[serde(default)]
    pub supply: Option<Quantity>,
    #[serde(default)]
    pub approver: Option<String>,
    #[serde(default)]
    pub administrator: Option<String>,
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(default)]
    pub shard_id: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDoc {
    pub seq: Quantity,
    pub balance: Quantity,
}

/// One asset-name search hit, offered as a suggestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetBundle {
    pub asset_type: String,
    pub asset_scheme: AssetSchemeDoc,
}

impl AssetBundle {
    /// Display name from metadata, falling back to the asset type.
    pub fn display_name(&self) -> String {
        parse_metadata(&self.asset_scheme.metadata)
            .name
            .unwrap_or_else(|| self.asset_type.clone())
    }
}

/// Aggregated unspent outputs of one asset type held by an address.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggsUtxo {
    pub asset_type: String,
    pub asset_scheme: AssetSchemeDoc,
    pub total_asset_quantity: Quantity,
    #[serde(default)]
    pub utxo_quantity: Option<u64>,
}

impl AggsUtxo {
    pub fn display_name(&self) -> String {
        parse_metadata(&self.asset_scheme.metadata)
            .name
            .unwrap_or_else(|| format!("0x{}", self.asset_type))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon_url: Option<String>,
}

/// Asset-scheme metadata is free text; only JSON objects carry fields.
pub fn parse_metadata(raw: &str) -> Metadata {
    serde_json::from_str::<Metadata>(raw).unwrap_or_default()
}

/// Page-scoped results, tagged by [`AppEvent::Page`] with the view epoch.
///
/// `NotFound` and `Failed` refer to the page's primary document; list
/// fetches report `ListFailed` and an absent list arrives as an empty page.
#[derive(Debug, Clone)]
pub enum PageEvent {
    Block(BlockDoc),
    /// A home-window block could not be fetched.
    BlockMissing(u64),
    Transaction(TransactionDoc),
    AssetScheme(AssetSchemeDoc),
    Account(AccountDoc),
    Blocks(Vec<BlockDoc>),
    Transactions(Vec<TransactionDoc>),
    Utxos(Vec<AggsUtxo>),
    NotFound,
    Failed(String),
    ListFailed(String),
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    Lookup(LookupResolution),
    SuggestDue,
    Suggestions {
        generation: u64,
        result: Result<Vec<AssetBundle>, String>,
    },
    BestBlockNumber(u64),
    Page { epoch: u64, event: PageEvent },
    Navigate(Route),
    Quit,
}
