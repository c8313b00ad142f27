//! Labelled detail rows for documents.
//!
//! Views render rows, not documents. Transactions branch on their action in
//! one exhaustive match so a new action kind fails to compile here until it
//! gets its own rows.

use crate::router::Route;
use crate::types::{
    AccountDoc, AggsUtxo, AssetSchemeDoc, AssetTransferInput, AssetTransferOutput, BlockDoc,
    TransactionAction, TransactionDoc,
};
use crate::util_text::format_timestamp;

/// Inputs/outputs/burns shown per transaction before eliding.
pub const MAX_LISTED: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRow {
    pub label: String,
    pub value: String,
    pub link: Option<Route>,
    /// Row refers to the page's own owner or asset type.
    pub highlight: bool,
}

impl DetailRow {
    fn plain(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
            link: None,
            highlight: false,
        }
    }

    fn linked(label: &str, value: impl Into<String>, link: Route) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
            link: Some(link),
            highlight: false,
        }
    }
}

/// Page the rows are shown on; rows about the page's own subject are not
/// linked back to it.
#[derive(Debug, Clone, Default)]
pub struct ViewContext {
    pub owner: Option<String>,
    pub asset_type: Option<String>,
}

impl ViewContext {
    fn asset_row(&self, label: &str, asset_type: &str) -> DetailRow {
        if self.is_own_asset(asset_type) {
            DetailRow {
                highlight: true,
                ..DetailRow::plain(label, asset_type)
            }
        } else {
            DetailRow::linked(
                label,
                asset_type,
                Route::Asset {
                    asset_type: format!("0x{asset_type}"),
                },
            )
        }
    }

    fn asset_owner_row(&self, label: &str, owner: Option<&str>) -> DetailRow {
        match owner {
            None => DetailRow::plain(label, "Unknown"),
            Some(o) if self.owner.as_deref() == Some(o) => DetailRow {
                highlight: true,
                ..DetailRow::plain(label, o)
            },
            Some(o) => DetailRow::linked(
                label,
                o,
                Route::AssetAddress {
                    address: o.to_string(),
                },
            ),
        }
    }

    fn is_own_asset(&self, asset_type: &str) -> bool {
        self.asset_type
            .as_deref()
            .map(crate::api::paths::strip_0x)
            .is_some_and(|own| own.eq_ignore_ascii_case(asset_type))
    }
}

// Where a list entry leads when followed.

pub fn block_link(block: &BlockDoc) -> Route {
    Route::Block {
        number: block.number,
    }
}

pub fn tx_link(tx: &TransactionDoc) -> Route {
    Route::Tx {
        hash: crate::api::paths::strip_0x(&tx.hash).to_string(),
    }
}

pub fn utxo_link(utxo: &AggsUtxo) -> Route {
    Route::Asset {
        asset_type: format!("0x{}", utxo.asset_type),
    }
}

/// Links of `rows`, top to bottom.
pub fn row_links(rows: &[DetailRow]) -> impl Iterator<Item = Route> + '_ {
    rows.iter().filter_map(|r| r.link.clone())
}

fn platform_row(label: &str, address: &str) -> DetailRow {
    DetailRow::linked(
        label,
        address,
        Route::PlatformAddress {
            address: address.to_string(),
        },
    )
}

fn input_rows(rows: &mut Vec<DetailRow>, ctx: &ViewContext, title: &str, inputs: &[AssetTransferInput]) {
    for (i, input) in inputs.iter().take(MAX_LISTED).enumerate() {
        let n = i + 1;
        let p = &input.prev_out;
        rows.push(ctx.asset_row(&format!("{title} {n} asset"), &p.asset_type));
        rows.push(ctx.asset_owner_row(&format!("{title} {n} owner"), p.owner.as_deref()));
        rows.push(DetailRow::plain(&format!("{title} {n} quantity"), p.quantity.to_string()));
    }
    if inputs.len() > MAX_LISTED {
        rows.push(DetailRow::plain(title, format!("+{} more", inputs.len() - MAX_LISTED)));
    }
}

fn output_rows(rows: &mut Vec<DetailRow>, ctx: &ViewContext, outputs: &[AssetTransferOutput]) {
    for (i, output) in outputs.iter().take(MAX_LISTED).enumerate() {
        let n = i + 1;
        rows.push(ctx.asset_row(&format!("Output {n} asset"), &output.asset_type));
        rows.push(ctx.asset_owner_row(&format!("Output {n} owner"), output.owner.as_deref()));
        rows.push(DetailRow::plain(&format!("Output {n} quantity"), output.quantity.to_string()));
    }
    if outputs.len() > MAX_LISTED {
        rows.push(DetailRow::plain("Output", format!("+{} more", outputs.len() - MAX_LISTED)));
    }
}

/// Common header rows followed by the action-specific rows.
pub fn transaction_rows(tx: &TransactionDoc, ctx: &ViewContext) -> Vec<DetailRow> {
    let mut rows = vec![
        DetailRow::plain("Type", tx.action.label()),
        DetailRow::plain("Hash", format!("0x{}", tx.hash)),
        DetailRow::plain("Status", status_label(tx)),
        DetailRow::plain(
            "Time",
            match (tx.is_pending, tx.timestamp) {
                (true, _) => "Pending".to_string(),
                (false, Some(ts)) => format_timestamp(ts),
                (false, None) => "Unknown".to_string(),
            },
        ),
    ];
    if let Some(n) = tx.block_number {
        rows.push(DetailRow::linked("Block No.", n.to_string(), Route::Block { number: n }));
    }
    if let Some(signer) = &tx.signer {
        rows.push(platform_row("Signer", signer));
    }
    if let Some(fee) = &tx.fee {
        rows.push(DetailRow::plain("Fee", fee.to_string()));
    }

    match &tx.action {
        TransactionAction::MintAsset { mint_asset: m } => {
            rows.push(ctx.asset_row("AssetType", &m.asset_type));
            rows.push(DetailRow::plain(
                "Total supply",
                m.supply.as_ref().map(|s| s.to_string()).unwrap_or_else(|| "0".into()),
            ));
            rows.push(match &m.approver {
                Some(a) => platform_row("Approver", a),
                None => DetailRow::plain("Approver", "None"),
            });
            rows.push(ctx.asset_owner_row("Recipient", m.recipient.as_deref()));
        }
        TransactionAction::TransferAsset { transfer_asset: t } => {
            rows.push(DetailRow::plain("# of Input", t.inputs.len().to_string()));
            rows.push(DetailRow::plain("# of Output", t.outputs.len().to_string()));
            rows.push(DetailRow::plain("# of Burn", t.burns.len().to_string()));
            input_rows(&mut rows, ctx, "Input", &t.inputs);
            output_rows(&mut rows, ctx, &t.outputs);
            input_rows(&mut rows, ctx, "Burn", &t.burns);
        }
        TransactionAction::ComposeAsset { compose_asset: c } => {
            rows.push(DetailRow::plain("# of Input", c.inputs.len().to_string()));
            input_rows(&mut rows, ctx, "Input", &c.inputs);
            rows.push(ctx.asset_row("Output asset", &c.asset_type));
            rows.push(DetailRow::plain(
                "Output supply",
                c.supply.as_ref().map(|s| s.to_string()).unwrap_or_else(|| "0".into()),
            ));
            rows.push(ctx.asset_owner_row("Recipient", c.recipient.as_deref()));
        }
        TransactionAction::DecomposeAsset { decompose_asset: d } => {
            input_rows(&mut rows, ctx, "Input", std::slice::from_ref(&d.input));
            rows.push(DetailRow::plain("# of Output", d.outputs.len().to_string()));
            output_rows(&mut rows, ctx, &d.outputs);
        }
        TransactionAction::Pay { pay } => {
            if let Some(signer) = &tx.signer {
                rows.push(platform_row("Sender", signer));
            }
            rows.push(platform_row("Receiver", &pay.receiver));
            rows.push(DetailRow::plain("Quantity", pay.quantity.to_string()));
        }
        TransactionAction::SetRegularKey { set_regular_key } => {
            rows.push(DetailRow::plain("Key", format!("0x{}", set_regular_key.key)));
        }
        TransactionAction::Other => {}
    }
    rows
}

fn status_label(tx: &TransactionDoc) -> String {
    if tx.is_pending {
        return "Pending".into();
    }
    match (tx.success, &tx.error_hint) {
        (Some(false), Some(hint)) => format!("Failed ({hint})"),
        (Some(false), None) => "Failed".into(),
        _ => "Confirmed".into(),
    }
}

pub fn block_rows(block: &BlockDoc) -> Vec<DetailRow> {
    let mut rows = vec![
        DetailRow::plain("Block No.", block.number.to_string()),
        DetailRow::plain("Hash", format!("0x{}", block.hash)),
    ];
    if let Some(parent) = &block.parent_hash {
        rows.push(match block.number.checked_sub(1) {
            Some(prev) => DetailRow::linked("Parent", format!("0x{parent}"), Route::Block { number: prev }),
            None => DetailRow::plain("Parent", format!("0x{parent}")),
        });
    }
    if let Some(ts) = block.timestamp {
        rows.push(DetailRow::plain("Time", format_timestamp(ts)));
    }
    if let Some(author) = &block.author {
        rows.push(platform_row("Author", author));
    }
    rows.push(DetailRow::plain("# of Transactions", block.tx_count().to_string()));
    if let Some(reward) = &block.mining_reward {
        rows.push(DetailRow::plain("Reward", reward.to_string()));
    }
    rows
}

pub fn asset_scheme_rows(asset_type: &str, scheme: &AssetSchemeDoc) -> Vec<DetailRow> {
    let meta = crate::types::parse_metadata(&scheme.metadata);
    let mut rows = vec![
        DetailRow::plain("Name", meta.name.unwrap_or_else(|| "None".into())),
        DetailRow::plain("AssetType", asset_type),
    ];
    if let Some(desc) = meta.description {
        rows.push(DetailRow::plain("Description", desc));
    }
    rows.push(DetailRow::plain(
        "Total supply",
        scheme.supply.as_ref().map(|s| s.to_string()).unwrap_or_else(|| "0".into()),
    ));
    rows.push(match &scheme.approver {
        Some(a) => platform_row("Approver", a),
        None => DetailRow::plain("Approver", "None"),
    });
    rows.push(match &scheme.administrator {
        Some(a) => platform_row("Administrator", a),
        None => DetailRow::plain("Administrator", "None"),
    });
    rows
}

pub fn account_rows(account: &AccountDoc) -> Vec<DetailRow> {
    vec![
        DetailRow::plain("Balance", account.balance.to_string()),
        DetailRow::plain("Seq", account.seq.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tx(v: serde_json::Value) -> TransactionDoc {
        serde_json::from_value(v).unwrap()
    }

    fn row<'a>(rows: &'a [DetailRow], label: &str) -> &'a DetailRow {
        rows.iter()
            .find(|r| r.label == label)
            .unwrap_or_else(|| panic!("missing row {label}"))
    }

    #[test]
    fn mint_rows_link_recipient_and_asset() {
        let t = tx(json!({
            "hash": "aa", "timestamp": 0, "type": "mintAsset",
            "mintAsset": {"assetType": "5300", "supply": 1000000, "recipient": "tcaq"}
        }));
        let rows = transaction_rows(&t, &ViewContext::default());
        assert_eq!(row(&rows, "Type").value, "Mint");
        assert_eq!(row(&rows, "Total supply").value, "1,000,000");
        assert_eq!(row(&rows, "Approver").value, "None");
        assert_eq!(
            row(&rows, "Recipient").link,
            Some(Route::AssetAddress { address: "tcaq".into() })
        );
        assert_eq!(
            row(&rows, "AssetType").link,
            Some(Route::Asset { asset_type: "0x5300".into() })
        );
    }

    #[test]
    fn own_owner_is_highlighted_not_linked() {
        let t = tx(json!({
            "hash": "bb", "type": "transferAsset",
            "transferAsset": {
                "inputs": [{"prevOut": {"assetType": "53", "owner": "me", "quantity": "5"}}],
                "outputs": [
                    {"assetType": "53", "owner": "you", "quantity": "3"},
                    {"assetType": "53", "owner": "me", "quantity": "2"}
                ],
                "burns": []
            }
        }));
        let ctx = ViewContext { owner: Some("me".into()), asset_type: Some("0x53".into()) };
        let rows = transaction_rows(&t, &ctx);
        assert_eq!(row(&rows, "# of Output").value, "2");
        let input_owner = row(&rows, "Input 1 owner");
        assert!(input_owner.highlight);
        assert!(input_owner.link.is_none());
        assert!(row(&rows, "Output 1 owner").link.is_some());
        assert!(row(&rows, "Input 1 asset").highlight);
    }

    #[test]
    fn long_transfer_lists_are_elided() {
        let inputs: Vec<_> = (0..5)
            .map(|_| json!({"prevOut": {"assetType": "53", "quantity": 1}}))
            .collect();
        let t = tx(json!({
            "hash": "cc", "type": "transferAsset",
            "transferAsset": {"inputs": inputs, "outputs": [], "burns": []}
        }));
        let rows = transaction_rows(&t, &ViewContext::default());
        assert_eq!(row(&rows, "Input").value, "+2 more");
        assert!(rows.iter().all(|r| r.label != "Input 4 asset"));
        assert_eq!(row(&rows, "Input 1 owner").value, "Unknown");
    }

    #[test]
    fn pay_rows_show_sender_and_receiver() {
        let t = tx(json!({
            "hash": "dd", "type": "pay", "signer": "tccsender",
            "pay": {"receiver": "tccreceiver", "quantity": "10"}
        }));
        let rows = transaction_rows(&t, &ViewContext::default());
        assert_eq!(
            row(&rows, "Receiver").link,
            Some(Route::PlatformAddress { address: "tccreceiver".into() })
        );
        assert_eq!(row(&rows, "Sender").value, "tccsender");
        assert_eq!(row(&rows, "Quantity").value, "10");
    }

    #[test]
    fn failed_and_pending_status() {
        let mut t = tx(json!({"hash": "ee", "type": "setRegularKey",
            "setRegularKey": {"key": "ab"}, "success": false, "errorHint": "InvalidSeq"}));
        assert_eq!(row(&transaction_rows(&t, &ViewContext::default()), "Status").value, "Failed (InvalidSeq)");
        t.is_pending = true;
        let rows = transaction_rows(&t, &ViewContext::default());
        assert_eq!(row(&rows, "Status").value, "Pending");
        assert_eq!(row(&rows, "Time").value, "Pending");
        assert_eq!(row(&rows, "Key").value, "0xab");
    }

    #[test]
    fn row_links_follow_row_order() {
        let t = tx(json!({
            "hash": "0xdd", "type": "pay", "signer": "tccsender", "blockNumber": 7,
            "pay": {"receiver": "tccreceiver", "quantity": "10"}
        }));
        let links: Vec<Route> = row_links(&transaction_rows(&t, &ViewContext::default())).collect();
        assert_eq!(
            links,
            vec![
                Route::Block { number: 7 },
                Route::PlatformAddress { address: "tccsender".into() },
                Route::PlatformAddress { address: "tccsender".into() },
                Route::PlatformAddress { address: "tccreceiver".into() },
            ]
        );
        assert_eq!(tx_link(&t), Route::Tx { hash: "dd".into() });
    }

    #[test]
    fn block_rows_link_parent() {
        let b: BlockDoc = serde_json::from_value(json!({
            "hash": "ff", "number": 10, "parentHash": "ee", "author": "tccauthor",
            "transactions": []
        }))
        .unwrap();
        let rows = block_rows(&b);
        assert_eq!(row(&rows, "Parent").link, Some(Route::Block { number: 9 }));
        assert_eq!(row(&rows, "# of Transactions").value, "0");
    }

    #[test]
    fn asset_scheme_rows_use_metadata_name() {
        let s: AssetSchemeDoc = serde_json::from_value(json!({
            "metadata": "{\"name\":\"Gold\",\"description\":\"shiny\"}",
            "supply": "1000"
        }))
        .unwrap();
        let rows = asset_scheme_rows("5300", &s);
        assert_eq!(row(&rows, "Name").value, "Gold");
        assert_eq!(row(&rows, "Total supply").value, "1,000");
    }
}
