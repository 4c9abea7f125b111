use crate::repository::{Launch, PendingMetadata, Purchase};
use comfy_table::{Cell, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL};
use csv::Writer;
use serde_json::json;

#[derive(Debug, Clone)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Table,
        }
    }
}

#[derive(Debug)]
pub struct IndexerStatus {
    pub last_processed_block: Option<u64>,
    pub active_launches: usize,
    pub finalized_launches: usize,
    pub purchases: usize,
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(header);
    table
}

fn csv_output(header: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut wtr = Writer::from_writer(vec![]);
    let _ = wtr.write_record(header);
    for row in rows {
        let _ = wtr.write_record(&row);
    }
    String::from_utf8(wtr.into_inner().unwrap_or_default()).unwrap_or_default()
}

pub fn format_status(status: &IndexerStatus, format: &OutputFormat) -> String {
    let cursor = status
        .last_processed_block
        .map_or("N/A".to_string(), |b| b.to_string());

    match format {
        OutputFormat::Table => {
            let mut table = new_table(vec!["Metric", "Value"]);
            table.add_row(vec![Cell::new("Last Processed Block"), Cell::new(&cursor)]);
            table.add_row(vec![
                Cell::new("Active Launches"),
                Cell::new(status.active_launches),
            ]);
            table.add_row(vec![
                Cell::new("Finalized Launches"),
                Cell::new(status.finalized_launches),
            ]);
            table.add_row(vec![Cell::new("Purchases"), Cell::new(status.purchases)]);
            table.to_string()
        }
        OutputFormat::Json => serde_json::to_string_pretty(&json!({
            "last_processed_block": status.last_processed_block,
            "active_launches": status.active_launches,
            "finalized_launches": status.finalized_launches,
            "purchases": status.purchases,
        }))
        .unwrap_or_else(|_| "{}".to_string()),
        OutputFormat::Csv => csv_output(
            &[
                "last_processed_block",
                "active_launches",
                "finalized_launches",
                "purchases",
            ],
            vec![vec![
                cursor,
                status.active_launches.to_string(),
                status.finalized_launches.to_string(),
                status.purchases.to_string(),
            ]],
        ),
    }
}

pub fn format_launches(launches: &[Launch], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            if launches.is_empty() {
                return "No launches found.".to_string();
            }

            let mut table = new_table(vec![
                "Id", "Token", "Name", "Symbol", "Status", "Supply Cap", "Fee (bps)", "Block",
            ]);
            for launch in launches {
                table.add_row(vec![
                    Cell::new(launch.id),
                    Cell::new(format!("{:#}", launch.token_address)),
                    Cell::new(&launch.name),
                    Cell::new(&launch.symbol),
                    Cell::new(launch.status),
                    Cell::new(launch.supply_cap),
                    Cell::new(launch.creator_fee_bps),
                    Cell::new(launch.block_number),
                ]);
            }
            table.to_string()
        }
        OutputFormat::Json => {
            let rows: Vec<_> = launches
                .iter()
                .map(|l| {
                    json!({
                        "id": l.id,
                        "token_address": format!("{:?}", l.token_address),
                        "curve_address": format!("{:?}", l.curve_address),
                        "creator": format!("{:?}", l.creator),
                        "name": l.name,
                        "symbol": l.symbol,
                        "status": l.status.as_str(),
                        "supply_cap": l.supply_cap.to_string(),
                        "base_price": l.base_price.to_string(),
                        "price_increment": l.price_increment.to_string(),
                        "creator_fee_bps": l.creator_fee_bps,
                        "block_number": l.block_number,
                        "tx_hash": format!("{:?}", l.tx_hash),
                        "created_at": l.created_at,
                        "metadata_uri": l.metadata_uri,
                    })
                })
                .collect();
            serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Csv => csv_output(
            &[
                "id",
                "token_address",
                "curve_address",
                "name",
                "symbol",
                "status",
                "supply_cap",
                "block_number",
            ],
            launches
                .iter()
                .map(|l| {
                    vec![
                        l.id.to_string(),
                        format!("{:?}", l.token_address),
                        format!("{:?}", l.curve_address),
                        l.name.clone(),
                        l.symbol.clone(),
                        l.status.to_string(),
                        l.supply_cap.to_string(),
                        l.block_number.to_string(),
                    ]
                })
                .collect(),
        ),
    }
}

pub fn format_purchases(purchases: &[Purchase], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            if purchases.is_empty() {
                return "No purchases found.".to_string();
            }

            let mut table = new_table(vec![
                "Block",
                "Buyer",
                "BTC (sats)",
                "Tokens",
                "Supply After",
                "Price",
                "Tx Hash",
            ]);
            for purchase in purchases {
                table.add_row(vec![
                    Cell::new(purchase.block_number),
                    Cell::new(format!("{:#}", purchase.buyer)),
                    Cell::new(purchase.btc_amount),
                    Cell::new(purchase.token_amount),
                    Cell::new(purchase.supply_after),
                    Cell::new(purchase.new_price),
                    Cell::new(format_tx_hash(&format!("{:?}", purchase.tx_hash))),
                ]);
            }
            table.to_string()
        }
        OutputFormat::Json => {
            let rows: Vec<_> = purchases
                .iter()
                .map(|p| {
                    json!({
                        "block_number": p.block_number,
                        "tx_hash": format!("{:?}", p.tx_hash),
                        "log_index": p.log_index,
                        "buyer": format!("{:?}", p.buyer),
                        "btc_amount": p.btc_amount.to_string(),
                        "token_amount": p.token_amount.to_string(),
                        "supply_before": p.supply_before.to_string(),
                        "supply_after": p.supply_after.to_string(),
                        "new_price": p.new_price.to_string(),
                        "timestamp": p.timestamp,
                    })
                })
                .collect();
            serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Csv => csv_output(
            &[
                "block_number",
                "tx_hash",
                "log_index",
                "buyer",
                "btc_amount",
                "token_amount",
                "supply_after",
                "new_price",
            ],
            purchases
                .iter()
                .map(|p| {
                    vec![
                        p.block_number.to_string(),
                        format!("{:?}", p.tx_hash),
                        p.log_index.to_string(),
                        format!("{:?}", p.buyer),
                        p.btc_amount.to_string(),
                        p.token_amount.to_string(),
                        p.supply_after.to_string(),
                        p.new_price.to_string(),
                    ]
                })
                .collect(),
        ),
    }
}

pub fn format_pending_metadata(rows: &[PendingMetadata], format: &OutputFormat) -> String {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                return "No pending metadata found.".to_string();
            }

            let mut table = new_table(vec!["Id", "Name", "Symbol", "Content Id", "Applied"]);
            for row in rows {
                table.add_row(vec![
                    Cell::new(row.id),
                    Cell::new(&row.name),
                    Cell::new(&row.symbol),
                    Cell::new(&row.content_id),
                    Cell::new(if row.applied { "yes" } else { "no" }),
                ]);
            }
            table.to_string()
        }
        OutputFormat::Json => {
            let json_rows: Vec<_> = rows
                .iter()
                .map(|r| {
                    json!({
                        "id": r.id,
                        "name": r.name,
                        "symbol": r.symbol,
                        "content_id": r.content_id,
                        "applied": r.applied,
                        "created_at": r.created_at,
                    })
                })
                .collect();
            serde_json::to_string_pretty(&json_rows).unwrap_or_else(|_| "[]".to_string())
        }
        OutputFormat::Csv => csv_output(
            &["id", "name", "symbol", "content_id", "applied"],
            rows.iter()
                .map(|r| {
                    vec![
                        r.id.to_string(),
                        r.name.clone(),
                        r.symbol.clone(),
                        r.content_id.clone(),
                        r.applied.to_string(),
                    ]
                })
                .collect(),
        ),
    }
}

fn format_tx_hash(hash: &str) -> String {
    if hash.len() <= 12 {
        return hash.to_string();
    }
    format!("{}...{}", &hash[..6], &hash[hash.len() - 4..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_format_defaults_to_table() {
        assert!(matches!(OutputFormat::from("JSON"), OutputFormat::Json));
        assert!(matches!(OutputFormat::from("csv"), OutputFormat::Csv));
        assert!(matches!(OutputFormat::from("fancy"), OutputFormat::Table));
    }

    #[test]
    fn status_csv_has_header_and_row() {
        let status = IndexerStatus {
            last_processed_block: Some(42),
            active_launches: 2,
            finalized_launches: 1,
            purchases: 9,
        };
        let csv = format_status(&status, &OutputFormat::Csv);
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(
            lines,
            vec![
                "last_processed_block,active_launches,finalized_launches,purchases",
                "42,2,1,9"
            ]
        );
    }

    #[test]
    fn tx_hash_is_shortened() {
        assert_eq!(format_tx_hash("0x1234567890abcdef"), "0x1234...cdef");
    }
}
