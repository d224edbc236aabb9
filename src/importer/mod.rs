//! Batch loader for semicolon-delimited order exports.
//!
//! The file is parsed once, then walked in two passes: the first
//! reconciles the four parent entities (client, locality, product,
//! order) with get-or-create semantics keyed on their natural keys,
//! the second materializes one order line per row. Row failures are
//! counted and skipped; only a missing or undecodable file aborts the
//! run. The routine is deliberately not transactional: rows persisted
//! before a failure stay persisted.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::entities::{Category, Region, Segment};
use crate::repositories::{
    EntityStore, NewClient, NewLocality, NewOrder, NewOrderLine, NewProduct,
};

/// Terminal import failures. Everything else is a counted, per-row skip.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("import file not found: {0}")]
    FileNotFound(String),

    #[error("failed to read import file: {0}")]
    Io(#[from] io::Error),

    #[error("import file is neither valid UTF-8 nor cp1252")]
    Decode,
}

/// Outcome of an import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub lines_read: usize,
    pub lines_created: usize,
    pub errors: usize,
}

/// One raw CSV row; all fields kept as text until the passes coerce them
#[derive(Debug, Clone, Deserialize)]
pub struct ImportRow {
    #[serde(rename = "Code_postal")]
    pub postal_code: String,
    #[serde(rename = "Ville")]
    pub city: String,
    #[serde(rename = "Etat")]
    pub state: String,
    #[serde(rename = "Region")]
    pub region: String,
    #[serde(rename = "ID_Client")]
    pub client_id: String,
    #[serde(rename = "Nom_Client")]
    pub client_name: String,
    #[serde(rename = "Segment")]
    pub segment: String,
    #[serde(rename = "ID_Produit")]
    pub product_id: String,
    #[serde(rename = "Nom_Produit")]
    pub product_name: String,
    #[serde(rename = "Categorie")]
    pub category: String,
    #[serde(rename = "Sous_Categorie")]
    pub subcategory: String,
    #[serde(rename = "ID_Commande")]
    pub order_id: String,
    #[serde(rename = "Date_Commande")]
    pub order_date: String,
    #[serde(rename = "Date_Livraison")]
    pub delivery_date: String,
    #[serde(rename = "Mode_Livraison")]
    pub delivery_mode: String,
    #[serde(rename = "Quantite")]
    pub quantity: String,
    #[serde(rename = "Ventes")]
    pub sales: String,
    #[serde(rename = "Remise")]
    pub discount: String,
    #[serde(rename = "Benefice")]
    pub profit: String,
}

/// Runs a full import of `path` against `store`.
pub async fn run(path: &Path, store: &dyn EntityStore) -> Result<ImportSummary, ImportError> {
    let parsed = read_rows(path)?;
    let lines_read = parsed.rows.len() + parsed.malformed;
    info!(lines = lines_read, file = %path.display(), "import file parsed");

    let mut summary = ImportSummary {
        lines_read,
        lines_created: 0,
        errors: parsed.malformed,
    };

    reconcile_parents(&parsed.rows, store).await;
    materialize_lines(&parsed.rows, store, &mut summary).await;

    info!(
        lines_read = summary.lines_read,
        lines_created = summary.lines_created,
        errors = summary.errors,
        "import finished"
    );

    Ok(summary)
}

/// Parsed row set: well-formed rows paired with their file line
/// numbers, plus a count of records the CSV layer could not produce
/// (short rows, quoting damage).
pub struct ParsedRows {
    pub rows: Vec<(usize, ImportRow)>,
    pub malformed: usize,
}

/// Reads and decodes the file, then parses the whole row set.
///
/// Decoding tries UTF-8 first and falls back to cp1252 for legacy
/// Windows exports; there is no per-line encoding recovery. A record
/// that fails to parse is counted as malformed and skipped, it never
/// aborts the batch.
pub fn read_rows(path: &Path) -> Result<ParsedRows, ImportError> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            ImportError::FileNotFound(path.display().to_string())
        } else {
            ImportError::Io(e)
        }
    })?;

    let text = decode_import_bytes(&bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    let mut malformed = 0;
    for (idx, record) in reader.deserialize::<ImportRow>().enumerate() {
        let line_no = idx + 2; // header is line 1
        match record {
            Ok(row) => rows.push((line_no, row)),
            Err(err) => {
                malformed += 1;
                warn!(line = line_no, %err, "unreadable record skipped");
            }
        }
    }

    Ok(ParsedRows { rows, malformed })
}

fn decode_import_bytes(bytes: &[u8]) -> Result<String, ImportError> {
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(text.to_string());
    }

    warn!("import file is not valid UTF-8, retrying as cp1252");
    let (text, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
    if had_errors {
        return Err(ImportError::Decode);
    }
    Ok(text.into_owned())
}

/// Pass 1: create-if-absent for each natural key on first sight.
///
/// The seen-key sets are scoped to this run; they only avoid redundant
/// store round trips. Attributes come from the first row carrying a
/// key — later rows never update an entity even when their values
/// differ. A row whose parent attributes fail to coerce is skipped
/// here without marking the key seen, so a later well-formed row can
/// still create the entity; the lookup miss is counted in pass 2.
async fn reconcile_parents(rows: &[(usize, ImportRow)], store: &dyn EntityStore) {
    let mut seen_postal: HashSet<i64> = HashSet::new();
    let mut seen_clients: HashSet<String> = HashSet::new();
    let mut seen_products: HashSet<String> = HashSet::new();
    let mut seen_orders: HashSet<String> = HashSet::new();

    for (line_no, row) in rows {
        let line_no = *line_no;

        match parse_locality(row) {
            Ok(locality) => {
                if seen_postal.insert(locality.postal_code) {
                    if let Err(err) = store.create_locality_if_absent(locality).await {
                        warn!(line = line_no, %err, "locality reconciliation failed");
                    }
                }
            }
            Err(reason) => warn!(line = line_no, %reason, "skipping locality"),
        }

        match parse_client(row) {
            Ok(client) => {
                if !seen_clients.contains(&client.id) {
                    let id = client.id.clone();
                    if let Err(err) = store.create_client_if_absent(client).await {
                        warn!(line = line_no, %err, "client reconciliation failed");
                    }
                    seen_clients.insert(id);
                }
            }
            Err(reason) => warn!(line = line_no, %reason, "skipping client"),
        }

        match parse_product(row) {
            Ok(product) => {
                if !seen_products.contains(&product.id) {
                    let id = product.id.clone();
                    if let Err(err) = store.create_product_if_absent(product).await {
                        warn!(line = line_no, %err, "product reconciliation failed");
                    }
                    seen_products.insert(id);
                }
            }
            Err(reason) => warn!(line = line_no, %reason, "skipping product"),
        }

        match parse_order(row) {
            Ok(order) => {
                if !seen_orders.contains(&order.id) {
                    let id = order.id.clone();
                    if let Err(err) = store.create_order_if_absent(order).await {
                        warn!(line = line_no, %err, "order reconciliation failed");
                    }
                    seen_orders.insert(id);
                }
            }
            Err(reason) => warn!(line = line_no, %reason, "skipping order"),
        }
    }
}

/// Pass 2: look up all four parents per row and create the order line.
/// Any lookup or parse failure skips the row and bumps the error count.
async fn materialize_lines(
    rows: &[(usize, ImportRow)],
    store: &dyn EntityStore,
    summary: &mut ImportSummary,
) {
    for (line_no, row) in rows {
        let line_no = *line_no;

        match build_line(row, store).await {
            Ok(line) => match store.create_order_line(line).await {
                Ok(()) => {
                    summary.lines_created += 1;
                    debug!(
                        line = line_no,
                        order = %row.order_id,
                        product = %row.product_id,
                        "order line created"
                    );
                }
                Err(err) => {
                    summary.errors += 1;
                    warn!(line = line_no, %err, "order line insert failed");
                }
            },
            Err(reason) => {
                summary.errors += 1;
                warn!(line = line_no, %reason, "order line skipped");
            }
        }
    }
}

async fn build_line(row: &ImportRow, store: &dyn EntityStore) -> Result<NewOrderLine, String> {
    let order = store
        .find_order(row.order_id.trim())
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("order {:?} not found", row.order_id))?;

    let product = store
        .find_product(row.product_id.trim())
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("product {:?} not found", row.product_id))?;

    let client = store
        .find_client(row.client_id.trim())
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("client {:?} not found", row.client_id))?;

    let postal_code = parse_postal_code(&row.postal_code)?;
    let locality = store
        .find_locality(postal_code)
        .await
        .map_err(|e| e.to_string())?
        .ok_or_else(|| format!("locality {} not found", postal_code))?;

    let quantity: i32 = row
        .quantity
        .trim()
        .parse()
        .map_err(|_| format!("invalid quantity {:?}", row.quantity))?;

    Ok(NewOrderLine {
        order_id: order.id,
        product_id: product.id,
        client_id: client.id,
        locality_id: locality.id,
        quantity,
        price: parse_decimal(&row.sales).map_err(|_| format!("invalid price {:?}", row.sales))?,
        discount: parse_decimal(&row.discount)
            .map_err(|_| format!("invalid discount {:?}", row.discount))?,
        profit: parse_decimal(&row.profit)
            .map_err(|_| format!("invalid profit {:?}", row.profit))?,
    })
}

fn parse_locality(row: &ImportRow) -> Result<NewLocality, String> {
    Ok(NewLocality {
        postal_code: parse_postal_code(&row.postal_code)?,
        city: row.city.trim().to_string(),
        state: row.state.trim().to_string(),
        region: row
            .region
            .parse::<Region>()
            .map_err(|e| e.to_string())?,
    })
}

fn parse_client(row: &ImportRow) -> Result<NewClient, String> {
    let id = row.client_id.trim();
    if id.is_empty() {
        return Err("empty client id".to_string());
    }
    Ok(NewClient {
        id: id.to_string(),
        name: row.client_name.trim().to_string(),
        segment: row
            .segment
            .parse::<Segment>()
            .map_err(|e| e.to_string())?,
    })
}

fn parse_product(row: &ImportRow) -> Result<NewProduct, String> {
    let id = row.product_id.trim();
    if id.is_empty() {
        return Err("empty product id".to_string());
    }
    Ok(NewProduct {
        id: id.to_string(),
        name: row.product_name.trim().to_string(),
        category: row
            .category
            .parse::<Category>()
            .map_err(|e| e.to_string())?,
        subcategory: row.subcategory.trim().to_string(),
    })
}

fn parse_order(row: &ImportRow) -> Result<NewOrder, String> {
    let id = row.order_id.trim();
    if id.is_empty() {
        return Err("empty order id".to_string());
    }
    Ok(NewOrder {
        id: id.to_string(),
        order_date: parse_date(&row.order_date)?,
        delivery_date: parse_date(&row.delivery_date)?,
        delivery_mode: row.delivery_mode.trim().to_string(),
    })
}

fn parse_postal_code(raw: &str) -> Result<i64, String> {
    let code: i64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("invalid postal code {:?}", raw))?;
    if code <= 0 {
        return Err(format!("postal code must be positive, got {}", code));
    }
    Ok(code)
}

/// Parses a numeric field using comma as the decimal separator
/// (`"12,5"` → `12.5`); plain decimal-point values also pass.
fn parse_decimal(raw: &str) -> Result<f64, std::num::ParseFloatError> {
    raw.trim().replace(',', ".").parse()
}

/// ISO dates first, then the day-first format seen in French exports
fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y"))
        .map_err(|_| format!("invalid date {:?}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decimal_comma_is_normalized() {
        assert_eq!(parse_decimal("12,5").unwrap(), 12.5);
        assert_eq!(parse_decimal(" 3,75 ").unwrap(), 3.75);
        assert_eq!(parse_decimal("8.25").unwrap(), 8.25);
        assert!(parse_decimal("douze").is_err());
    }

    #[test]
    fn dates_accept_both_formats() {
        let expected = NaiveDate::from_ymd_opt(2017, 11, 8).unwrap();
        assert_eq!(parse_date("2017-11-08").unwrap(), expected);
        assert_eq!(parse_date("08/11/2017").unwrap(), expected);
        assert!(parse_date("soon").is_err());
    }

    #[test]
    fn postal_code_must_be_positive() {
        assert_eq!(parse_postal_code("42420").unwrap(), 42420);
        assert!(parse_postal_code("-5").is_err());
        assert!(parse_postal_code("abc").is_err());
    }

    #[test]
    fn cp1252_fallback_decodes_accented_bytes() {
        // "Liège" with a cp1252-encoded e-grave
        let bytes = b"Li\xe8ge";
        assert_eq!(decode_import_bytes(bytes).unwrap(), "Liège");
    }

    #[test]
    fn utf8_input_passes_through() {
        assert_eq!(decode_import_bytes("Liège".as_bytes()).unwrap(), "Liège");
    }
}
