mod config;
mod indicators;
mod schema;

pub mod builder;
pub mod flags;
pub mod manual;
pub mod stats;
pub mod summary;

use log::debug;

pub use crate::config::*;
pub use crate::indicators::*;
pub use crate::schema::*;

/// A SHA-256 fingerprint of the derived columns of the whole dataset.
///
/// The records are processed in order and every cell is rendered the same
/// way as in the exports, so two runs over the same input produce the same
/// digest.
pub fn derived_digest(records: &[HouseholdRecord]) -> String {
    let mut buffer = String::new();
    buffer.push_str(&DERIVED_COLUMNS.join("\t"));
    buffer.push('\n');
    for record in records.iter() {
        buffer.push_str(&record.id);
        if let Some(ind) = record.indicators.as_ref() {
            for cell in render_derived(ind) {
                buffer.push('\t');
                buffer.push_str(&cell);
            }
        }
        buffer.push('\n');
    }
    let res = sha256::digest(buffer);
    debug!("derived_digest: {} records -> {}", records.len(), res);
    res
}
