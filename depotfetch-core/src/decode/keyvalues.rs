//! `Key.vdf` reader on top of `keyvalues-parser`:
//!
//! ```text
//! "depots"
//! {
//!     "228990" { "DecryptionKey" "44d8..." }
//! }
//! ```

use keyvalues_parser::{Value, Vdf};

use crate::error::DecodeError;

const DEPOTS: &str = "depots";
const DECRYPTION_KEY: &str = "DecryptionKey";

/// `(depot_id, DecryptionKey)` for every depot under the top-level `depots` block,
/// ordered by depot id.
///
/// Depots without a `DecryptionKey` are skipped. Key names match case-insensitively.
pub fn depot_keys(input: &str) -> Result<Vec<(String, String)>, DecodeError> {
    let vdf = Vdf::parse(input).map_err(|e| DecodeError::MalformedKeyValues(e.to_string()))?;
    let depots = match vdf.value.get_obj() {
        Some(obj) if vdf.key.eq_ignore_ascii_case(DEPOTS) => obj,
        _ => {
            return Err(DecodeError::MalformedKeyValues(
                "missing top-level \"depots\" block".to_string(),
            ))
        }
    };
    Ok(depots
        .iter()
        .filter_map(|(depot_id, values)| {
            let depot = values.iter().find_map(Value::get_obj)?;
            let key = depot
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(DECRYPTION_KEY))
                .and_then(|(_, values)| values.iter().find_map(Value::get_str))?;
            Some((depot_id.to_string(), key.to_string()))
        })
        .collect())
}
