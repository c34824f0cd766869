//! String formatting for logs and CLI output.

use alloy_primitives::Address;

/// Relay task ids are long hashes; logs keep the first 8 characters.
/// Counts characters, not bytes.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((end, _)) => format!("{}..", &id[..end]),
		None => id.to_string(),
	}
}

/// Checksummed address shortened for log fields, e.g. `0x1234..abcd`.
pub fn short_address(address: &Address) -> String {
	let full = address.to_checksum(None);
	format!("{}..{}", &full[..6], &full[full.len() - 4..])
}
