//! Key layout for the host store partitions
//!
//! - `hosts`: host:{id:016} -> HostDefinition (JSON)
//! - `metadata`: meta:{key} -> value (string)
//!
//! Zero-padded ids keep the partition iterating in insertion order.

pub const META_NEXT_HOST_ID: &str = "next_host_id";

/// Encode a host key: host:{id:016}
pub fn encode_host_key(id: u64) -> Vec<u8> {
    format!("host:{:016}", id).into_bytes()
}

/// Decode a host key back into its id
pub fn decode_host_key(key: &[u8]) -> Option<u64> {
    let key_str = std::str::from_utf8(key).ok()?;
    key_str.strip_prefix("host:")?.parse().ok()
}

/// Encode a metadata key: meta:{key}
pub fn encode_meta_key(key: &str) -> Vec<u8> {
    format!("meta:{}", key).into_bytes()
}
