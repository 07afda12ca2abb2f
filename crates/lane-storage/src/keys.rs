//! Shared object-key generation for storage backends.
//!
//! Key format: `{owner_id}/{timestamp_ms}_{random_hex}` with an optional
//! extension derived from the content type. All backends mint keys through
//! this module so the owner-prefix and uniqueness guarantees hold uniformly.

use rand::RngCore;
use uuid::Uuid;

/// Generate an owner-scoped object key.
///
/// The millisecond timestamp plus an 8-byte cryptographically random suffix
/// makes collisions practically impossible without central coordination;
/// two calls for the same owner in the same millisecond still differ.
pub fn generate_object_key(owner_id: Uuid, content_type: Option<&str>) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let mut raw = [0u8; 8];
    rand::rng().fill_bytes(&mut raw);
    let suffix = hex::encode(raw);

    match content_type.and_then(extension_for) {
        Some(ext) => format!("{}/{}_{}.{}", owner_id, timestamp, suffix, ext),
        None => format!("{}/{}_{}", owner_id, timestamp, suffix),
    }
}

/// Map a MIME type to the extension used in generated keys.
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type.split(';').next().unwrap_or("").trim() {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

/// Validate the shape of a storage key before it reaches a backend.
///
/// Keys must be owner-prefixed relative paths: no leading slash, no empty
/// segments, no `..` components.
pub fn is_well_formed(key: &str) -> bool {
    if key.is_empty() || key.starts_with('/') {
        return false;
    }
    let mut segments = key.split('/');
    let has_owner_and_name = key.contains('/');
    has_owner_and_name && segments.all(|s| !s.is_empty() && s != "..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_owner_prefixed() {
        let owner = Uuid::new_v4();
        let key = generate_object_key(owner, None);
        assert!(key.starts_with(&format!("{}/", owner)));
        assert!(is_well_formed(&key));
    }

    #[test]
    fn keys_for_distinct_owners_never_collide() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let key_a = generate_object_key(a, None);
        let key_b = generate_object_key(b, None);
        assert_ne!(key_a.split('/').next(), key_b.split('/').next());
    }

    #[test]
    fn same_owner_same_instant_yields_distinct_keys() {
        let owner = Uuid::new_v4();
        // Minting many keys back to back lands several in the same
        // millisecond; the random suffix must still keep them distinct.
        let keys: std::collections::HashSet<String> = (0..64)
            .map(|_| generate_object_key(owner, None))
            .collect();
        assert_eq!(keys.len(), 64);
    }

    #[test]
    fn content_type_controls_extension() {
        let owner = Uuid::new_v4();
        let key = generate_object_key(owner, Some("image/png"));
        assert!(key.ends_with(".png"));
        let key = generate_object_key(owner, Some("image/jpeg; charset=binary"));
        assert!(key.ends_with(".jpg"));
        let key = generate_object_key(owner, Some("application/octet-stream"));
        assert!(!key.contains('.'));
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("/etc/passwd"));
        assert!(!is_well_formed("no-owner-segment"));
        assert!(!is_well_formed("owner//file"));
        assert!(!is_well_formed("owner/../file"));
    }
}
