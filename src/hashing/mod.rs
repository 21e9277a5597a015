use blake3::Hasher;

use crate::entity::NormalizedEntity;

/// 32-byte cache key for a screening request.
pub type ScreeningKey = [u8; 32];

/// Derives the cache key for an entity.
///
/// The key covers every input that can change the screening outcome: the
/// canonical name, language, DOB, the sorted identifier tags, and the sorted
/// policy flags. Field boundaries are separated explicitly so adjacent fields
/// cannot alias each other, and identifiers are sorted and deduplicated so
/// upstream ordering does not fragment the cache.
pub fn screening_key(entity: &NormalizedEntity) -> ScreeningKey {
    let mut hasher = Hasher::new();
    hasher.update(entity.normalized_name().as_bytes());
    hasher.update(b"|");
    hasher.update(entity.language.as_str().as_bytes());
    hasher.update(b"|");
    if let Some(dob) = entity.dob {
        hasher.update(dob.to_string().as_bytes());
    }
    hasher.update(b"|");

    let mut tags: Vec<String> = entity.identifiers.iter().map(|i| i.tag()).collect();
    tags.sort_unstable();
    tags.dedup();
    for tag in &tags {
        hasher.update(tag.as_bytes());
        hasher.update(b",");
    }
    hasher.update(b"|");

    for flag in entity.policy_flags.iter() {
        hasher.update(flag.as_str().as_bytes());
        hasher.update(b",");
    }

    *hasher.finalize().as_bytes()
}

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// # Truncation Rationale
///
/// Taking the first 8 bytes of a BLAKE3 hash is acceptable here because both
/// call sites tolerate collisions gracefully:
///
/// - **Feature bucketing**: the name vectorizer folds n-grams into a fixed
///   dimension; two features sharing a bucket merely add their counts, which
///   hashed vectorizers do by construction anyway.
/// - **Fingerprints in logs**: a collision makes two requests share a log
///   fingerprint, nothing more.
///
/// With 64 bits of entropy the birthday bound sits near 4.3 billion items;
/// practical corpora are far below that. This hash carries no security
/// obligations. Where stricter uniqueness is needed (the cache key), the full
/// 32-byte output of [`screening_key`] is used instead.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let bytes: [u8; 8] = hash.as_bytes()[0..8]
        .try_into()
        .expect("BLAKE3 always produces at least 8 bytes");
    u64::from_le_bytes(bytes)
}

/// Short hex fingerprint of a screening key, for logs.
#[inline]
pub fn key_fingerprint(key: &ScreeningKey) -> String {
    key[..8].iter().map(|b| format!("{:02x}", b)).collect()
}
