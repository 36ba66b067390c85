/// BLAKE3 hash (32 bytes).
pub type Hash = [u8; 32];

/// Hash arbitrary data using BLAKE3.
pub fn hash(data: &[u8]) -> Hash {
    *blake3::hash(data).as_bytes()
}

/// Hash arbitrary data using BLAKE3 and render it as lower-case hex.
pub fn hash_hex(data: &[u8]) -> String {
    hex::encode(hash(data))
}
