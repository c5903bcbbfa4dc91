/// Result of checking one part against the sender's declared CRC-32.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    /// Payload with transport line breaks removed. This is what gets stored.
    pub payload: String,
    pub computed: u32,
    pub ok: bool,
}

/// Strips every `\r` and `\n`. Other whitespace is left alone.
pub fn clean_payload(text: &str) -> String {
    text.chars().filter(|c| *c != '\r' && *c != '\n').collect()
}

/// CRC-32 (IEEE 802.3).
#[inline]
pub fn crc32(bytes: &[u8]) -> u32 {
    crc32fast::hash(bytes)
}

/// Cleans `text` and compares the CRC-32 of its UTF-8 bytes with `declared`.
///
/// Detects transport corruption only; this is not an authenticity check.
pub fn verify(text: &str, declared: u32) -> Verification {
    let payload = clean_payload(text);
    let computed = crc32(payload.as_bytes());
    Verification {
        payload,
        computed,
        ok: computed == declared,
    }
}
