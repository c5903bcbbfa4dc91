use std::borrow::Cow;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;

use crate::checksum::crc32;
use crate::engine::ChunkUpload;

/// Decode a stored part, restoring trailing `=` padding that some senders trim.
pub fn decode_padded(encoded: &[u8]) -> Result<Vec<u8>, base64::DecodeError> {
    let rem = encoded.len() % 4;
    let padded: Cow<'_, [u8]> = if rem == 0 {
        Cow::Borrowed(encoded)
    } else {
        let mut owned = encoded.to_vec();
        owned.resize(encoded.len() + (4 - rem), b'=');
        Cow::Owned(owned)
    };
    B64.decode(padded)
}

/// Split `data` into `chunk_size` pieces ready to post, each Base64-encoded
/// with its CRC-32. This is the sender's half of the protocol.
pub fn split_for_upload(filename: &str, data: &[u8], chunk_size: usize) -> Vec<ChunkUpload> {
    let pieces: Vec<&[u8]> = data.chunks(chunk_size.max(1)).collect();
    let total_parts = pieces.len() as u32;

    pieces
        .into_iter()
        .enumerate()
        .map(|(i, piece)| {
            let payload = B64.encode(piece);
            ChunkUpload {
                file_id: filename.to_string(),
                part: i as u32 + 1,
                total_parts,
                crc32: crc32(payload.as_bytes()),
                payload,
            }
        })
        .collect()
}
