/// Verdant chunked upload: reassembles a file sent as numbered Base64 parts.
///
/// - CRC-32 verification of every part before it touches disk
/// - Crash-safe part files keyed by (file, part index)
/// - Completion triggered by the declared-last part, in strict index order
/// - Missing parts abort completion without discarding received progress

pub mod codec;
pub mod checksum;
pub mod engine;
pub mod error;
pub mod session;
pub mod store;

pub use checksum::{Verification, clean_payload, crc32, verify};
pub use codec::{decode_padded, split_for_upload};
pub use engine::{ChunkUpload, MAX_PARTS, Outcome, Reassembler, validate_file_id};
pub use error::UploadError;
pub use session::ReceivedParts;
pub use store::ChunkStore;
