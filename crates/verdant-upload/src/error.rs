/// Errors produced while accepting or reassembling an upload.
///
/// Every variant that concerns a single part carries the file and part index
/// so the sender can decide what to resend.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("missing or invalid field: {0}")]
    MissingOrInvalidField(String),

    #[error("checksum mismatch for {file} part {part}: declared {declared}, computed {computed}")]
    ChecksumMismatch {
        file: String,
        part: u32,
        declared: u32,
        computed: u32,
    },

    #[error(
        "incomplete sequence for {file}: {} of {total} parts missing, first {:?}",
        .missing.len(),
        missing_preview(.missing)
    )]
    IncompleteSequence {
        file: String,
        total: u32,
        missing: Vec<u32>,
    },

    #[error("part {part} of {file} is not valid base64")]
    InvalidEncoding { file: String, part: u32 },

    #[error("chunk not found: {file} part {part}")]
    ChunkNotFound { file: String, part: u32 },

    #[error("chunk store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Missing indices shown in messages; the full list stays on the error.
const MISSING_PREVIEW: usize = 8;

pub(crate) fn missing_preview(missing: &[u32]) -> &[u32] {
    &missing[..missing.len().min(MISSING_PREVIEW)]
}

impl UploadError {
    /// The part the sender should act on, when the error is about one part.
    pub fn part(&self) -> Option<u32> {
        match self {
            UploadError::ChecksumMismatch { part, .. }
            | UploadError::InvalidEncoding { part, .. }
            | UploadError::ChunkNotFound { part, .. } => Some(*part),
            UploadError::IncompleteSequence { missing, .. } => missing.first().copied(),
            UploadError::MissingOrInvalidField(_) | UploadError::Io(_) => None,
        }
    }
}
