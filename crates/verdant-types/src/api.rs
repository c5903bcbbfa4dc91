use serde::{Deserialize, Serialize};

// -- Upload --

/// Integer field that embedded senders transmit either as a JSON number or as
/// a numeric string (`"part": 3` and `"part": "3"` are both accepted).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseInt {
    Int(i64),
    Text(String),
}

impl LooseInt {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            LooseInt::Int(n) => Some(*n),
            LooseInt::Text(s) => s.trim().parse().ok(),
        }
    }
}

impl From<i64> for LooseInt {
    fn from(n: i64) -> Self {
        LooseInt::Int(n)
    }
}

/// Body of `POST /api/upload`. Every field is optional at the wire level so
/// that a missing field is reported as a protocol error rather than a
/// deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadRequest {
    pub filename: Option<String>,
    pub part: Option<LooseInt>,
    pub total_parts: Option<LooseInt>,
    pub data: Option<String>,
    pub crc32: Option<LooseInt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum UploadResponse {
    /// A non-final part was stored.
    Ok { part: u32, message: String },
    /// The declared-last part arrived and the file was assembled.
    Done { file: String },
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        part: Option<u32>,
    },
}

// -- Readings --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "ok".into() }
    }
}

// -- Gallery --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub name: String,
    pub url: String,
}

// -- Weather --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResponse {
    pub city: String,
    pub temperature: Option<f64>,
    pub condition: String,
    pub description: String,
    pub is_raining: bool,
    pub datetime: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
