use serde::{Deserialize, Serialize};
use std::path::Path;
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};

/// One question/answer pair as stored by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatEntry {
    pub question: String,
    pub answer: String,
    pub timestamp: String,
}

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

impl ChatEntry {
    pub fn parsed_timestamp(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::parse(&self.timestamp, &Rfc3339).ok()
    }

    /// Renders the timestamp as `May 4, 2025 09:07` in the local offset.
    /// Falls back to the raw string when it is not valid RFC 3339.
    pub fn display_timestamp(&self) -> String {
        let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
        match self.parsed_timestamp() {
            Some(datetime) => format_entry_time(datetime.to_offset(offset)),
            None => self.timestamp.clone(),
        }
    }
}

fn format_entry_time(datetime: OffsetDateTime) -> String {
    let month = MONTH_NAMES[usize::from(u8::from(datetime.month())) - 1];
    format!(
        "{month} {}, {} {:02}:{:02}",
        datetime.day(),
        datetime.year(),
        datetime.hour(),
        datetime.minute()
    )
}

/// Ordered conversation log. Insertion order is the only meaningful order.
pub type ChatHistory = Vec<ChatEntry>;

/// Model identifiers offered by the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCatalog {
    #[serde(default)]
    pub models: Vec<String>,
}

impl ModelCatalog {
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn first(&self) -> Option<&str> {
        self.models.first().map(String::as_str)
    }

    pub fn contains(&self, model: &str) -> bool {
        self.models.iter().any(|m| m == model)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default)]
    pub history: ChatHistory,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ResetResponse {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// A document selected for ingestion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, bytes })
    }

    pub fn mime_type(&self) -> &'static str {
        let ext = Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => "application/pdf",
            Some("txt") => "text/plain",
            Some("docx") => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            _ => "application/octet-stream",
        }
    }
}

pub const DEFAULT_CHUNK_SIZE: u32 = 1000;
pub const DEFAULT_CHUNK_OVERLAP: u32 = 50;

/// Chunking parameters sent with an ingestion request.
///
/// Invariant: `chunk_size > 0` and `chunk_overlap <= chunk_size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UploadConfig {
    chunk_size: u32,
    chunk_overlap: u32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl UploadConfig {
    /// Resolves raw form values into a valid config.
    ///
    /// A missing or non-positive size becomes [`DEFAULT_CHUNK_SIZE`]. A missing,
    /// negative or oversized overlap becomes [`DEFAULT_CHUNK_OVERLAP`], capped
    /// below the resolved size.
    ///
    /// An overlap equal to the size is a valid form value and is forwarded
    /// as given. The ingest endpoint rejects it with a 400 whose `detail`
    /// reaches the user through the failed [`UploadResult`]; only the
    /// substituted default is kept strictly below the size.
    pub fn resolve(chunk_size: Option<i64>, chunk_overlap: Option<i64>) -> Self {
        let chunk_size = chunk_size
            .filter(|size| *size > 0)
            .and_then(|size| u32::try_from(size).ok())
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        let chunk_overlap = chunk_overlap
            .filter(|overlap| *overlap >= 0 && *overlap <= i64::from(chunk_size))
            .and_then(|overlap| u32::try_from(overlap).ok())
            .unwrap_or_else(|| DEFAULT_CHUNK_OVERLAP.min(chunk_size - 1));
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> u32 {
        self.chunk_overlap
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub file: String,
    pub error: String,
}

/// Outcome of one ingestion request. Successes and failures may coexist.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    #[serde(default)]
    pub files_indexed: Vec<String>,
    #[serde(default)]
    pub total_chunks: u64,
    #[serde(default)]
    pub errors: Vec<FileError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UploadResult {
    pub fn failed(file: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            files_indexed: Vec::new(),
            total_chunks: 0,
            errors: vec![FileError {
                file: file.into(),
                error: error.into(),
            }],
            status: None,
        }
    }

    pub fn has_indexed(&self) -> bool {
        !self.files_indexed.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}
