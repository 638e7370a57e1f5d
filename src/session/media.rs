//! Remote media loading.
//!
//! # Responsibilities
//! - Download media referenced by URL
//! - Decide the MIME type (URL extension first, then the server's header)
//! - Derive a filename and size for the outgoing attachment
//!
//! # Design Decisions
//! - Without `unsafe_mime` a URL with no recognised extension is refused
//!   before any network traffic
//! - With `unsafe_mime` the declared `Content-Type` is taken verbatim, even
//!   when it is nonstandard

use async_trait::async_trait;
use base64::Engine;
use reqwest::header::{ACCEPT, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE};
use url::Url;

use crate::session::client::{Media, MediaLoader, MediaOptions};

const ACCEPT_MEDIA: &str = "image/* video/* text/* audio/*";
const FALLBACK_MIME: &str = "application/octet-stream";

/// Errors raised while loading media.
#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Invalid media URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unable to determine MIME type using URL. Set unsafeMime to true to download it anyway.")]
    UnknownMime,

    #[error("Failed to fetch media: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Media server responded with status {0}")]
    Status(u16),
}

/// Media loader backed by a plain HTTP client.
#[derive(Debug, Clone, Default)]
pub struct HttpMediaLoader {
    http: reqwest::Client,
}

impl HttpMediaLoader {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl MediaLoader for HttpMediaLoader {
    async fn from_url(&self, url: &str, options: MediaOptions) -> Result<Media, MediaError> {
        let parsed = Url::parse(url).map_err(|e| MediaError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let guessed = guess_mime(parsed.path());
        if guessed.is_none() && !options.unsafe_mime {
            return Err(MediaError::UnknownMime);
        }

        let response = self
            .http
            .get(parsed.clone())
            .header(ACCEPT, ACCEPT_MEDIA)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Status(status.as_u16()));
        }

        let headers = response.headers().clone();
        let declared = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let length = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        let disposition_name = headers
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition);

        let bytes = response.bytes().await?;

        let mimetype = guessed
            .map(str::to_string)
            .or(declared)
            .unwrap_or_else(|| FALLBACK_MIME.to_string());
        let filename = disposition_name.unwrap_or_else(|| filename_from_path(&parsed));

        tracing::debug!(
            url = %parsed,
            mimetype = %mimetype,
            bytes = bytes.len(),
            "Media loaded"
        );

        Ok(Media {
            mimetype,
            data: base64::engine::general_purpose::STANDARD.encode(&bytes),
            filename: Some(filename),
            filesize: Some(length.unwrap_or(bytes.len() as u64)),
        })
    }
}

/// MIME type implied by the extension of `path`, if recognised.
pub fn guess_mime(path: &str) -> Option<&'static str> {
    let name = path.rsplit('/').next()?;
    let (_, ext) = name.rsplit_once('.')?;
    let mime = match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "ico" => "image/vnd.microsoft.icon",
        "tif" | "tiff" => "image/tiff",
        "mp4" => "video/mp4",
        "3gp" => "video/3gpp",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mp3" => "audio/mpeg",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => return None,
    };
    Some(mime)
}

/// `filename="..."` from a `Content-Disposition` header.
fn filename_from_disposition(header: &str) -> Option<String> {
    const KEY: &str = "filename=\"";
    let start = header.find(KEY)? + KEY.len();
    let rest = &header[start..];
    let end = rest.rfind('"')?;
    let name = &rest[..end];
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn filename_from_path(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .unwrap_or("file")
        .to_string()
}
