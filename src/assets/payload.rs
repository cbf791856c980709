use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::foundation::error::{SnapError, SnapResult};

const JPEG_MIME: &str = "image/jpeg";

/// Encoded raster image stored inline as a `data:` URL.
///
/// An empty payload is valid: it marks an image evicted by storage relief.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Payload(String);

impl Payload {
    /// The evicted/empty payload.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Wrap encoded JPEG bytes.
    pub fn from_jpeg_bytes(bytes: &[u8]) -> Self {
        Self::from_bytes(JPEG_MIME, bytes)
    }

    /// Wrap encoded bytes of any image MIME type.
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self(format!("data:{mime};base64,{}", STANDARD.encode(bytes)))
    }

    /// Wrap an existing data URL without decoding it.
    pub fn from_data_url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// `true` when the payload was evicted or never set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Persisted size in bytes, which is what storage quotas count.
    pub fn byte_len(&self) -> usize {
        self.0.len()
    }

    /// Borrow the data URL.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// MIME type declared by the data URL header, if any.
    pub fn mime(&self) -> Option<&str> {
        let rest = self.0.strip_prefix("data:")?;
        let header = rest.split(',').next()?;
        let mime = header.split(';').next()?;
        (!mime.is_empty()).then_some(mime)
    }

    /// Decode the base64 body back into encoded image bytes.
    ///
    /// Bare base64 without a `data:` header is accepted too.
    pub fn to_bytes(&self) -> SnapResult<Vec<u8>> {
        if self.is_empty() {
            return Err(SnapError::decode("payload is empty"));
        }
        let body = match self.0.strip_prefix("data:") {
            Some(rest) => {
                let (header, body) = rest
                    .split_once(',')
                    .ok_or_else(|| SnapError::decode("data url has no ',' separator"))?;
                if !header.ends_with(";base64") {
                    return Err(SnapError::decode("data url is not base64 encoded"));
                }
                body
            }
            None => self.0.as_str(),
        };
        STANDARD
            .decode(body.trim())
            .map_err(|e| SnapError::decode(format!("invalid base64 payload: {e}")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/payload.rs"]
mod tests;
