use crate::food_log::generate_id;
use crate::models::{FoodEntry, Rating};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureError {
    /// The capture source produced nothing.
    Missing,
    /// The snapshot is not a base64 `data:image/...` URI.
    Malformed,
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::Missing => write!(f, "no image captured"),
            CaptureError::Malformed => {
                write!(f, "image must be a base64 data:image/... URI")
            }
        }
    }
}

impl std::error::Error for CaptureError {}

/// True for `data:image/<subtype>;base64,<payload>` with a plain base64 payload.
pub fn is_image_data_uri(image: &str) -> bool {
    let Some(rest) = image.strip_prefix("data:image/") else {
        return false;
    };
    let Some((subtype, payload)) = rest.split_once(";base64,") else {
        return false;
    };

    !subtype.is_empty()
        && subtype
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'.' | b'-'))
        && !payload.is_empty()
        && payload
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

/// State of one capture flow, from snapshot to rating.
#[derive(Debug, Default)]
pub struct CaptureSession {
    image: Option<String>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the snapshot. On error the session is left empty.
    pub fn capture(&mut self, image: impl Into<String>) -> Result<(), CaptureError> {
        self.image = None;
        let image = image.into();
        let image = image.trim();
        if image.is_empty() {
            return Err(CaptureError::Missing);
        }
        if !is_image_data_uri(image) {
            return Err(CaptureError::Malformed);
        }
        self.image = Some(image.to_string());
        Ok(())
    }

    pub fn captured(&self) -> Option<&str> {
        self.image.as_deref()
    }

    /// Turns the captured snapshot into an entry, emptying the session.
    pub fn rate(&mut self, rating: Rating, now_ms: i64) -> Option<FoodEntry> {
        let image = self.image.take()?;
        Some(FoodEntry {
            id: generate_id(now_ms),
            image,
            rating,
            timestamp: now_ms,
        })
    }

    pub fn cancel(&mut self) {
        self.image = None;
    }
}
