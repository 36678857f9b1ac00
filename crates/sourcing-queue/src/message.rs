use serde::{Deserialize, Serialize};

use crate::QueueError;

/// The envelope consumed by the external worker: `{"keyword": "<string>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMessage {
    pub keyword: String,
}

impl QueueMessage {
    #[must_use]
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
        }
    }

    /// Encode the envelope as UTF-8 JSON.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Json`] if serialisation fails.
    pub fn to_json(&self) -> Result<String, QueueError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_and_backslashes_do_not_break_the_envelope() {
        let raw = r#"12" \ "pipe" wrench"#;
        let json = QueueMessage::new(raw).to_json().expect("encode");

        let decoded: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
        assert_eq!(decoded["keyword"], raw);
        assert_eq!(decoded.as_object().map(serde_json::Map::len), Some(1));
    }

    #[test]
    fn non_ascii_keywords_survive_encoding() {
        let json = QueueMessage::new("손난로").to_json().expect("encode");
        let decoded: QueueMessage = serde_json::from_str(&json).expect("decode");
        assert_eq!(decoded.keyword, "손난로");
    }
}
