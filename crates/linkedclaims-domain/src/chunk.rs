//! Document chunks handed to the pipeline by a segmenter

use serde::{Deserialize, Serialize};

/// One page or logical segment of a source document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Stable position of the chunk within its document
    pub index: usize,

    /// Extracted text
    pub text: String,

    /// Optional page image; carried through but not sent to text-only providers
    #[serde(skip)]
    pub image: Option<Vec<u8>>,
}

impl DocumentChunk {
    /// Create a text-only chunk
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
            image: None,
        }
    }

    /// Attach a page image
    pub fn with_image(mut self, image: Vec<u8>) -> Self {
        self.image = Some(image);
        self
    }

    /// Number of non-whitespace characters in the chunk text
    pub fn content_len(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }
}
