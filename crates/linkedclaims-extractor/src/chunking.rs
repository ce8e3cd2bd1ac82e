//! Segmentation of raw text into document chunks

use crate::config::{ChunkStrategy, ExtractorConfig};
use linkedclaims_domain::traits::DocumentSegmenter;
use linkedclaims_domain::DocumentChunk;
use tracing::debug;

/// Page separator emitted by pdftotext
const FORM_FEED: char = '\u{0C}';

/// Segments plain text into indexed chunks
///
/// Text containing form feeds is treated as paginated: every page becomes one
/// chunk whose index is its page number (zero-based). Other text is split
/// with the configured [`ChunkStrategy`]. Chunks with fewer than
/// `min_chunk_chars` non-whitespace characters are dropped, but the indices
/// of the remaining chunks are kept stable.
#[derive(Debug, Clone)]
pub struct TextSegmenter {
    strategy: ChunkStrategy,
    max_chunk_size: usize,
    min_chunk_chars: usize,
}

impl TextSegmenter {
    /// Create a segmenter with the default minimum chunk size
    pub fn new(strategy: ChunkStrategy, max_chunk_size: usize) -> Self {
        Self {
            strategy,
            max_chunk_size: max_chunk_size.max(1),
            min_chunk_chars: ExtractorConfig::default().min_chunk_chars,
        }
    }

    /// Create a segmenter from extractor settings
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.chunk_strategy, config.max_chunk_size)
            .with_min_chunk_chars(config.min_chunk_chars)
    }

    /// Set the minimum non-whitespace content a chunk needs to be kept
    pub fn with_min_chunk_chars(mut self, min_chunk_chars: usize) -> Self {
        self.min_chunk_chars = min_chunk_chars;
        self
    }

    /// Split unpaginated text with the configured strategy
    pub fn split(&self, text: &str) -> Vec<String> {
        if char_len(text) <= self.max_chunk_size {
            return vec![text.trim().to_string()];
        }

        match self.strategy {
            ChunkStrategy::ByParagraph => self.split_by_paragraph(text),
            ChunkStrategy::BySection => self.split_by_section(text),
            ChunkStrategy::BySize => self.split_by_size(text),
        }
    }

    fn split_by_paragraph(&self, text: &str) -> Vec<String> {
        let paragraphs: Vec<&str> = text.split("\n\n").collect();
        self.combine_until_limit(paragraphs)
    }

    /// Markdown headers (`# Header`) or numbered headings (`1. Section`)
    fn split_by_section(&self, text: &str) -> Vec<String> {
        let mut sections = Vec::new();
        let mut current = String::new();

        for line in text.lines() {
            if is_section_header(line) && !current.trim().is_empty() {
                sections.push(current.trim().to_string());
                current.clear();
            }
            current.push_str(line);
            current.push('\n');
        }
        if !current.trim().is_empty() {
            sections.push(current.trim().to_string());
        }

        if sections.len() <= 1 {
            return self.split_by_paragraph(text);
        }
        self.combine_until_limit(sections)
    }

    /// Sentence boundaries, packed up to the size limit
    fn split_by_size(&self, text: &str) -> Vec<String> {
        let sentences: Vec<&str> = text
            .split_inclusive(['.', '!', '?'])
            .filter(|s| !s.trim().is_empty())
            .collect();

        let mut chunks = Vec::new();
        let mut current = String::new();

        for sentence in sentences {
            let sentence = sentence.trim();
            if char_len(&current) + char_len(sentence) + 1 > self.max_chunk_size {
                if !current.is_empty() {
                    chunks.push(current.trim().to_string());
                    current.clear();
                }
                if char_len(sentence) > self.max_chunk_size {
                    chunks.extend(split_at_char_limit(sentence, self.max_chunk_size));
                    continue;
                }
            }
            current.push_str(sentence);
            current.push(' ');
        }
        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }

        chunks
    }

    fn combine_until_limit<S: AsRef<str>>(&self, elements: Vec<S>) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();

        for element in elements {
            let element = element.as_ref().trim();
            if element.is_empty() {
                continue;
            }

            if char_len(&current) + char_len(element) + 2 > self.max_chunk_size {
                if !current.is_empty() {
                    chunks.push(current.trim().to_string());
                    current.clear();
                }
                if char_len(element) > self.max_chunk_size {
                    chunks.extend(split_at_char_limit(element, self.max_chunk_size));
                    continue;
                }
            }
            current.push_str(element);
            current.push_str("\n\n");
        }
        if !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
        }

        chunks
    }
}

impl DocumentSegmenter for TextSegmenter {
    fn segment(&self, document: &str) -> Vec<DocumentChunk> {
        let chunks: Vec<DocumentChunk> = if document.contains(FORM_FEED) {
            document
                .split(FORM_FEED)
                .enumerate()
                .map(|(page, text)| DocumentChunk::new(page, text.trim()))
                .collect()
        } else {
            self.split(document)
                .into_iter()
                .enumerate()
                .map(|(index, text)| DocumentChunk::new(index, text))
                .collect()
        };

        let total = chunks.len();
        let kept: Vec<DocumentChunk> = chunks
            .into_iter()
            .filter(|chunk| chunk.content_len() >= self.min_chunk_chars)
            .collect();

        debug!(
            total,
            kept = kept.len(),
            min_chunk_chars = self.min_chunk_chars,
            "Segmented document"
        );
        kept
    }
}

fn is_section_header(line: &str) -> bool {
    let line = line.trim_start();
    if line.starts_with('#') {
        return true;
    }
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && line[digits..].starts_with(". ")
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split on char boundaries into pieces of at most `limit` characters
fn split_at_char_limit(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit.max(1))
        .map(|piece| piece.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter(strategy: ChunkStrategy, max: usize) -> TextSegmenter {
        TextSegmenter::new(strategy, max).with_min_chunk_chars(0)
    }

    #[test]
    fn test_no_split_needed_for_small_text() {
        let chunks = segmenter(ChunkStrategy::ByParagraph, 100).split("Short text here.");
        assert_eq!(chunks, vec!["Short text here.".to_string()]);
    }

    #[test]
    fn test_split_by_paragraph() {
        let text = "First paragraph here.\n\nSecond paragraph here.\n\nThird paragraph here.";
        let chunks = segmenter(ChunkStrategy::ByParagraph, 50).split(text);

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].starts_with("First paragraph"));
        assert!(chunks.iter().all(|c| c.chars().count() <= 50));
    }

    #[test]
    fn test_split_by_section_with_markdown() {
        let text = "# Section 1\nContent one is here\n# Section 2\nContent two is here";
        let chunks = segmenter(ChunkStrategy::BySection, 40).split(text);

        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].contains("Section 1"));
        assert!(chunks[1].contains("Section 2"));
    }

    #[test]
    fn test_numbered_section_headers() {
        assert!(is_section_header("1. Introduction"));
        assert!(is_section_header("  12. Results"));
        assert!(!is_section_header("2023 was a good year."));
        assert!(!is_section_header("3.5 million people"));
    }

    #[test]
    fn test_section_fallback_to_paragraph() {
        let text = "Just some text here\n\nWith paragraphs in it\n\nBut no sections at all";
        let chunks = segmenter(ChunkStrategy::BySection, 45).split(text);
        assert!(chunks.len() >= 2);
    }

    #[test]
    fn test_split_by_size_keeps_punctuation() {
        let text = "First sentence here. Second sentence here! Third sentence here?";
        let chunks = segmenter(ChunkStrategy::BySize, 25).split(text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], "Second sentence here!");
    }

    #[test]
    fn test_very_long_single_paragraph() {
        let text = "a".repeat(100);
        let chunks = segmenter(ChunkStrategy::ByParagraph, 20).split(&text);
        assert_eq!(chunks.len(), 5);
    }

    #[test]
    fn test_split_respects_char_boundaries() {
        let text = "é".repeat(30);
        let chunks = segmenter(ChunkStrategy::BySize, 7).split(&text);
        assert_eq!(chunks.concat(), text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 7));
    }

    #[test]
    fn test_form_feed_pages_keep_page_index() {
        let document = "Page zero text with enough content.\u{0C}\u{0C}Page two text with enough content.";
        let chunks = TextSegmenter::new(ChunkStrategy::ByParagraph, 1000)
            .with_min_chunk_chars(10)
            .segment(document);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[1].index, 2);
        assert_eq!(chunks[1].text, "Page two text with enough content.");
    }

    #[test]
    fn test_short_chunks_dropped() {
        let document = "tiny\u{0C}This page carries a realistic amount of text to keep around.";
        let chunks = TextSegmenter::new(ChunkStrategy::ByParagraph, 1000)
            .with_min_chunk_chars(20)
            .segment(document);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].index, 1);
    }

    #[test]
    fn test_empty_document() {
        let chunks = TextSegmenter::from_config(&ExtractorConfig::default()).segment("");
        assert!(chunks.is_empty());
    }
}
