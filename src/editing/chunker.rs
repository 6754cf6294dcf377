use serde::Serialize;

/// A paragraph-aligned slice of the submitted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    pub index: usize,
    pub content: String,
    /// Size in characters
    pub size: usize,
}

/// Splits text into chunks of at most `max_chunk_size` characters without
/// ever cutting through a paragraph.
///
/// Paragraphs are the lines of the input. Each one keeps (or gains) a
/// trailing `\n`, so joining the chunks gives back the input with exactly one
/// newline after its last line. A paragraph that alone is longer than the
/// threshold becomes a chunk of its own and is left oversized.
#[derive(Debug, Clone, Copy)]
pub struct TextChunker {
    max_chunk_size: usize,
}

impl TextChunker {
    pub fn new(max_chunk_size: usize) -> Self {
        Self {
            max_chunk_size: max_chunk_size.max(1),
        }
    }

    pub fn max_chunk_size(&self) -> usize {
        self.max_chunk_size
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_size = 0;

        for paragraph in text.split('\n') {
            // +1 for the newline re-appended below
            let paragraph_size = paragraph.chars().count() + 1;

            if current_size + paragraph_size > self.max_chunk_size && !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_size = 0;
            }

            current.push_str(paragraph);
            current.push('\n');
            current_size += paragraph_size;
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        chunks
    }

    pub fn chunk_with_metadata(&self, text: &str) -> Vec<Chunk> {
        self.chunk(text)
            .into_iter()
            .enumerate()
            .map(|(index, content)| Chunk {
                index,
                size: content.chars().count(),
                content,
            })
            .collect()
    }

    /// Cheap upfront guess at the chunk count, for progress and wait-time
    /// display only. It can differ from what [`chunk`](Self::chunk) returns.
    pub fn estimate_chunk_count(&self, text: &str) -> usize {
        text.chars().count() / self.max_chunk_size + 1
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(4000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn paragraphs(chunk: &str) -> usize {
        chunk.trim_end_matches('\n').split('\n').count()
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        assert!(TextChunker::new(100).chunk("").is_empty());
    }

    #[test]
    fn test_small_text_is_single_chunk() {
        let chunks = TextChunker::new(1000).chunk("a\nb\nc");
        assert_eq!(chunks, vec!["a\nb\nc\n".to_string()]);
    }

    #[test]
    fn test_flushes_before_exceeding_threshold() {
        // "aaaa\n" and "bbbb\n" are 5 chars each
        let chunks = TextChunker::new(8).chunk("aaaa\nbbbb\nccc");
        assert_eq!(chunks, vec!["aaaa\n", "bbbb\n", "ccc\n"]);
    }

    #[test]
    fn test_exact_fit_stays_together() {
        let chunks = TextChunker::new(10).chunk("aaaa\nbbbb");
        assert_eq!(chunks, vec!["aaaa\nbbbb\n"]);
    }

    #[test]
    fn test_oversized_paragraph_is_not_split() {
        let long = "x".repeat(50);
        let text = format!("short\n{}\nafter", long);
        let chunks = TextChunker::new(10).chunk(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], format!("{}\n", long));
    }

    #[test]
    fn test_leading_oversized_paragraph() {
        let long = "y".repeat(30);
        let chunks = TextChunker::new(10).chunk(&format!("{}\nz", long));
        assert_eq!(chunks, vec![format!("{}\n", long), "z\n".to_string()]);
    }

    #[test]
    fn test_blank_lines_are_kept() {
        let chunks = TextChunker::new(1000).chunk("one\n\ntwo\n");
        // The trailing newline produces a final empty paragraph
        assert_eq!(chunks, vec!["one\n\ntwo\n\n"]);
    }

    #[test]
    fn test_sizes_count_characters_not_bytes() {
        // Each line is 4 chars + newline, but 8+ bytes
        let chunks = TextChunker::new(10).chunk("éééé\nüüüü");
        assert_eq!(chunks.len(), 1);
    }

    #[rstest]
    #[case(String::new(), 4000, 1)]
    #[case("abc".to_string(), 4000, 1)]
    #[case("a".repeat(4000), 4000, 2)]
    #[case("a".repeat(9999), 4000, 3)]
    fn test_estimate_chunk_count(
        #[case] text: String,
        #[case] size: usize,
        #[case] expected: usize,
    ) {
        assert_eq!(TextChunker::new(size).estimate_chunk_count(&text), expected);
    }

    #[test]
    fn test_estimate_can_differ_from_actual() {
        // Ten 9-char paragraphs against a 15-char threshold: one per chunk
        let text = vec!["aaaaaaaa"; 10].join("\n");
        let chunker = TextChunker::new(15);
        assert_eq!(chunker.chunk(&text).len(), 10);
        assert_eq!(chunker.estimate_chunk_count(&text), 6);
    }

    #[test]
    fn test_concatenation_reproduces_text() {
        let samples = [
            "single line",
            "first\nsecond\nthird",
            "para one is here.\n\npara two follows.\n\n\nthree",
            "trailing newline\n",
            "\n\n\n",
        ];

        for size in [1, 5, 16, 64, 4000] {
            let chunker = TextChunker::new(size);
            for text in samples {
                let joined: String = chunker.chunk(text).concat();
                assert_eq!(joined, format!("{}\n", text), "size {}", size);
            }
        }
    }

    #[test]
    fn test_no_chunk_exceeds_threshold_unless_single_paragraph() {
        let text = "The quick brown fox.\nJumps over\nthe lazy dog, which had been sleeping all afternoon.\nEnd.\n\nFin";

        for size in [1, 8, 12, 25, 60, 200] {
            for chunk in TextChunker::new(size).chunk(text) {
                let len = chunk.chars().count();
                assert!(
                    len <= size || paragraphs(&chunk) == 1,
                    "chunk {:?} of {} chars exceeds {}",
                    chunk,
                    len,
                    size
                );
            }
        }
    }

    #[test]
    fn test_chunk_with_metadata() {
        let chunks = TextChunker::new(8).chunk_with_metadata("aaaa\nbbbb");
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].index, 0);
        assert_eq!(chunks[1].index, 1);
        assert_eq!(chunks[1].content, "bbbb\n");
        assert_eq!(chunks[1].size, 5);
    }

    #[test]
    fn test_zero_threshold_is_clamped() {
        let chunker = TextChunker::new(0);
        assert_eq!(chunker.max_chunk_size(), 1);
        assert_eq!(chunker.chunk("a\nb").len(), 2);
    }
}
