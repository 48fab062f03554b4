//! Text chunking for embedding

/// Chunking configuration
pub const CHUNK_SIZE_CHARS: usize = 1000;
pub const CHUNK_OVERLAP_CHARS: usize = 200;

/// Separators tried from coarsest to finest before a hard character cut
const SEPARATORS: [&str; 4] = ["\n\n", ". ", "\n", " "];

/// A bounded span of source text, tagged with its page of origin
#[derive(Debug, Clone)]
pub struct Chunk {
    pub text: String,
    pub page: usize,
}

/// Find a valid char boundary at or before the given byte index
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Find a valid char boundary at or after the given byte index
fn ceil_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i < s.len() && !s.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Split one page of text into overlapping chunks.
///
/// Chunk boundaries prefer natural separators (paragraph break, then
/// sentence end, then newline, then space) found in the last 30% of the
/// size budget, falling back to a hard character cut. Whitespace-only
/// spans are dropped.
pub fn chunk_page(content: &str, page: usize, chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    if content.len() <= chunk_size {
        return vec![Chunk {
            text: content.to_string(),
            page,
        }];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < content.len() {
        let raw_end = (start + chunk_size).min(content.len());
        let end = floor_char_boundary(content, raw_end);
        let mut chunk_end = end;

        // Look for a natural break point in the last 30% of the budget
        if end < content.len() {
            let search_start_raw = start + (chunk_size * 70 / 100);
            let search_start = ceil_char_boundary(content, search_start_raw);

            if search_start < end {
                let search_region = &content[search_start..end];

                for sep in SEPARATORS {
                    if let Some(pos) = search_region.rfind(sep) {
                        chunk_end = search_start + pos + sep.len();
                        break;
                    }
                }
            }
        }

        chunk_end = floor_char_boundary(content, chunk_end);

        let text = &content[start..chunk_end];
        if !text.trim().is_empty() {
            chunks.push(Chunk {
                text: text.to_string(),
                page,
            });
        }

        if chunk_end >= content.len() {
            break;
        }

        let new_start_raw = chunk_end.saturating_sub(overlap);
        start = ceil_char_boundary(content, new_start_raw);
    }

    chunks
}

/// Split a sequence of pages into chunks, preserving page numbers (1-based)
pub fn chunk_pages(pages: &[String], chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    pages
        .iter()
        .enumerate()
        .flat_map(|(i, page)| chunk_page(page, i + 1, chunk_size, overlap))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_small_content() {
        let content = "Small content.";
        let chunks = chunk_page(content, 1, 100, 20);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, content);
        assert_eq!(chunks[0].page, 1);
    }

    #[test]
    fn test_chunk_skips_blank_pages() {
        let chunks = chunk_page("   \n\n  ", 3, 100, 20);
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_chunk_prefers_paragraph_breaks() {
        let content = format!("{}\n\n{}", "a".repeat(80), "b".repeat(80));
        let chunks = chunk_page(&content, 1, 100, 10);
        assert!(chunks.len() >= 2);
        assert!(chunks[0].text.ends_with("\n\n"));
    }

    #[test]
    fn test_chunks_overlap() {
        let content = "word ".repeat(500);
        let chunks = chunk_page(&content, 1, 1000, 200);
        assert!(chunks.len() >= 2);
        // Consecutive chunks share text because each new start backs up
        // by the overlap budget.
        let first_tail = &chunks[0].text[chunks[0].text.len() - 50..];
        assert!(chunks[1].text.contains(first_tail.trim_end()));
    }

    #[test]
    fn test_chunk_handles_unicode() {
        let content = "Hello 世界! ".repeat(200);
        let chunks = chunk_page(&content, 1, 100, 20);
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(!chunk.text.is_empty());
        }
    }

    #[test]
    fn test_chunk_pages_assigns_page_numbers() {
        let pages = vec!["first page".to_string(), String::new(), "third page".to_string()];
        let chunks = chunk_pages(&pages, 1000, 200);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].page, 1);
        assert_eq!(chunks[1].page, 3);
    }

    #[test]
    fn test_floor_char_boundary() {
        let s = "Hello 世界";
        assert_eq!(floor_char_boundary(s, 6), 6);
        assert_eq!(floor_char_boundary(s, 7), 6);
        assert_eq!(floor_char_boundary(s, 9), 9);
    }
}
