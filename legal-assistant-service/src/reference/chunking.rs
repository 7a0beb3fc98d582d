//! Splits the reference corpus into overlapping retrieval units.

pub const CHUNK_SIZE: usize = 300;
pub const CHUNK_OVERLAP: usize = 20;

/// Character-window splitter that prefers to cut after a newline.
///
/// Every chunk holds at most `chunk_size` characters and starts with the last
/// `overlap` characters of the chunk before it.
#[derive(Debug, Clone, Copy)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            overlap: CHUNK_OVERLAP,
        }
    }
}

impl TextSplitter {
    /// # Panics
    /// If `overlap >= chunk_size`; such a splitter could never advance.
    pub fn new(chunk_size: usize, overlap: usize) -> Self {
        assert!(overlap < chunk_size, "overlap must be smaller than chunk size");
        Self { chunk_size, overlap }
    }

    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let window_end = (start + self.chunk_size).min(chars.len());
            let end = if window_end == chars.len() {
                window_end
            } else {
                self.newline_break(&chars, start, window_end)
                    .unwrap_or(window_end)
            };

            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start = end - self.overlap;
        }

        chunks
    }

    /// Position just past the last newline in the window that still leaves
    /// the next chunk starting after `start`
    fn newline_break(&self, chars: &[char], start: usize, window_end: usize) -> Option<usize> {
        let earliest = start + self.overlap;
        (earliest..window_end)
            .rev()
            .find(|&i| chars[i] == '\n')
            .map(|i| i + 1)
    }
}
