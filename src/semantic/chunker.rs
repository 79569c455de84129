//! Word-boundary text chunking for ingestion.
//!
//! Long documents are packed greedily into segments of at most `chunk_size`
//! characters. Words are never split; a single word longer than the limit
//! becomes its own oversized segment.

/// Default chunk size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Split text into chunks of roughly `chunk_size` characters without cutting words.
///
/// Empty input yields no chunks. Input that already fits is returned as a
/// single chunk, byte for byte. Longer input is re-joined with single spaces.
pub fn chunk_text(text: &str, chunk_size: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);

    if text.is_empty() {
        return vec![];
    }

    if text.chars().count() <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = vec![];
    let mut current: Vec<&str> = vec![];
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if !current.is_empty() && current_len + word_len + 1 > chunk_size {
            chunks.push(current.join(" "));
            current.clear();
            current_len = 0;
        }

        if current.is_empty() {
            current_len = word_len;
        } else {
            current_len += word_len + 1;
        }
        current.push(word);
    }

    if !current.is_empty() {
        chunks.push(current.join(" "));
    }

    chunks
}
