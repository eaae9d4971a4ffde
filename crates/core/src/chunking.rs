//! Greedy document splitting.
//!
//! Paragraphs are packed into chunks up to the token budget. Every chunk
//! shares its trailing tokens with the start of its successor: a newly
//! started chunk is seeded with the previous chunk's tail, and a paragraph
//! run that exceeds the budget on its own is windowed word by word with the
//! same overlap. A chunk has no identity beyond its position in the split
//! sequence.

use crate::config::ChunkingOptions;
use crate::error::IngestError;

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\u{a0}', " ")
}

fn token_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// The last `count` whitespace tokens of `text`, used to seed the next
/// chunk with overlap.
fn trailing_tokens(text: &str, count: usize) -> String {
    if count == 0 {
        return String::new();
    }
    let words = text.split_whitespace().collect::<Vec<_>>();
    let start = words.len().saturating_sub(count);
    words[start..].join(" ")
}

pub fn split_into_chunks(
    text: &str,
    options: &ChunkingOptions,
) -> Result<Vec<String>, IngestError> {
    if options.max_tokens == 0 {
        return Err(IngestError::InvalidChunkConfig(
            "max_tokens must be positive".to_string(),
        ));
    }
    if options.overlap_tokens >= options.max_tokens {
        return Err(IngestError::InvalidChunkConfig(format!(
            "overlap {} must be smaller than max chunk size {}",
            options.overlap_tokens, options.max_tokens
        )));
    }

    let paragraphs = text
        .split("\n\n")
        .map(normalize_whitespace)
        .filter(|paragraph| !paragraph.is_empty())
        .collect::<Vec<_>>();

    // Greedy packing: keep appending paragraphs while the budget holds. A
    // finished chunk's trailing tokens seed the next one, so consecutive
    // chunks always overlap.
    let mut packed = Vec::new();
    let mut current = String::new();
    let mut current_tokens = 0usize;

    for paragraph in paragraphs {
        let tokens = token_count(&paragraph);

        if current_tokens > 0 && current_tokens + tokens > options.max_tokens {
            let seed = trailing_tokens(&current, options.overlap_tokens);
            packed.push(std::mem::replace(&mut current, seed));
            current_tokens = token_count(&current);
        }

        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(&paragraph);
        current_tokens += tokens;
    }

    if !current.is_empty() {
        packed.push(current);
    }

    // Window over-long runs with overlap between consecutive windows.
    let stride = options.max_tokens - options.overlap_tokens;
    let mut chunks = Vec::new();

    for block in packed {
        let words = block.split_whitespace().collect::<Vec<_>>();
        if words.len() <= options.max_tokens {
            chunks.push(block);
            continue;
        }

        let mut start = 0;
        while start < words.len() {
            let end = (start + options.max_tokens).min(words.len());
            chunks.push(words[start..end].join(" "));
            if end == words.len() {
                break;
            }
            start += stride;
        }
    }

    Ok(chunks)
}
