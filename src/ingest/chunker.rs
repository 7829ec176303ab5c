//! Text chunking along paragraph and sentence boundaries.
//!
//! Chunks target `chunk_size` characters; each chunk after the first is
//! seeded with the tail of its predecessor (`overlap` characters, snapped
//! to a word boundary) so context spanning a cut survives retrieval.

/// Splits text into chunks of approximately `chunk_size` characters
/// (counted as `char`s), carrying `overlap` characters between chunks.
pub fn split_into_chunks(content: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let char_count = content.chars().count();

    if char_count <= chunk_size {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        return vec![trimmed.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    // Whether `current` holds anything beyond the overlap seed
    let mut has_new = false;

    for para in content.split("\n\n") {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }

        let current_len = current.chars().count();
        let para_len = para.chars().count();

        // Close the current chunk if this paragraph would overflow it
        if has_new && current_len + para_len + 2 > chunk_size {
            chunks.push(current.clone());
            current = overlap_tail(&current, overlap);
            has_new = false;
        }

        if para_len > chunk_size {
            // A single oversized paragraph: flush, then cut along sentences
            if has_new {
                chunks.push(current.clone());
            }
            chunks.extend(split_large_paragraph(para, chunk_size));
            // Seed the next chunk with the tail of the last piece
            current = match chunks.last() {
                Some(last) if overlap > 0 => overlap_tail(last, overlap),
                _ => String::new(),
            };
            has_new = false;
        } else {
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(para);
            has_new = true;
        }
    }

    // A remainder that is pure overlap seed carries no new content
    if has_new && !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    chunks
}

/// The last `overlap` characters of `text`, extended left to a word boundary.
fn overlap_tail(text: &str, overlap: usize) -> String {
    if overlap == 0 {
        return String::new();
    }

    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= overlap {
        return text.to_string();
    }

    let mut start = chars.len() - overlap;
    // Walk back to whitespace so the seed doesn't begin mid-word
    while start > 0 && !chars[start - 1].is_whitespace() {
        start -= 1;
        if chars.len() - start > overlap * 2 {
            // No boundary nearby; take the raw tail
            start = chars.len() - overlap;
            break;
        }
    }

    chars[start..].iter().collect::<String>().trim_start().to_string()
}

/// Splits an oversized paragraph into chunks, preferring sentence boundaries.
fn split_large_paragraph(para: &str, chunk_size: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut chars: Vec<char> = para.chars().collect();

    while chars.len() > chunk_size {
        let mut cut_point = chunk_size;

        // Search backwards from chunk_size to chunk_size/2 for a sentence end
        let min_search = chunk_size / 2;
        for i in (min_search..=chunk_size).rev() {
            if i < chars.len() {
                let c = chars[i];
                if c == '.' || c == '!' || c == '?' || c == '\n' {
                    cut_point = i + 1;
                    break;
                }
            }
        }

        if cut_point > chars.len() {
            cut_point = chars.len();
        }

        let chunk_str: String = chars[..cut_point].iter().collect();
        chunks.push(chunk_str.trim().to_string());

        let remaining: String = chars[cut_point..].iter().collect();
        chars = remaining.trim().chars().collect();
    }

    if !chars.is_empty() {
        let final_str: String = chars.into_iter().collect();
        chunks.push(final_str);
    }

    chunks
}
