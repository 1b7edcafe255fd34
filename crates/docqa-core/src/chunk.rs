//! Sentence-aware text chunker with overlap.
//!
//! Splits document text into [`Chunk`]s sized for embedding and extractive
//! QA. Each chunk is a contiguous slice of the original text, so citations
//! can always be located in the source document.
//!
//! # Algorithm
//!
//! 1. Convert the token budgets to characters using a 4 chars/token ratio.
//! 2. Split text into paragraphs (blank-line separated), then into sentence
//!    units (a `.`, `!` or `?` followed by whitespace ends a sentence).
//! 3. Hard-split any unit longer than `max` at the last newline or space
//!    before the limit, falling back to a char boundary.
//! 4. Pack units greedily up to `max`. Once a chunk holds `min` characters
//!    it also closes at a paragraph boundary when the next paragraph does
//!    not fit whole.
//! 5. The next chunk starts on the trailing units of the previous one that
//!    fit inside `overlap`, so a sentence near a boundary appears in both.
//! 6. A chunk still under `min` when the next unit does not fit whole takes
//!    a hard-cut prefix of that unit, ending on a word where possible.
//! 7. A final chunk shorter than `min` starts earlier, so its length lands
//!    in `[min, max]`.
//!
//! Every chunk is therefore between `min` and `max` characters long unless
//! the whole document is shorter than `min`.
//!
//! Whitespace-only input produces no chunks.
//!
//! # Example
//!
//! ```rust
//! use docqa_core::chunk::{chunk_text, ChunkerConfig};
//!
//! let chunks = chunk_text("doc-1", "Guide", "Hello world.\n\nSecond paragraph.", &ChunkerConfig::default());
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].sequence_index, 0);
//! ```

use sha2::{Digest, Sha256};

use crate::models::{Chunk, PageSpan};
use crate::text::{paragraphs, sentences, trim_range};

/// Approximate characters-per-token ratio.
pub const CHARS_PER_TOKEN: usize = 4;

/// Chunk size budgets, in tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkerConfig {
    pub max_tokens: usize,
    pub min_tokens: usize,
    pub overlap_tokens: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: 250,
            min_tokens: 25,
            overlap_tokens: 40,
        }
    }
}

impl ChunkerConfig {
    pub fn max_chars(&self) -> usize {
        (self.max_tokens * CHARS_PER_TOKEN).max(1)
    }

    pub fn min_chars(&self) -> usize {
        (self.min_tokens * CHARS_PER_TOKEN).min(self.max_chars())
    }

    /// Overlap never exceeds half a chunk.
    pub fn overlap_chars(&self) -> usize {
        (self.overlap_tokens * CHARS_PER_TOKEN).min(self.max_chars() / 2)
    }
}

/// A trimmed sentence (or hard-split piece) as a byte range of the text.
#[derive(Debug, Clone, Copy)]
struct Unit {
    start: usize,
    end: usize,
    paragraph: usize,
    para_start: bool,
}

/// Split `text` into chunks. See the module docs for the algorithm.
pub fn chunk_text(document_id: &str, title: &str, text: &str, config: &ChunkerConfig) -> Vec<Chunk> {
    chunk_pages(document_id, title, text, &[], config)
}

/// Like [`chunk_text`], assigning each chunk the page that contains its
/// first byte according to `pages`.
pub fn chunk_pages(
    document_id: &str,
    title: &str,
    text: &str,
    pages: &[PageSpan],
    config: &ChunkerConfig,
) -> Vec<Chunk> {
    let max = config.max_chars();
    let mut units = segment(text, max);
    if units.is_empty() {
        return Vec::new();
    }

    let spans = pack(text, &mut units, max, config.min_chars(), config.overlap_chars());

    spans
        .into_iter()
        .enumerate()
        .map(|(seq, (start, end))| {
            make_chunk(
                document_id,
                title,
                seq,
                page_for_offset(pages, start),
                &text[start..end],
            )
        })
        .collect()
}

fn segment(text: &str, max: usize) -> Vec<Unit> {
    let mut units = Vec::new();
    for (paragraph, (ps, pe)) in paragraphs(text).into_iter().enumerate() {
        let mut first = true;
        for (ss, se) in sentences(text, ps, pe) {
            let mut pieces = Vec::new();
            hard_split(text, ss, se, max, &mut pieces);
            for (start, end) in pieces {
                units.push(Unit {
                    start,
                    end,
                    paragraph,
                    para_start: first,
                });
                first = false;
            }
        }
    }
    units
}

/// Cut `[start, end)` into trimmed pieces of at most `max` bytes.
fn hard_split(text: &str, start: usize, end: usize, max: usize, out: &mut Vec<(usize, usize)>) {
    let mut s = start;
    while s < end {
        let remaining = &text[s..end];
        if remaining.len() <= max {
            out.extend(trim_range(text, s, end));
            break;
        }
        let limit = snap_to_char_boundary(remaining, max);
        let limit = if limit == 0 {
            remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len())
        } else {
            limit
        };
        let cut = remaining[..limit]
            .rfind(|c: char| c == '\n' || c == ' ')
            .filter(|&pos| pos > 0)
            .map(|pos| pos + 1)
            .unwrap_or(limit);
        out.extend(trim_range(text, s, s + cut));
        s += cut;
    }
}

/// Group units into chunk byte ranges `[start, end)`.
///
/// A chunk that would close under `min` because the next unit does not fit
/// whole takes a hard-cut prefix of that unit instead; `units` is updated
/// with the two pieces.
fn pack(
    text: &str,
    units: &mut Vec<Unit>,
    max: usize,
    min: usize,
    overlap: usize,
) -> Vec<(usize, usize)> {
    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut i = 0;
    let mut first_new = 0;

    while i < units.len() {
        let start = units[i].start;
        let mut j = i;
        while j + 1 < units.len() {
            let next = &units[j + 1];
            if next.end - start > max {
                break;
            }
            if next.para_start && j >= first_new && units[j].end - start >= min {
                let para_end = paragraph_end(units, j + 1);
                if para_end - start > max {
                    break;
                }
            }
            j += 1;
        }

        if j + 1 < units.len() && units[j].end - start < min {
            if let Some(cut) = fill_cut(text, &units[j + 1], start + min, start + max) {
                split_unit(text, units, j + 1, cut);
                j += 1;
            }
        }
        spans.push((start, units[j].end));

        if j + 1 >= units.len() {
            break;
        }

        let mut k = j + 1;
        while k > i + 1 && units[j].end - units[k - 1].start <= overlap {
            k -= 1;
        }
        while k <= j && units[j + 1].end - units[k].start > max {
            k += 1;
        }
        first_new = j + 1;
        i = k;
    }

    extend_short_tail(text, units, &mut spans, max, min);
    spans
}

fn paragraph_end(units: &[Unit], from: usize) -> usize {
    let paragraph = units[from].paragraph;
    units[from..]
        .iter()
        .take_while(|u| u.paragraph == paragraph)
        .last()
        .map(|u| u.end)
        .unwrap_or(units[from].end)
}

/// Where to cut `unit` so the chunk ends inside `[lo, hi]`: the last word
/// end in range, else the last char end. Both pieces stay non-empty.
fn fill_cut(text: &str, unit: &Unit, lo: usize, hi: usize) -> Option<usize> {
    let lo = lo.max(unit.start + 1);
    let hi = hi.min(unit.end - 1);
    if lo > hi {
        return None;
    }
    let mut word_end = None;
    let mut char_end = None;
    let mut chars = text[unit.start..unit.end].char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if c.is_whitespace() {
            continue;
        }
        let end = unit.start + i + c.len_utf8();
        if end > hi {
            break;
        }
        if end < lo {
            continue;
        }
        char_end = Some(end);
        if chars.peek().is_some_and(|&(_, n)| n.is_whitespace()) {
            word_end = Some(end);
        }
    }
    word_end.or(char_end)
}

fn split_unit(text: &str, units: &mut Vec<Unit>, idx: usize, cut: usize) {
    let unit = units[idx];
    let Some((rest_start, rest_end)) = trim_range(text, cut, unit.end) else {
        return;
    };
    units[idx].end = cut;
    units.insert(
        idx + 1,
        Unit {
            start: rest_start,
            end: rest_end,
            paragraph: unit.paragraph,
            para_start: false,
        },
    );
}

/// Pull the start of a final chunk shorter than `min` back so its length
/// lands in `[min, max]`, preferring a unit start, then a word start.
fn extend_short_tail(
    text: &str,
    units: &[Unit],
    spans: &mut Vec<(usize, usize)>,
    max: usize,
    min: usize,
) {
    if spans.len() < 2 {
        return;
    }
    let Some(&(start, end)) = spans.last() else {
        return;
    };
    if end - start >= min {
        return;
    }
    let Some(hi) = end.checked_sub(min) else {
        return;
    };
    let lo = end.saturating_sub(max);

    let unit_start = units
        .iter()
        .rev()
        .map(|u| u.start)
        .find(|&s| s >= lo && s <= hi);
    let new_start = unit_start.or_else(|| {
        let mut word_start = None;
        let mut char_start = None;
        let mut prev_ws = true;
        for (i, c) in text[..end].char_indices() {
            let ws = c.is_whitespace();
            if !ws && i >= lo && i <= hi {
                char_start = Some(i);
                if prev_ws {
                    word_start = Some(i);
                }
            }
            prev_ws = ws;
        }
        word_start.or(char_start)
    });
    let Some(new_start) = new_start else {
        return;
    };

    spans.pop();
    // Drop earlier spans now fully covered by the extended tail.
    while spans.last().is_some_and(|&(s, _)| s >= new_start) {
        spans.pop();
    }
    spans.push((new_start, end));
}

/// Snap a byte index back to the nearest valid UTF-8 char boundary.
fn snap_to_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn page_for_offset(pages: &[PageSpan], offset: usize) -> Option<u32> {
    pages
        .iter()
        .take_while(|p| p.start <= offset)
        .last()
        .map(|p| p.page)
}

fn make_chunk(document_id: &str, title: &str, seq: usize, page: Option<u32>, text: &str) -> Chunk {
    let hash = format!("{:x}", Sha256::digest(text.as_bytes()));

    let mut hasher = Sha256::new();
    hasher.update(document_id.as_bytes());
    hasher.update(seq.to_le_bytes());
    hasher.update(text.as_bytes());
    let id = format!("{:x}", hasher.finalize())[..32].to_string();

    Chunk {
        id,
        document_id: document_id.to_string(),
        document_title: title.to_string(),
        sequence_index: seq,
        page,
        text: text.to_string(),
        hash,
    }
}
