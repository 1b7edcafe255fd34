//! Shared text segmentation and term normalization.
//!
//! Used by the chunker, the lexical answer extractor, the frequency summarizer
//! and the hashing embedder so all four agree on what a sentence and a
//! term are.

/// Words ignored when comparing questions with passages.
const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be",
    "been", "being", "but", "by", "can", "could", "did", "do", "does", "doing", "for", "from",
    "had", "has", "have", "having", "he", "her", "here", "his", "how", "i", "if", "in", "into",
    "is", "it", "its", "just", "me", "more", "most", "my", "no", "not", "of", "on", "or",
    "other", "our", "out", "over", "she", "should", "so", "some", "such", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "those", "through", "to", "too",
    "under", "up", "very", "was", "we", "were", "what", "when", "where", "which", "while", "who",
    "whom", "why", "will", "with", "would", "you", "your",
];

/// Trimmed byte ranges of blank-line separated paragraphs.
pub(crate) fn paragraphs(text: &str) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    let mut offset = 0;
    let mut current: Option<usize> = None;
    let mut current_end = 0;

    for line in text.split_inclusive('\n') {
        let line_start = offset;
        offset += line.len();
        if line.trim().is_empty() {
            if let Some(s) = current.take() {
                out.extend(trim_range(text, s, current_end));
            }
        } else {
            if current.is_none() {
                current = Some(line_start);
            }
            current_end = offset;
        }
    }
    if let Some(s) = current {
        out.extend(trim_range(text, s, current_end));
    }
    out
}

/// Trimmed sentence ranges inside `[start, end)`. A `.`, `!` or `?`
/// followed by whitespace (or the end of the range) closes a sentence.
pub(crate) fn sentences(text: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
    let para = &text[start..end];
    let mut out = Vec::new();
    let mut sent_start = start;
    let mut chars = para.char_indices().peekable();

    while let Some((off, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let boundary = match chars.peek() {
            None => true,
            Some((_, next)) => next.is_whitespace(),
        };
        if boundary {
            let sent_end = start + off + c.len_utf8();
            out.extend(trim_range(text, sent_start, sent_end));
            sent_start = sent_end;
        }
    }
    if sent_start < end {
        out.extend(trim_range(text, sent_start, end));
    }
    out
}

/// Every sentence of `text`, paragraph breaks included, as byte ranges.
pub fn sentence_spans(text: &str) -> Vec<(usize, usize)> {
    paragraphs(text)
        .into_iter()
        .flat_map(|(ps, pe)| sentences(text, ps, pe))
        .collect()
}

pub(crate) fn trim_range(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let slice = &text[start..end];
    let trimmed = slice.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lead = slice.len() - slice.trim_start().len();
    Some((start + lead, start + lead + trimmed.len()))
}

/// Lowercased, stemmed, stopword-free terms of `text`, in order.
pub fn content_terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .filter(|w| !STOPWORDS.contains(&w.as_str()))
        .map(|w| stem(&w))
        .collect()
}

/// Crude suffix stripping so "stores", "stored" and "storing" meet.
fn stem(word: &str) -> String {
    let mut w = word;
    for suffix in ["ing", "ies", "ed", "es", "s"] {
        if let Some(base) = w.strip_suffix(suffix) {
            if base.chars().count() >= 3 && !(suffix == "s" && base.ends_with('s')) {
                w = base;
                break;
            }
        }
    }
    let w = if w.chars().count() > 3 {
        w.strip_suffix('e').unwrap_or(w)
    } else {
        w
    };
    w.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentence_spans_split_on_terminators() {
        let text = "A variable stores a value. A function is reusable code.";
        let spans = sentence_spans(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].0..spans[0].1], "A variable stores a value.");
        assert_eq!(&text[spans[1].0..spans[1].1], "A function is reusable code.");
    }

    #[test]
    fn test_sentence_spans_keep_decimals_together() {
        let text = "Version 1.5 added caching. It is faster!";
        let spans = sentence_spans(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].0..spans[0].1], "Version 1.5 added caching.");
    }

    #[test]
    fn test_paragraph_break_ends_sentence() {
        let text = "Heading without period\n\nBody text here.";
        let spans = sentence_spans(text);
        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].0..spans[0].1], "Heading without period");
    }

    #[test]
    fn test_content_terms_stem_and_filter() {
        let terms = content_terms("What does a variable store?");
        assert_eq!(terms, vec!["variabl", "stor"]);
        assert_eq!(content_terms("stores stored storing"), vec!["stor"; 3]);
    }

    #[test]
    fn test_stem_keeps_short_words() {
        assert_eq!(stem("use"), "use");
        assert_eq!(stem("class"), "class");
        assert_eq!(stem("values"), "valu");
    }
}
