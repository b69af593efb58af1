use crate::models::{Chunk, Lecture};
use crate::text::tokenize;

/// Characters a trimmed paragraph must exceed to become a chunk.
pub const DEFAULT_MIN_PARAGRAPH_CHARS: usize = 50;

/// Trimmed paragraphs of `text` longer than `min_chars` characters.
///
/// Paragraphs are separated by one or more line breaks; a chunk never spans
/// or splits one.
pub fn split_paragraphs(text: &str, min_chars: usize) -> impl Iterator<Item = &str> + '_ {
    text.split('\n')
        .map(str::trim)
        .filter(move |paragraph| paragraph.chars().count() > min_chars)
}

pub fn make_chunk_id(lecture_id: &str, position: usize) -> String {
    format!("{lecture_id}-p-{position}")
}

/// Chunks for one lecture, positions counted from 1.
pub fn build_chunks(lecture: &Lecture, min_chars: usize) -> Vec<Chunk> {
    split_paragraphs(&lecture.text, min_chars)
        .enumerate()
        .map(|(index, paragraph)| Chunk {
            id: make_chunk_id(&lecture.id, index + 1),
            lecture_id: lecture.id.clone(),
            lecture_title: lecture.title.clone(),
            session_number: lecture.session_number,
            paragraph: paragraph.to_string(),
            tokens: tokenize(paragraph),
        })
        .collect()
}
