use crate::chunking::build_chunks;
use crate::models::{Chunk, Lecture};
use tracing::debug;

/// Immutable snapshot of every chunk in a corpus.
///
/// A changed corpus gets a fresh index; an existing one is never edited.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkIndex {
    chunks: Vec<Chunk>,
}

impl ChunkIndex {
    pub fn build(lectures: &[Lecture], min_paragraph_chars: usize) -> Self {
        let chunks = lectures
            .iter()
            .flat_map(|lecture| build_chunks(lecture, min_paragraph_chars))
            .collect::<Vec<_>>();

        debug!(
            lecture_count = lectures.len(),
            chunk_count = chunks.len(),
            "built chunk index"
        );

        Self { chunks }
    }

    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self { chunks }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn get(&self, chunk_id: &str) -> Option<&Chunk> {
        self.chunks.iter().find(|chunk| chunk.id == chunk_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lecture(id: &str, session: u32, text: String) -> Lecture {
        Lecture {
            id: id.to_string(),
            title: format!("عنوان {id}"),
            session_number: session,
            text,
            collection: String::new(),
            topic: String::new(),
        }
    }

    #[test]
    fn chunks_follow_lecture_order() {
        let paragraph = "نور ".repeat(20);
        let lectures = vec![
            lecture("b", 2, format!("{paragraph}\n{paragraph}")),
            lecture("a", 1, paragraph.clone()),
            lecture("empty", 3, String::new()),
        ];

        let index = ChunkIndex::build(&lectures, 50);
        let ids = index
            .chunks()
            .iter()
            .map(|chunk| chunk.id.as_str())
            .collect::<Vec<_>>();

        assert_eq!(ids, vec!["b-p-1", "b-p-2", "a-p-1"]);
        assert_eq!(index.len(), 3);
        assert_eq!(index.get("a-p-1").map(|chunk| chunk.session_number), Some(1));
        assert!(index.get("empty-p-1").is_none());
    }

    #[test]
    fn empty_corpus_builds_empty_index() {
        let index = ChunkIndex::build(&[], 50);
        assert!(index.is_empty());
    }
}
