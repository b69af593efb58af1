use crate::index::ChunkIndex;
use crate::models::{Chunk, RetrievalOptions, ScoredChunk};
use crate::text::tokenize;
use std::collections::HashSet;
use tracing::debug;

/// Number of question tokens (with multiplicity) found among the chunk's tokens.
pub fn overlap_count(question_tokens: &[String], chunk: &Chunk) -> usize {
    let chunk_terms = chunk.tokens.iter().map(String::as_str).collect::<HashSet<_>>();
    question_tokens
        .iter()
        .filter(|token| chunk_terms.contains(token.as_str()))
        .count()
}

/// Blend of question coverage and passage density; zero when either side is empty.
pub fn score_chunk(question_tokens: &[String], chunk: &Chunk, options: &RetrievalOptions) -> f64 {
    if question_tokens.is_empty() || chunk.tokens.is_empty() {
        return 0.0;
    }

    let overlap = overlap_count(question_tokens, chunk) as f64;
    let overlap_ratio = overlap / question_tokens.len().max(1) as f64;
    let density_boost = overlap / chunk.tokens.len().max(options.density_floor).max(1) as f64;

    options.coverage_weight * overlap_ratio + options.density_weight * density_boost
}

/// Ranks every chunk for `question_tokens`, best first, at most `top_k`.
///
/// Equal scores keep index order, so identical input always ranks the same.
pub fn rank_chunks<'a>(
    question_tokens: &[String],
    index: &'a ChunkIndex,
    options: &RetrievalOptions,
    top_k: usize,
) -> Vec<ScoredChunk<'a>> {
    let mut scored = index
        .chunks()
        .iter()
        .map(|chunk| ScoredChunk {
            chunk,
            score: score_chunk(question_tokens, chunk, options),
        })
        .filter(|hit| hit.score > 0.0)
        .collect::<Vec<_>>();

    // stable: ties stay in build order
    scored.sort_by(|left, right| right.score.total_cmp(&left.score));
    scored.truncate(top_k);
    scored
}

pub fn retrieve<'a>(
    question: &str,
    index: &'a ChunkIndex,
    options: &RetrievalOptions,
) -> Vec<ScoredChunk<'a>> {
    let question_tokens = tokenize(question);
    let hits = rank_chunks(&question_tokens, index, options, options.top_k);
    debug!(
        question_tokens = question_tokens.len(),
        candidates = index.len(),
        hits = hits.len(),
        "retrieved chunks"
    );
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, tokens: &[&str]) -> Chunk {
        Chunk {
            id: id.to_string(),
            lecture_id: "lec".to_string(),
            lecture_title: "عنوان".to_string(),
            session_number: 1,
            paragraph: tokens.join(" "),
            tokens: tokens.iter().map(|token| token.to_string()).collect(),
        }
    }

    fn terms(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn empty_sides_score_zero() {
        let options = RetrievalOptions::default();
        assert_eq!(score_chunk(&[], &chunk("c", &["صبر"]), &options), 0.0);
        assert_eq!(score_chunk(&terms(&["صبر"]), &chunk("c", &[]), &options), 0.0);
    }

    #[test]
    fn disjoint_chunks_score_zero() {
        let options = RetrievalOptions::default();
        let question = terms(&["صبر", "شکر"]);
        assert_eq!(score_chunk(&question, &chunk("a", &["توحید"]), &options), 0.0);
        assert_eq!(score_chunk(&question, &chunk("b", &["معرفت", "نور"]), &options), 0.0);
    }

    #[test]
    fn question_duplicates_count_against_chunk_set() {
        let options = RetrievalOptions::default();
        let question = terms(&["صبر", "صبر", "شکر"]);
        let target = chunk("a", &["صبر"]);

        assert_eq!(overlap_count(&question, &target), 2);
        let expected = 0.85 * (2.0 / 3.0) + 0.15 * (2.0 / 20.0);
        assert!((score_chunk(&question, &target, &options) - expected).abs() < 1e-12);
    }

    #[test]
    fn density_uses_chunk_length_above_floor() {
        let options = RetrievalOptions::default();
        let long = (0..40).map(|i| format!("t{i}")).collect::<Vec<_>>();
        let long_refs = long.iter().map(String::as_str).collect::<Vec<_>>();
        let target = chunk("a", &long_refs);
        let question = terms(&["t1"]);

        let expected = 0.85 + 0.15 * (1.0 / 40.0);
        assert!((score_chunk(&question, &target, &options) - expected).abs() < 1e-12);
    }

    #[test]
    fn ranking_caps_at_k_and_drops_zero_scores() {
        let options = RetrievalOptions::default();
        let index = ChunkIndex::from_chunks(vec![
            chunk("a", &["صبر"]),
            chunk("b", &["صبر", "شکر"]),
            chunk("c", &["توحید"]),
            chunk("d", &["شکر"]),
            chunk("e", &["صبر", "شکر", "نور"]),
            chunk("f", &["صبر", "نور"]),
        ]);
        let question = terms(&["صبر", "شکر"]);

        let hits = rank_chunks(&question, &index, &options, 4);
        assert_eq!(hits.len(), 4);
        assert!(hits.iter().all(|hit| hit.score > 0.0));
        assert!(hits.iter().all(|hit| hit.chunk.id != "c"));
        assert_eq!(hits[0].chunk.id, "b");
        assert_eq!(hits[1].chunk.id, "e");
    }

    #[test]
    fn ties_preserve_index_order() {
        let options = RetrievalOptions::default();
        let index = ChunkIndex::from_chunks(vec![
            chunk("first", &["صبر", "نور"]),
            chunk("second", &["صبر", "شکر"]),
            chunk("third", &["صبر", "معرفت"]),
        ]);

        let ids = rank_chunks(&terms(&["صبر"]), &index, &options, 4)
            .iter()
            .map(|hit| hit.chunk.id.clone())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn full_coverage_single_chunk() {
        let options = RetrievalOptions::default();
        let index = ChunkIndex::from_chunks(vec![chunk("only", &["صبر", "شکر", "نور"])]);

        let hits = retrieve("صبر و شکر", &index, &options);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id, "only");
        let question = tokenize("صبر و شکر");
        assert_eq!(overlap_count(&question, hits[0].chunk), question.len());
    }
}
