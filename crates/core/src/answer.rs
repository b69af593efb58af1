use crate::index::ChunkIndex;
use crate::models::{AnswerLimits, Citation, LocalAnswer, RetrievalOptions, ScoredChunk};
use crate::retrieval::retrieve;
use crate::text::truncate_excerpt;

pub const NO_ANSWER_MESSAGE: &str =
    "در متن سخنرانی های موجود، پاسخ دقیقی برای این سوال پیدا نشد. لطفا سوال را جزئی تر بپرسید.";

pub const SUPPLEMENTARY_HEADING: &str = "نکات تکمیلی از جلسات مرتبط:";

pub fn citation_for(hit: &ScoredChunk<'_>, limits: &AnswerLimits) -> Citation {
    Citation {
        lecture_id: hit.chunk.lecture_id.clone(),
        lecture_title: hit.chunk.lecture_title.clone(),
        session_number: hit.chunk.session_number,
        excerpt: truncate_excerpt(&hit.chunk.paragraph, limits.citation_chars),
    }
}

/// Extractive answer from already ranked hits.
///
/// The best passage is the body, the next few become bullet notes, and every
/// hit is cited.
pub fn compose_answer(hits: &[ScoredChunk<'_>], limits: &AnswerLimits) -> LocalAnswer {
    let Some(best) = hits.first() else {
        return LocalAnswer {
            text: NO_ANSWER_MESSAGE.to_string(),
            citations: Vec::new(),
        };
    };

    let mut text = truncate_excerpt(&best.chunk.paragraph, limits.primary_chars);
    let support = hits
        .iter()
        .skip(1)
        .take(limits.supplementary_count)
        .collect::<Vec<_>>();

    if !support.is_empty() {
        text.push_str("\n\n");
        text.push_str(SUPPLEMENTARY_HEADING);
        text.push('\n');
        for hit in support {
            text.push_str("- ");
            text.push_str(&truncate_excerpt(&hit.chunk.paragraph, limits.supplementary_chars));
            text.push('\n');
        }
    }

    LocalAnswer {
        text,
        citations: hits.iter().map(|hit| citation_for(hit, limits)).collect(),
    }
}

pub fn synthesize(
    question: &str,
    index: &ChunkIndex,
    retrieval: &RetrievalOptions,
    limits: &AnswerLimits,
) -> LocalAnswer {
    let hits = retrieve(question, index, retrieval);
    compose_answer(&hits, limits)
}
