pub mod answer;
pub mod chunking;
pub mod config;
pub mod conversation;
pub mod corpus;
pub mod error;
pub mod history;
pub mod index;
pub mod models;
pub mod remote;
pub mod retrieval;
pub mod text;

pub use answer::{compose_answer, synthesize, NO_ANSWER_MESSAGE};
pub use chunking::{build_chunks, split_paragraphs, DEFAULT_MIN_PARAGRAPH_CHARS};
pub use config::QaConfig;
pub use conversation::{ConversationController, TurnOutcome, TurnReply};
pub use corpus::{
    load_lectures_json, parse_lectures_json, InMemoryLectureRepository, LectureRepository,
};
pub use error::{ConfigError, ConversationError, CorpusError, RemoteError};
pub use history::ConversationLog;
pub use index::ChunkIndex;
pub use models::{
    AnswerLimits, AnswerMode, Chunk, Citation, ConversationOptions, ConversationTurn, Lecture,
    LocalAnswer, RetrievalOptions, Role, ScoredChunk, Settings,
};
pub use remote::{ChatCompletion, ChatMessage, CompletionRequest, OpenAiCompatibleClient};
pub use retrieval::{rank_chunks, retrieve, score_chunk};
pub use text::{normalize, tokenize};
