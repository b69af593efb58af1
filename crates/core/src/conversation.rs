//! Per-turn question answering.
//!
//! Every turn computes the local extractive answer first. In smart mode with a
//! configured key the controller then makes one bounded remote call grounded
//! on the same retrieved passages; any remote failure falls back to the local
//! answer. Citations always come from local retrieval.

use crate::answer::compose_answer;
use crate::error::{ConversationError, RemoteError};
use crate::history::ConversationLog;
use crate::index::ChunkIndex;
use crate::models::{
    AnswerLimits, AnswerMode, Citation, ConversationOptions, ConversationTurn, RetrievalOptions,
    Role, ScoredChunk, Settings,
};
use crate::remote::{ChatCompletion, ChatMessage, CompletionRequest};
use crate::text::{clip, truncate_excerpt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const SYSTEM_PROMPT: &str = "تو دستیار پاسخگو به سوالات درباره متن سخنرانی های حاج آقا سعادتفر هستی. \
فقط بر اساس بخش هایی از متن سخنرانی ها که در پیام کاربر آمده پاسخ بده و از دانسته های بیرونی استفاده نکن. \
اگر این بخش ها برای پاسخ کافی نیست، صریحا بگو که در متن ها پاسخ کافی پیدا نشد. \
پاسخ را همیشه به زبان فارسی بنویس. \
برای هر ادعا به شماره منبع مربوط مانند [1] یا [2] ارجاع بده.";

pub const MISSING_KEY_NOTICE: &str = "حالت هوشمند فعال است اما کلید API تنظیم نشده است، بنابراین پاسخ از جستجوی محلی نمایش داده شد. برای استفاده از مدل زبانی، کلید API را در تنظیمات وارد کنید.";

pub const REMOTE_FAILURE_PREFIX: &str = "ارتباط با سرویس مدل زبانی ناموفق بود و پاسخ محلی نمایش داده شد. خطا:";

/// How the shown answer was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Local mode; the extractive answer.
    Local,
    /// Smart mode without a credential; the extractive answer with an explanation.
    LocalWithExplain,
    /// Smart mode; the remote model's answer.
    Remote,
    /// Smart mode; the remote call failed and the extractive answer was shown.
    RemoteFallback { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub outcome: TurnOutcome,
    pub answer: String,
    pub notice: Option<String>,
    pub citations: Vec<Citation>,
}

pub struct ConversationController<C: ChatCompletion> {
    index: Arc<ChunkIndex>,
    settings: Settings,
    retrieval: RetrievalOptions,
    limits: AnswerLimits,
    options: ConversationOptions,
    history: ConversationLog,
    backend: C,
}

impl<C: ChatCompletion> ConversationController<C> {
    pub fn new(index: Arc<ChunkIndex>, settings: Settings, backend: C) -> Self {
        let options = ConversationOptions::default();
        Self {
            index,
            settings,
            retrieval: RetrievalOptions::default(),
            limits: AnswerLimits::default(),
            history: ConversationLog::with_capacity(options.history_capacity),
            options,
            backend,
        }
    }

    pub fn with_retrieval(mut self, retrieval: RetrievalOptions) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn with_limits(mut self, limits: AnswerLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_options(mut self, options: ConversationOptions) -> Self {
        self.history = ConversationLog::with_capacity(options.history_capacity);
        self.options = options;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn index(&self) -> &Arc<ChunkIndex> {
        &self.index
    }

    /// Swaps in a freshly built snapshot; the old one is left untouched.
    pub fn replace_index(&mut self, index: Arc<ChunkIndex>) {
        self.index = index;
    }

    pub fn history(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.history.turns()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn backend(&self) -> &C {
        &self.backend
    }

    /// Answers one question and records it in the history.
    ///
    /// Taking `&mut self` means no second question can be submitted while a
    /// remote call is outstanding.
    pub async fn submit(&mut self, question: &str) -> Result<TurnReply, ConversationError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ConversationError::EmptyQuestion);
        }

        let index = Arc::clone(&self.index);
        let hits = crate::retrieval::retrieve(question, &index, &self.retrieval);
        let local = compose_answer(&hits, &self.limits);

        let reply = match self.settings.mode {
            AnswerMode::Local => {
                debug!(hits = hits.len(), "local mode answer");
                TurnReply {
                    outcome: TurnOutcome::Local,
                    answer: local.text,
                    notice: None,
                    citations: local.citations,
                }
            }
            AnswerMode::Smart if !self.settings.has_api_key() => {
                warn!("smart mode requested without an api key; answering locally");
                TurnReply {
                    outcome: TurnOutcome::LocalWithExplain,
                    answer: local.text,
                    notice: Some(MISSING_KEY_NOTICE.to_string()),
                    citations: local.citations,
                }
            }
            AnswerMode::Smart => {
                let request = self.build_request(question, &hits);
                info!(
                    model = %self.settings.model,
                    grounding = hits.len(),
                    history = request.messages.len().saturating_sub(2),
                    "requesting remote completion"
                );
                match self.call_remote(&request).await {
                    Ok(content) => TurnReply {
                        outcome: TurnOutcome::Remote,
                        answer: content,
                        notice: None,
                        citations: local.citations,
                    },
                    Err(error) => {
                        let detail = clip(&error.to_string(), self.options.error_chars);
                        warn!(error = %detail, "remote completion failed; falling back to local answer");
                        TurnReply {
                            outcome: TurnOutcome::RemoteFallback {
                                error: detail.clone(),
                            },
                            answer: local.text,
                            notice: Some(format!("{REMOTE_FAILURE_PREFIX} {detail}")),
                            citations: local.citations,
                        }
                    }
                }
            }
        };

        self.history.push(Role::User, question);
        self.history.push(Role::Assistant, reply.answer.clone());
        Ok(reply)
    }

    async fn call_remote(&self, request: &CompletionRequest) -> Result<String, RemoteError> {
        let timeout = Duration::from_secs(self.options.timeout_secs);
        tokio::time::timeout(timeout, self.backend.complete(&self.settings, request))
            .await
            .map_err(|_| RemoteError::Timeout(self.options.timeout_secs))?
    }

    fn build_request(&self, question: &str, hits: &[ScoredChunk<'_>]) -> CompletionRequest {
        let mut messages = Vec::with_capacity(self.options.history_window + 2);
        messages.push(ChatMessage::new(Role::System, SYSTEM_PROMPT));
        messages.extend(
            self.history
                .recent(self.options.history_window)
                .map(|turn| ChatMessage::new(turn.role, turn.content.clone())),
        );
        messages.push(ChatMessage::new(
            Role::User,
            grounding_message(question, hits, self.limits.context_chars),
        ));

        CompletionRequest {
            model: self.settings.model.clone(),
            temperature: self.options.temperature,
            messages,
        }
    }
}

/// The user turn sent upstream: the question followed by numbered excerpts.
pub fn grounding_message(question: &str, hits: &[ScoredChunk<'_>], excerpt_chars: usize) -> String {
    let mut message = format!("سوال: {question}\n\n");

    if hits.is_empty() {
        message.push_str("هیچ بخش مرتبطی در متن سخنرانی ها پیدا نشد.");
        return message;
    }

    message.push_str("بخش های مرتبط از متن سخنرانی ها:\n");
    for (position, hit) in hits.iter().enumerate() {
        message.push_str(&format!(
            "[{}] {} (جلسه {}): {}\n",
            position + 1,
            hit.chunk.lecture_title,
            hit.chunk.session_number,
            truncate_excerpt(&hit.chunk.paragraph, excerpt_chars)
        ));
    }
    message
}
