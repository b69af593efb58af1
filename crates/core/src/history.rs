use crate::models::{ConversationTurn, Role};
use chrono::Utc;
use std::collections::VecDeque;

/// Append-only record of one conversation session.
///
/// Retains at most `capacity` turns; the oldest fall off first.
#[derive(Debug, Clone)]
pub struct ConversationLog {
    turns: VecDeque<ConversationTurn>,
    capacity: usize,
}

impl ConversationLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            turns: VecDeque::new(),
            capacity: capacity.max(2),
        }
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        if self.turns.len() == self.capacity {
            self.turns.pop_front();
        }
        self.turns.push_back(ConversationTurn {
            role,
            content: content.into(),
            at: Utc::now(),
        });
    }

    /// Last `count` turns, oldest first.
    pub fn recent(&self, count: usize) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter().skip(self.turns.len().saturating_sub(count))
    }

    pub fn turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns = VecDeque::new();
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::with_capacity(200)
    }
}
