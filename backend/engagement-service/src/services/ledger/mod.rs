// ============================================
// Interaction Ledger
// ============================================
//
// Reader-initiated poll votes and comment threads.
//
// Votes: at most one choice per poll; recasting replaces the previous choice.
// Counts are an optimistic overlay, base counts from the catalog never change
// and the reader contributes at most +1 per poll.
//
// Comments: append-only per item, no edits, no deletion.

use crate::catalog::Catalog;
use crate::models::{Comment, ItemId, OptionId, Poll, PollId, PollOption};
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Unknown poll: {0}")]
    UnknownPoll(String),

    #[error("Option {option_id} does not belong to poll {poll_id}")]
    UnknownOption { poll_id: String, option_id: String },

    #[error("Unknown item: {0}")]
    UnknownItem(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Identity stamped on comments written by the session's reader
#[derive(Debug, Clone, Serialize)]
pub struct CommentAuthor {
    pub display_name: String,
    pub avatar_ref: String,
}

#[derive(Debug, Clone, Default)]
pub struct InteractionLedger {
    votes: HashMap<PollId, OptionId>,
    threads: HashMap<ItemId, Vec<Comment>>,
}

impl InteractionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the comments shipped with the catalog
    pub fn seeded(catalog: &Catalog) -> Self {
        let threads = catalog
            .items()
            .iter()
            .filter(|item| !item.comments.is_empty())
            .map(|item| (item.id.clone(), item.comments.clone()))
            .collect();

        Self {
            votes: HashMap::new(),
            threads,
        }
    }

    /// Record the reader's choice, replacing any earlier one for the same poll
    pub fn cast_vote(&mut self, poll: &Poll, option_id: &str) -> Result<()> {
        if poll.option(option_id).is_none() {
            return Err(LedgerError::UnknownOption {
                poll_id: poll.id.clone(),
                option_id: option_id.to_string(),
            });
        }

        let previous = self.votes.insert(poll.id.clone(), option_id.to_string());

        debug!(
            poll_id = %poll.id,
            option_id = option_id,
            previous = ?previous,
            "Vote recorded"
        );

        Ok(())
    }

    pub fn vote_for(&self, poll_id: &str) -> Option<&str> {
        self.votes.get(poll_id).map(String::as_str)
    }

    pub fn effective_vote_count(&self, poll_id: &str, option: &PollOption) -> u64 {
        match self.vote_for(poll_id) {
            Some(chosen) if chosen == option.id => option.base_vote_count + 1,
            _ => option.base_vote_count,
        }
    }

    pub fn total_votes(&self, poll: &Poll) -> u64 {
        poll.options
            .iter()
            .map(|option| self.effective_vote_count(&poll.id, option))
            .sum()
    }

    /// Fraction of the total in [0, 1]; 0 when nobody has voted
    pub fn vote_share(&self, poll: &Poll, option: &PollOption) -> f64 {
        let total = self.total_votes(poll);
        if total == 0 {
            return 0.0;
        }
        self.effective_vote_count(&poll.id, option) as f64 / total as f64
    }

    pub fn tally(&self, poll: &Poll) -> PollTally {
        let chosen = self.vote_for(&poll.id);
        let total_votes = self.total_votes(poll);

        let options = poll
            .options
            .iter()
            .map(|option| {
                let votes = self.effective_vote_count(&poll.id, option);
                OptionTally {
                    option_id: option.id.clone(),
                    text: option.text.clone(),
                    votes,
                    share: if total_votes == 0 {
                        0.0
                    } else {
                        votes as f64 / total_votes as f64
                    },
                    chosen: chosen == Some(option.id.as_str()),
                }
            })
            .collect();

        PollTally {
            poll_id: poll.id.clone(),
            question: poll.question.clone(),
            options,
            total_votes,
            has_voted: chosen.is_some(),
        }
    }

    /// Append a comment to an item's thread. Blank text is ignored.
    pub fn add_comment(
        &mut self,
        item_id: &str,
        text: &str,
        author: &CommentAuthor,
    ) -> Option<&Comment> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            author: author.display_name.clone(),
            avatar_ref: author.avatar_ref.clone(),
            text: text.to_string(),
            created_at: Utc::now(),
        };

        info!(
            item_id = item_id,
            comment_id = %comment.id,
            "Comment appended"
        );

        let thread = self.threads.entry(item_id.to_string()).or_default();
        thread.push(comment);
        thread.last()
    }

    pub fn comments(&self, item_id: &str) -> &[Comment] {
        self.threads.get(item_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Poll results as shown to the reader
#[derive(Debug, Clone, Serialize)]
pub struct PollTally {
    pub poll_id: PollId,
    pub question: String,
    pub options: Vec<OptionTally>,
    pub total_votes: u64,
    pub has_voted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionTally {
    pub option_id: OptionId,
    pub text: String,
    pub votes: u64,
    pub share: f64,
    pub chosen: bool,
}
