//! Chat assistant seam.
//!
//! The portal sends the ordered conversation to a [`CompletionClient`] and
//! shows whatever text comes back. Any failure becomes a fixed apology; the
//! request is not retried.

use std::future::Future;

use academy_shared::constants::ASSISTANT_APOLOGY;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::PortalConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub text: String,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Completion service unavailable: {0}")]
    Unavailable(String),

    #[error("Completion request rejected: {0}")]
    Rejected(String),
}

/// A text-completion service.
pub trait CompletionClient: Send + Sync {
    fn complete(
        &self,
        history: &[ChatTurn],
    ) -> impl Future<Output = Result<String, CompletionError>> + Send;
}

pub struct Assistant<C> {
    client: C,
    history: Vec<ChatTurn>,
    max_turns: usize,
}

impl<C: CompletionClient> Assistant<C> {
    pub fn new(client: C, max_turns: usize) -> Self {
        Self {
            client,
            history: Vec::new(),
            max_turns: max_turns.max(1),
        }
    }

    /// An assistant keeping `config.assistant_history` turns of context.
    pub fn with_config(client: C, config: &PortalConfig) -> Self {
        Self::new(client, config.assistant_history)
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    /// Send `message` and return the reply to show. Failed or empty replies
    /// return the apology, which is kept out of the history.
    pub async fn reply(&mut self, message: &str) -> String {
        self.history.push(ChatTurn::user(message));
        self.trim();

        match self.client.complete(&self.history).await {
            Ok(text) if !text.trim().is_empty() => {
                self.history.push(ChatTurn::model(text.clone()));
                self.trim();
                text
            }
            Ok(_) => {
                tracing::warn!("assistant returned an empty reply");
                ASSISTANT_APOLOGY.to_string()
            }
            Err(e) => {
                tracing::warn!(error = %e, "assistant request failed");
                ASSISTANT_APOLOGY.to_string()
            }
        }
    }

    fn trim(&mut self) {
        if self.history.len() > self.max_turns {
            let excess = self.history.len() - self.max_turns;
            self.history.drain(..excess);
        }
    }
}
