//! Shared domain enumerations aligned with persisted database enums.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Editorial lifecycle state of an article in the operational store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "article_status", rename_all = "snake_case")]
pub enum ArticleStatus {
    Draft,
    PendingReview,
    Rejected,
    Approved,
    Published,
}

impl ArticleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ArticleStatus::Draft => "draft",
            ArticleStatus::PendingReview => "pending_review",
            ArticleStatus::Rejected => "rejected",
            ArticleStatus::Approved => "approved",
            ArticleStatus::Published => "published",
        }
    }

    /// States in which the owning writer may still edit the draft.
    pub fn is_writer_mutable(self) -> bool {
        matches!(self, ArticleStatus::Draft | ArticleStatus::Rejected)
    }
}

/// Site variant an article is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "site_context", rename_all = "snake_case")]
pub enum SiteContext {
    Main,
    Worldcup,
    Elections,
}

impl SiteContext {
    pub fn as_str(self) -> &'static str {
        match self {
            SiteContext::Main => "main",
            SiteContext::Worldcup => "worldcup",
            SiteContext::Elections => "elections",
        }
    }
}

/// Role attached to the acting identity by the upstream auth layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Writer,
    Editor,
}

impl ActorRole {
    pub fn as_str(self) -> &'static str {
        match self {
            ActorRole::Writer => "writer",
            ActorRole::Editor => "editor",
        }
    }
}

impl FromStr for ActorRole {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "writer" => Ok(ActorRole::Writer),
            "editor" => Ok(ActorRole::Editor),
            _ => Err(()),
        }
    }
}

/// Acting identity, established by the outer request layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: uuid::Uuid,
    pub role: ActorRole,
}

impl Actor {
    pub fn is_editor(&self) -> bool {
        self.role == ActorRole::Editor
    }
}
