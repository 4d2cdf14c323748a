//! Messages delivered to streaming subscribers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::{ChangeEvent, ChangeKind};

/// Language used for the human-readable parts of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    En,
    #[default]
    Zh,
}

impl Locale {
    fn verb(&self, kind: ChangeKind) -> &'static str {
        match (self, kind) {
            (Self::En, ChangeKind::Insert) => "added",
            (Self::En, ChangeKind::Update) => "updated",
            (Self::En, ChangeKind::Delete) => "deleted",
            (Self::Zh, ChangeKind::Insert) => "新增",
            (Self::Zh, ChangeKind::Update) => "修改",
            (Self::Zh, ChangeKind::Delete) => "删除",
        }
    }

    /// Short headline for a change
    pub fn title(&self, event: &ChangeEvent) -> String {
        match self {
            Self::En => format!("{} changed", event.codelist_name),
            Self::Zh => format!("码表数据变更：{}", event.codelist_name),
        }
    }

    /// One-sentence description of a change
    pub fn summary(&self, event: &ChangeEvent) -> String {
        let verb = self.verb(event.change_kind);

        match self {
            Self::En => format!(
                "{} {} entry {} ({}) in {}",
                event.actor, verb, event.entity_code, event.entity_name, event.codelist_name
            ),
            Self::Zh => format!(
                "{}{}了{}的条目{}（{}）",
                event.actor, verb, event.codelist_name, event.entity_code, event.entity_name
            ),
        }
    }

    fn connected_text(&self) -> &'static str {
        match self {
            Self::En => "Connected to codelist change stream",
            Self::Zh => "已连接码表变更通知",
        }
    }
}

/// A change event as delivered to a subscriber
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeNotification {
    pub message_id: String,
    #[serde(flatten)]
    pub event: ChangeEvent,
    pub title: String,
    pub summary: String,
}

impl ChangeNotification {
    /// Render an event for subscribers, generating a fresh message id
    pub fn render(event: ChangeEvent, locale: Locale) -> Self {
        Self {
            message_id: uuid::Uuid::new_v4().to_string(),
            title: locale.title(&event),
            summary: locale.summary(&event),
            event,
        }
    }
}

/// Everything a subscription can receive
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamMessage {
    /// Acknowledgment sent once, before any change
    Connected {
        message: String,
        #[serde(rename = "connectedAt")]
        connected_at: DateTime<Utc>,
    },
    /// A published change
    Change(ChangeNotification),
}

impl StreamMessage {
    pub fn connected(locale: Locale) -> Self {
        Self::Connected {
            message: locale.connected_text().to_string(),
            connected_at: Utc::now(),
        }
    }

    /// SSE event name for this message
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::Connected { .. } => "connected",
            Self::Change(_) => "change",
        }
    }

    /// Message id used as the SSE `id` field, if any
    pub fn message_id(&self) -> Option<&str> {
        match self {
            Self::Connected { .. } => None,
            Self::Change(notification) => Some(&notification.message_id),
        }
    }
}
