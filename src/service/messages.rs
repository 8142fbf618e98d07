//! Direct messages between staff and parents.

use super::notifications::notify_best_effort;
use super::{delete_by_id, fetch_list, id_filter, insert_row, now_value, require_text, select_by_id};
use crate::backend::{from_row, from_rows, to_row, Filter, Query, Row};
use crate::client::CareClient;
use crate::error::AppError;
use crate::models::{Message, NewMessage, NewNotification, NotificationType, User};
use crate::query_key;
use crate::schema::{MESSAGES, USERS};
use serde_json::Value;
use uuid::Uuid;

const PREVIEW_CHARS: usize = 100;

pub struct MessagesService<'a> {
    client: &'a CareClient,
}

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }
    let cut: String = content.chars().take(PREVIEW_CHARS).collect();
    format!("{}...", cut.trim_end())
}

impl<'a> MessagesService<'a> {
    pub(crate) fn new(client: &'a CareClient) -> Self {
        MessagesService { client }
    }

    fn invalidate(&self) {
        self.client.cache().invalidate(&query_key!("messages"));
    }

    /// Uncached lookup, for ownership checks ahead of a mutation.
    pub async fn get(&self, id: &Uuid) -> Result<Message, AppError> {
        let row = select_by_id(self.client, MESSAGES, id)
            .await?
            .ok_or_else(|| AppError::not_found("message", id))?;
        from_row(row)
    }

    /// Both directions between two users, oldest first.
    pub async fn conversation(&self, user_a: &Uuid, user_b: &Uuid) -> Result<Vec<Message>, AppError> {
        let client = self.client;
        client
            .cache()
            .fetch(query_key!("messages", "conversation", user_a, user_b), || async {
                let sent = Query::table(MESSAGES)
                    .eq("sender_id", user_a.to_string())
                    .eq("recipient_id", user_b.to_string());
                let received = Query::table(MESSAGES)
                    .eq("sender_id", user_b.to_string())
                    .eq("recipient_id", user_a.to_string());
                let mut rows = client.backend().select(&sent).await?;
                if user_a != user_b {
                    rows.extend(client.backend().select(&received).await?);
                }
                let order = Query::table(MESSAGES).order("created_at", true);
                rows.sort_by(|a, b| order.compare_rows(a, b));
                from_rows(rows)
            })
            .await
    }

    /// Received messages, newest first.
    pub async fn inbox(&self, user_id: &Uuid) -> Result<Vec<Message>, AppError> {
        let q = Query::table(MESSAGES)
            .eq("recipient_id", user_id.to_string())
            .order("created_at", false);
        fetch_list(self.client, query_key!("messages", "inbox", user_id), q).await
    }

    pub async fn sent(&self, user_id: &Uuid) -> Result<Vec<Message>, AppError> {
        let q = Query::table(MESSAGES)
            .eq("sender_id", user_id.to_string())
            .order("created_at", false);
        fetch_list(self.client, query_key!("messages", "sent", user_id), q).await
    }

    pub async fn unread_count(&self, user_id: &Uuid) -> Result<u64, AppError> {
        let client = self.client;
        client
            .cache()
            .fetch(query_key!("messages", "unread", user_id), || async {
                let rows = client
                    .backend()
                    .select(
                        &Query::table(MESSAGES)
                            .eq("recipient_id", user_id.to_string())
                            .eq("is_read", false),
                    )
                    .await?;
                Ok(rows.len() as u64)
            })
            .await
    }

    /// Store the message, then notify the recipient (best-effort).
    pub async fn send(&self, input: &NewMessage) -> Result<Message, AppError> {
        let mut input = input.clone();
        input.content = require_text("content", &input.content)?;
        if input.sender_id == input.recipient_id {
            return Err(AppError::Validation("cannot send a message to yourself".into()));
        }
        let msg: Message = insert_row(self.client, MESSAGES, to_row(&input)?).await?;
        tracing::info!(message_id = %msg.id, sender = %msg.sender_id, recipient = %msg.recipient_id, "message sent");
        self.invalidate();

        let sender_name = match select_by_id(self.client, USERS, &msg.sender_id).await {
            Ok(Some(row)) => from_row::<User>(row).ok().map(|u| u.full_name),
            _ => None,
        };
        let title = match sender_name {
            Some(name) => format!("New message from {}", name),
            None => "New message".to_string(),
        };
        notify_best_effort(
            self.client,
            NewNotification {
                user_id: msg.recipient_id,
                notification_type: NotificationType::Message,
                title,
                message: preview(&msg.content),
                link: Some("/messages".to_string()),
            },
        )
        .await;
        Ok(msg)
    }

    /// Mark one message read. Already-read messages are returned unchanged.
    pub async fn mark_read(&self, id: &Uuid) -> Result<Message, AppError> {
        let mut filters = id_filter(id);
        filters.push(Filter::Eq("is_read".into(), Value::Bool(false)));
        let mut patch = Row::new();
        patch.insert("is_read".into(), Value::Bool(true));
        patch.insert("read_at".into(), now_value());
        let updated = self.client.backend().update(MESSAGES, &filters, patch).await?;
        let row = match updated.into_iter().next() {
            Some(r) => r,
            None => select_by_id(self.client, MESSAGES, id)
                .await?
                .ok_or_else(|| AppError::not_found("message", id))?,
        };
        self.invalidate();
        from_row(row)
    }

    /// Mark everything `other` sent to `reader` read. Returns how many changed.
    pub async fn mark_conversation_read(&self, reader: &Uuid, other: &Uuid) -> Result<usize, AppError> {
        let filters = [
            Filter::Eq("recipient_id".into(), reader.to_string().into()),
            Filter::Eq("sender_id".into(), other.to_string().into()),
            Filter::Eq("is_read".into(), Value::Bool(false)),
        ];
        let mut patch = Row::new();
        patch.insert("is_read".into(), Value::Bool(true));
        patch.insert("read_at".into(), now_value());
        let n = self.client.backend().update(MESSAGES, &filters, patch).await?.len();
        self.invalidate();
        Ok(n)
    }

    pub async fn delete(&self, id: &Uuid) -> Result<Message, AppError> {
        let msg = delete_by_id(self.client, MESSAGES, "message", id).await?;
        self.invalidate();
        Ok(msg)
    }
}
