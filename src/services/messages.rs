//! Contact messages between profiles

use chrono::{Duration, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use crate::api::{PageRequest, Paginated};
use crate::domain::messages::{
    reply_subject, ContactMessage, Mailbox, MessageQuery, MessageStatus, ReplyMessageRequest,
    SendMessageRequest,
};
use crate::error::{ApiError, ApiResult};
use crate::validation::{sanitize_text, validate_contact_message};

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, subject, body, status, created_at, read_at";

/// Rolling window for the per-sender message limit
fn rate_window() -> Duration {
    Duration::hours(24)
}

/// Outcome of marking a message as read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadTransition {
    /// unread -> read
    Marked,
    /// Already read or replied; nothing to do
    Unchanged,
}

/// Decide what marking a message with `status` as read does.
///
/// Re-marking is accepted as a no-op so clients can retry freely.
pub fn read_transition(status: MessageStatus) -> ReadTransition {
    if status.can_transition_to(MessageStatus::Read) {
        ReadTransition::Marked
    } else {
        ReadTransition::Unchanged
    }
}

/// Validated, sanitized subject and body
fn prepare(subject: &str, body: &str) -> ApiResult<(String, String)> {
    ApiError::check(validate_contact_message(subject, body))?;

    let subject = sanitize_text(subject);
    let body = sanitize_text(body);
    // Sanitizing can strip a subject made only of angle brackets
    ApiError::check(validate_contact_message(&subject, &body))?;
    Ok((subject, body))
}

fn ensure_under_limit(sent_in_window: i64, daily_limit: i64) -> ApiResult<()> {
    if sent_in_window >= daily_limit {
        return Err(ApiError::RateLimitExceeded(format!(
            "You can send up to {} messages per day. Please try again later.",
            daily_limit
        )));
    }
    Ok(())
}

#[derive(Clone)]
pub struct MessageService {
    db: PgPool,
    daily_limit: i64,
}

impl MessageService {
    pub fn new(db: PgPool, daily_limit: i64) -> Self {
        Self { db, daily_limit }
    }

    /// Send a message from `sender_id`
    #[instrument(skip(self, req), fields(receiver_id = %req.receiver_id))]
    pub async fn send_message(
        &self,
        sender_id: Uuid,
        req: SendMessageRequest,
    ) -> ApiResult<ContactMessage> {
        if sender_id == req.receiver_id {
            return Err(ApiError::bad_request("You cannot send a message to yourself"));
        }
        let (subject, body) = prepare(&req.subject, &req.body)?;
        self.deliver(sender_id, req.receiver_id, &subject, &body).await
    }

    /// Rate-limit check and insert, shared by sends and replies
    async fn deliver(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
        subject: &str,
        body: &str,
    ) -> ApiResult<ContactMessage> {
        let receiver_exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM profiles WHERE id = $1)")
                .bind(receiver_id)
                .fetch_one(&self.db)
                .await?;
        if !receiver_exists {
            return Err(ApiError::not_found("Recipient not found"));
        }

        let mut tx = self.db.begin().await?;

        // Serialize concurrent sends from one sender so the count stays honest
        sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, 0))")
            .bind(sender_id)
            .execute(&mut *tx)
            .await?;

        let since = Utc::now() - rate_window();
        let sent: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM contact_messages WHERE sender_id = $1 AND created_at > $2",
        )
        .bind(sender_id)
        .bind(since)
        .fetch_one(&mut *tx)
        .await?;

        if let Err(e) = ensure_under_limit(sent, self.daily_limit) {
            tracing::warn!(sender_id = %sender_id, sent, "Message rate limit reached");
            return Err(e);
        }

        let message = sqlx::query_as::<_, ContactMessage>(&format!(
            r#"
            INSERT INTO contact_messages (id, sender_id, receiver_id, subject, body, status, created_at)
            VALUES ($1, $2, $3, $4, $5, 'unread', NOW())
            RETURNING {}
            "#,
            MESSAGE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(receiver_id)
        .bind(subject)
        .bind(body)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            message_id = %message.id,
            sender_id = %sender_id,
            receiver_id = %receiver_id,
            "Message sent"
        );
        Ok(message)
    }

    /// Inbox or sent box of `user_id`, newest first
    #[instrument(skip(self))]
    pub async fn get_messages(
        &self,
        user_id: Uuid,
        query: &MessageQuery,
        page: PageRequest,
    ) -> ApiResult<Paginated<ContactMessage>> {
        let owner_column = match query.mailbox {
            Mailbox::Inbox => "receiver_id",
            Mailbox::Sent => "sender_id",
        };

        let push_filters = |qb: &mut QueryBuilder<'_, Postgres>| {
            qb.push(format!(" WHERE {} = ", owner_column)).push_bind(user_id);
            if let Some(status) = query.status {
                qb.push(" AND status = ").push_bind(status.as_str());
            }
        };

        let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM contact_messages");
        push_filters(&mut count_query);
        let total: i64 = count_query.build_query_scalar().fetch_one(&self.db).await?;

        let mut list_query =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM contact_messages", MESSAGE_COLUMNS));
        push_filters(&mut list_query);
        list_query
            .push(" ORDER BY created_at DESC, id ASC LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);
        let messages: Vec<ContactMessage> = list_query.build_query_as().fetch_all(&self.db).await?;

        Ok(Paginated::new(messages, &page, total.max(0) as u64))
    }

    async fn load_for_receiver(&self, user_id: Uuid, message_id: Uuid) -> ApiResult<ContactMessage> {
        let message = sqlx::query_as::<_, ContactMessage>(&format!(
            "SELECT {} FROM contact_messages WHERE id = $1",
            MESSAGE_COLUMNS
        ))
        .bind(message_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Message not found"))?;

        if message.receiver_id != user_id {
            return Err(ApiError::Forbidden(
                "Only the recipient can update this message".into(),
            ));
        }
        Ok(message)
    }

    /// Mark a received message as read; already read messages are left alone
    #[instrument(skip(self))]
    pub async fn mark_as_read(&self, user_id: Uuid, message_id: Uuid) -> ApiResult<ContactMessage> {
        let message = self.load_for_receiver(user_id, message_id).await?;

        match read_transition(message.status) {
            ReadTransition::Unchanged => Ok(message),
            ReadTransition::Marked => {
                let updated = sqlx::query_as::<_, ContactMessage>(&format!(
                    r#"
                    UPDATE contact_messages
                    SET status = 'read', read_at = COALESCE(read_at, NOW())
                    WHERE id = $1 AND status = 'unread'
                    RETURNING {}
                    "#,
                    MESSAGE_COLUMNS
                ))
                .bind(message_id)
                .fetch_optional(&self.db)
                .await?;

                tracing::debug!(message_id = %message_id, "Message marked read");
                // A concurrent reply may have won; report the current state
                match updated {
                    Some(updated) => Ok(updated),
                    None => self.load_for_receiver(user_id, message_id).await,
                }
            }
        }
    }

    /// Answer a received message. The reply goes back to the original sender
    /// and the original moves to `replied`.
    #[instrument(skip(self, req))]
    pub async fn reply_to_message(
        &self,
        user_id: Uuid,
        message_id: Uuid,
        req: ReplyMessageRequest,
    ) -> ApiResult<ContactMessage> {
        let original = self.load_for_receiver(user_id, message_id).await?;

        let subject = req
            .subject
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| reply_subject(&original.subject));
        let (subject, body) = prepare(&subject, &req.body)?;

        let reply = self
            .deliver(user_id, original.sender_id, &subject, &body)
            .await?;

        if original.status.can_transition_to(MessageStatus::Replied) {
            sqlx::query(
                r#"
                UPDATE contact_messages
                SET status = 'replied', read_at = COALESCE(read_at, NOW())
                WHERE id = $1 AND status <> 'replied'
                "#,
            )
            .bind(message_id)
            .execute(&self.db)
            .await?;
        }

        tracing::info!(message_id = %message_id, reply_id = %reply.id, "Message replied");
        Ok(reply)
    }
}
