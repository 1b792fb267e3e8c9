//! Chat session persistence. The full message history is stored as one JSON
//! document per session and rewritten on every append.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::schema::chat_sessions;
use super::{format_ts, now_ts, Store};
use crate::domain::{ChatMessage, ChatSessionDto};
use crate::error::Result;

#[derive(Queryable)]
struct ChatSessionRow {
    id: String,
    messages: String,
    created_at: i64,
}

#[derive(Insertable)]
#[diesel(table_name = chat_sessions)]
struct NewChatSession<'a> {
    id: &'a str,
    messages: &'a str,
    created_at: i64,
}

impl ChatSessionRow {
    fn into_dto(self) -> ChatSessionDto {
        ChatSessionDto {
            id: self.id,
            messages: serde_json::from_str(&self.messages).unwrap_or_default(),
            created_date: format_ts(self.created_at),
        }
    }
}

impl Store {
    pub async fn get_chat_session(&self, session_id: &str) -> Result<Option<ChatSessionDto>> {
        let mut conn = self.conn().await?;
        let row: Option<ChatSessionRow> = chat_sessions::table
            .filter(chat_sessions::id.eq(session_id))
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row.map(ChatSessionRow::into_dto))
    }

    pub async fn create_chat_session(&self, session_id: &str) -> Result<ChatSessionDto> {
        let now = now_ts();
        let row = NewChatSession {
            id: session_id,
            messages: "[]",
            created_at: now,
        };

        let mut conn = self.conn().await?;
        diesel::insert_into(chat_sessions::table)
            .values(&row)
            .execute(&mut conn)
            .await?;

        Ok(ChatSessionDto {
            id: session_id.to_string(),
            messages: Vec::new(),
            created_date: format_ts(now),
        })
    }

    pub async fn set_chat_messages(
        &self,
        session_id: &str,
        messages: &[ChatMessage],
    ) -> Result<()> {
        let serialized = serde_json::to_string(messages)?;
        let mut conn = self.conn().await?;
        diesel::update(chat_sessions::table.filter(chat_sessions::id.eq(session_id)))
            .set(chat_sessions::messages.eq(serialized.as_str()))
            .execute(&mut conn)
            .await?;
        Ok(())
    }
}
