use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

use super::projects::fetch_project;
use super::{get_enum, get_ts, get_uuid, now, ts, Database};
use crate::error::{Error, Result};
use crate::models::*;

const MESSAGE_COLUMNS: &str = "id, project_id, role, content, created_at";

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<ChatMessage> {
    Ok(ChatMessage {
        id: get_uuid(row, 0)?,
        project_id: get_uuid(row, 1)?,
        role: get_enum(row, 2, MessageRole::from_str)?,
        content: row.get(3)?,
        created_at: get_ts(row, 4)?,
    })
}

impl Database {
    pub fn post_message(&self, project_id: Uuid, input: PostMessageInput) -> Result<ChatMessage> {
        if input.content.trim().is_empty() {
            return Err(Error::InvalidInput("message must not be empty".into()));
        }
        let conn = self.conn()?;
        fetch_project(&conn, project_id)?;

        let message = ChatMessage {
            id: Uuid::new_v4(),
            project_id,
            role: input.role,
            content: input.content,
            created_at: now(),
        };
        conn.execute(
            &format!("INSERT INTO chat_messages ({MESSAGE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5)"),
            params![
                message.id.to_string(),
                project_id.to_string(),
                message.role.as_str(),
                message.content,
                ts(&message.created_at),
            ],
        )?;
        Ok(message)
    }

    pub fn list_messages(&self, project_id: Uuid) -> Result<Vec<ChatMessage>> {
        let conn = self.conn()?;
        fetch_project(&conn, project_id)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE project_id = ?1 ORDER BY created_at"
        ))?;
        let messages = stmt
            .query_map(params![project_id.to_string()], message_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(messages)
    }

    /// The chat message a citation was confirmed in, for jumping from a
    /// rendered fact back to the conversation.
    pub fn citation_source(&self, citation_id: Uuid) -> Result<Option<ChatMessage>> {
        let citation = self
            .get_citation(citation_id)?
            .ok_or(Error::CitationNotFound(citation_id))?;
        let Some(message_id) = citation.message_id else {
            return Ok(None);
        };

        let conn = self.conn()?;
        let message = conn
            .query_row(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM chat_messages WHERE id = ?1 AND project_id = ?2"
                ),
                params![message_id.to_string(), citation.project_id.to_string()],
                message_from_row,
            )
            .optional()?;
        Ok(message)
    }
}
