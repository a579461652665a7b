use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::citations::commit_citation_tx;
use super::projects::fetch_project;
use super::{get_enum, get_ts, get_uuid, now, ts, Database};
use crate::error::{Error, Result};
use crate::models::*;

const MEMBER_COLUMNS: &str = "id, project_id, email, name, role, status, citation_id, invited_at";

fn member_from_row(row: &Row<'_>) -> rusqlite::Result<TeamMember> {
    Ok(TeamMember {
        id: get_uuid(row, 0)?,
        project_id: get_uuid(row, 1)?,
        email: row.get(2)?,
        name: row.get(3)?,
        role: get_enum(row, 4, TeamRole::from_str)?,
        status: get_enum(row, 5, InvitationStatus::from_str)?,
        citation_id: get_uuid(row, 6)?,
        invited_at: get_ts(row, 7)?,
    })
}

fn fetch_member(conn: &Connection, project_id: Uuid, member_id: Uuid) -> Result<TeamMember> {
    conn.query_row(
        &format!("SELECT {MEMBER_COLUMNS} FROM team_members WHERE id = ?1 AND project_id = ?2"),
        params![member_id.to_string(), project_id.to_string()],
        member_from_row,
    )
    .optional()?
    .ok_or(Error::MemberNotFound(member_id))
}

fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(Error::InvalidInput(format!("invalid email address {email:?}"))),
    }
}

impl Database {
    /// Add a pending team member and record a TEAM_MEMBER_INVITE citation.
    /// Sending the invitation email is left to the caller.
    pub fn invite_member(&self, project_id: Uuid, input: InviteMemberInput) -> Result<TeamMember> {
        let email = normalize_email(&input.email)?;

        self.transaction(|tx| {
            fetch_project(tx, project_id)?;

            let exists: Option<String> = tx
                .query_row(
                    "SELECT id FROM team_members WHERE project_id = ?1 AND email = ?2",
                    params![project_id.to_string(), email],
                    |row| row.get(0),
                )
                .optional()?;
            if exists.is_some() {
                return Err(Error::InvalidInput(format!("{email} is already on the team")));
            }

            let mut new = NewCitation::new(
                CiteType::TeamMemberInvite,
                format!("Invited {} as {}", email, input.role.as_str()),
                email.as_str(),
            )
            .question("team_member_invite")
            .meta("role", input.role.as_str())
            .meta("name", input.name.clone());
            new.message_id = input.message_id;
            let citation = commit_citation_tx(tx, project_id, None, new)?;

            let member = TeamMember {
                id: Uuid::new_v4(),
                project_id,
                email: email.clone(),
                name: input.name.clone(),
                role: input.role,
                status: InvitationStatus::Pending,
                citation_id: citation.id,
                invited_at: now(),
            };
            tx.execute(
                &format!("INSERT INTO team_members ({MEMBER_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"),
                params![
                    member.id.to_string(),
                    project_id.to_string(),
                    member.email,
                    member.name,
                    member.role.as_str(),
                    member.status.as_str(),
                    citation.id.to_string(),
                    ts(&member.invited_at),
                ],
            )?;

            tracing::info!(project_id = %project_id, email = %member.email, "team member invited");
            Ok(member)
        })
    }

    pub fn list_team(&self, project_id: Uuid) -> Result<Vec<TeamMember>> {
        let conn = self.conn()?;
        fetch_project(&conn, project_id)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {MEMBER_COLUMNS} FROM team_members WHERE project_id = ?1 ORDER BY invited_at"
        ))?;
        let members = stmt
            .query_map(params![project_id.to_string()], member_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(members)
    }

    pub fn set_member_status(
        &self,
        project_id: Uuid,
        member_id: Uuid,
        status: InvitationStatus,
    ) -> Result<TeamMember> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE team_members SET status = ?1 WHERE id = ?2 AND project_id = ?3",
            params![status.as_str(), member_id.to_string(), project_id.to_string()],
        )?;
        if rows == 0 {
            return Err(Error::MemberNotFound(member_id));
        }
        fetch_member(&conn, project_id, member_id)
    }
}
