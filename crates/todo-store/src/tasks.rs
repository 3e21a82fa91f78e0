//! Task lifecycle: create, list by owner, partial update, delete.

use chrono::Utc;
use rusqlite::params;
use todo_shared::protocol::TaskPatch;
use todo_shared::{TaskId, UserId};

use crate::database::{timestamp_column, uuid_column, Database};
use crate::error::{not_found, Result, StoreError};
use crate::models::Task;

const TASK_COLUMNS: &str = "id, owner_id, title, description, completed, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Persist a new, not yet completed task.
    pub fn create_task(&self, owner: UserId, title: &str, description: &str) -> Result<Task> {
        require_text("title", title)?;
        require_text("description", description)?;

        let now = Utc::now();
        let task = Task {
            id: TaskId::new(),
            owner,
            title: title.to_string(),
            description: description.to_string(),
            completed: false,
            created_at: now,
            updated_at: now,
        };

        self.conn().execute(
            "INSERT INTO tasks (id, owner_id, title, description, completed, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                task.id.to_string(),
                task.owner.to_string(),
                task.title,
                task.description,
                task.completed,
                task.created_at.to_rfc3339(),
                task.updated_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!(task_id = %task.id, owner = %owner, "task created");
        Ok(task)
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Every task filed under `owner`, in insertion order.
    pub fn list_tasks(&self, owner: UserId) -> Result<Vec<Task>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE owner_id = ?1 ORDER BY rowid ASC"
        ))?;

        let rows = stmt.query_map(params![owner.to_string()], row_to_task)?;

        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    pub fn get_task(&self, id: TaskId) -> Result<Task> {
        self.conn()
            .query_row(
                &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
                params![id.to_string()],
                row_to_task,
            )
            .map_err(not_found)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Apply the fields present in `patch` and return the stored result.
    ///
    /// Only supplied columns are written, so concurrent patches touching
    /// different fields both survive.
    pub fn update_task(&self, id: TaskId, patch: &TaskPatch) -> Result<Task> {
        let current = self.get_task(id)?;

        if let Some(title) = &patch.title {
            require_text("title", title)?;
        }
        if let Some(description) = &patch.description {
            require_text("description", description)?;
        }

        if patch.is_empty() {
            return Ok(current);
        }

        let affected = self.conn().execute(
            "UPDATE tasks
             SET title       = COALESCE(?2, title),
                 description = COALESCE(?3, description),
                 completed   = COALESCE(?4, completed),
                 updated_at  = ?5
             WHERE id = ?1",
            params![
                id.to_string(),
                patch.title,
                patch.description,
                patch.completed,
                Utc::now().to_rfc3339(),
            ],
        )?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        tracing::debug!(task_id = %id, "task updated");
        self.get_task(id)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    pub fn delete_task(&self, id: TaskId) -> Result<()> {
        let affected = self
            .conn()
            .execute("DELETE FROM tasks WHERE id = ?1", params![id.to_string()])?;

        if affected == 0 {
            return Err(StoreError::NotFound);
        }

        tracing::debug!(task_id = %id, "task deleted");
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{field} is required")));
    }
    Ok(())
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: TaskId(uuid_column(row, 0)?),
        owner: UserId(uuid_column(row, 1)?),
        title: row.get(2)?,
        description: row.get(3)?,
        completed: row.get(4)?,
        created_at: timestamp_column(row, 5)?,
        updated_at: timestamp_column(row, 6)?,
    })
}
