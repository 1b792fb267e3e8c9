use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use serde_json::json;
use uuid::Uuid;

use super::schema::{objects, relation_links};
use super::{format_ts, from_json_text, now_ts, to_json_text, Store};
use crate::domain::{ObjectCreate, ObjectDto, ObjectUpdate};
use crate::error::{ObjectDesignError, Result};

#[derive(Queryable)]
pub(crate) struct ObjectRow {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) kind: String,
    pub(crate) attributes: String,
    pub(crate) tables: String,
    pub(crate) created_at: i64,
    pub(crate) modified_at: i64,
    pub(crate) revision: i32,
}

#[derive(Insertable)]
#[diesel(table_name = objects)]
struct NewObject<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    kind: &'a str,
    attributes: &'a str,
    tables: &'a str,
    created_at: i64,
    modified_at: i64,
    revision: i32,
}

impl ObjectRow {
    pub(crate) fn into_dto(self) -> ObjectDto {
        ObjectDto {
            id: self.id,
            name: self.name,
            description: self.description,
            kind: self.kind,
            attributes: from_json_text(&self.attributes, json!({})),
            tables: from_json_text(&self.tables, json!([])),
            created_date: format_ts(self.created_at),
            modified_date: format_ts(self.modified_at),
            revision: self.revision,
        }
    }
}

impl Store {
    pub async fn list_objects(&self) -> Result<Vec<ObjectDto>> {
        let mut conn = self.conn().await?;
        let rows: Vec<ObjectRow> = objects::table
            .order(objects::created_at.asc())
            .load(&mut conn)
            .await?;
        Ok(rows.into_iter().map(ObjectRow::into_dto).collect())
    }

    pub async fn get_object(&self, object_id: &str) -> Result<Option<ObjectDto>> {
        let mut conn = self.conn().await?;
        let row: Option<ObjectRow> = objects::table
            .filter(objects::id.eq(object_id))
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row.map(ObjectRow::into_dto))
    }

    pub async fn create_object(&self, payload: ObjectCreate) -> Result<ObjectDto> {
        let id = Uuid::new_v4().to_string();
        let now = now_ts();
        let attributes = to_json_text(&payload.attributes.unwrap_or_else(|| json!({})))?;
        let tables = to_json_text(&payload.tables.unwrap_or_else(|| json!([])))?;

        let row = NewObject {
            id: &id,
            name: &payload.name,
            description: &payload.description,
            kind: &payload.kind,
            attributes: &attributes,
            tables: &tables,
            created_at: now,
            modified_at: now,
            revision: 1,
        };

        let mut conn = self.conn().await?;
        diesel::insert_into(objects::table)
            .values(&row)
            .execute(&mut conn)
            .await?;

        self.get_object(&id)
            .await?
            .ok_or_else(|| ObjectDesignError::Runtime("object vanished after insert".to_string()))
    }

    /// Partial update. Every successful update bumps `revision` by exactly 1
    /// and restamps `modified_at`, even when the payload changes nothing else.
    /// A stale `revision` fencing token in the payload is rejected as a
    /// conflict instead of silently overwriting a newer edit.
    pub async fn update_object(
        &self,
        object_id: &str,
        payload: ObjectUpdate,
    ) -> Result<Option<ObjectDto>> {
        let mut conn = self.conn().await?;
        let row: Option<ObjectRow> = objects::table
            .filter(objects::id.eq(object_id))
            .first(&mut conn)
            .await
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };

        if let Some(expected) = payload.revision {
            if expected != row.revision {
                return Err(ObjectDesignError::Conflict(format!(
                    "object revision is {}, caller expected {}",
                    row.revision, expected
                )));
            }
        }

        let name = payload.name.unwrap_or(row.name);
        let description = payload.description.unwrap_or(row.description);
        let kind = payload.kind.unwrap_or(row.kind);
        let attributes = match payload.attributes {
            Some(value) => to_json_text(&value)?,
            None => row.attributes,
        };
        let tables = match payload.tables {
            Some(value) => to_json_text(&value)?,
            None => row.tables,
        };

        diesel::update(objects::table.filter(objects::id.eq(object_id)))
            .set((
                objects::name.eq(name),
                objects::description.eq(description),
                objects::kind.eq(kind),
                objects::attributes.eq(attributes),
                objects::tables.eq(tables),
                objects::modified_at.eq(now_ts()),
                objects::revision.eq(row.revision + 1),
            ))
            .execute(&mut conn)
            .await?;

        self.get_object(object_id).await
    }

    /// Deletes the object and any relation join rows that reference it as a
    /// secondary member, in one transaction so a fault cannot strand join
    /// rows pointing at a deleted object. Relation and hierarchy rows
    /// themselves are left alone; dangling ids there are allowed and
    /// observable.
    pub async fn delete_object(&self, object_id: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        let object_id = object_id.to_string();
        let deleted = conn
            .transaction::<_, ObjectDesignError, _>(|conn| {
                let object_id = object_id.clone();
                async move {
                    diesel::delete(
                        relation_links::table
                            .filter(relation_links::object_id.eq(&object_id)),
                    )
                    .execute(conn)
                    .await?;
                    let deleted =
                        diesel::delete(objects::table.filter(objects::id.eq(&object_id)))
                            .execute(conn)
                            .await?;
                    Ok(deleted > 0)
                }
                .scope_boxed()
            })
            .await?;
        Ok(deleted)
    }
}
