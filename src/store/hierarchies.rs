//! Parent/child adjacency rows. Deliberately not a verified tree: no cycle
//! detection, no single-parent rule, and dangling object ids are allowed.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::json;
use uuid::Uuid;

use super::schema::hierarchies;
use super::{from_json_text, to_json_text, Store};
use crate::domain::{HierarchyCreate, HierarchyDto, HierarchyUpdate};
use crate::error::Result;

#[derive(Queryable)]
struct HierarchyRow {
    id: String,
    parent_object_id: Option<String>,
    child_object_ids: String,
    level: i32,
    properties: String,
}

#[derive(Insertable)]
#[diesel(table_name = hierarchies)]
struct NewHierarchy<'a> {
    id: &'a str,
    parent_object_id: Option<&'a str>,
    child_object_ids: &'a str,
    level: i32,
    properties: &'a str,
}

fn children_from_text(text: &str) -> Vec<String> {
    serde_json::from_str(text).unwrap_or_default()
}

impl HierarchyRow {
    fn into_dto(self) -> HierarchyDto {
        HierarchyDto {
            id: self.id,
            parent_object_id: self.parent_object_id,
            child_object_ids: children_from_text(&self.child_object_ids),
            level: self.level,
            properties: from_json_text(&self.properties, json!({})),
        }
    }
}

impl Store {
    pub async fn list_hierarchies(&self) -> Result<Vec<HierarchyDto>> {
        let mut conn = self.conn().await?;
        let rows: Vec<HierarchyRow> = hierarchies::table.load(&mut conn).await?;
        Ok(rows.into_iter().map(HierarchyRow::into_dto).collect())
    }

    pub async fn get_hierarchy(&self, hierarchy_id: &str) -> Result<Option<HierarchyDto>> {
        let mut conn = self.conn().await?;
        let row: Option<HierarchyRow> = hierarchies::table
            .filter(hierarchies::id.eq(hierarchy_id))
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row.map(HierarchyRow::into_dto))
    }

    /// Rows whose parent is the given object, i.e. a "children of" query.
    /// Rows that reference the object only inside a child list are not
    /// matched here.
    pub async fn get_object_hierarchy(&self, object_id: &str) -> Result<Vec<HierarchyDto>> {
        let mut conn = self.conn().await?;
        let rows: Vec<HierarchyRow> = hierarchies::table
            .filter(hierarchies::parent_object_id.eq(object_id))
            .load(&mut conn)
            .await?;
        Ok(rows.into_iter().map(HierarchyRow::into_dto).collect())
    }

    pub async fn create_hierarchy(&self, payload: HierarchyCreate) -> Result<HierarchyDto> {
        let id = Uuid::new_v4().to_string();
        let children = serde_json::to_string(&payload.child_object_ids)?;
        let properties = to_json_text(&payload.properties.unwrap_or_else(|| json!({})))?;

        let row = NewHierarchy {
            id: &id,
            parent_object_id: payload.parent_object_id.as_deref(),
            child_object_ids: &children,
            level: payload.level,
            properties: &properties,
        };

        let mut conn = self.conn().await?;
        diesel::insert_into(hierarchies::table)
            .values(&row)
            .execute(&mut conn)
            .await?;

        Ok(HierarchyDto {
            id,
            parent_object_id: payload.parent_object_id,
            child_object_ids: payload.child_object_ids,
            level: payload.level,
            properties: from_json_text(&properties, json!({})),
        })
    }

    pub async fn update_hierarchy(
        &self,
        hierarchy_id: &str,
        payload: HierarchyUpdate,
    ) -> Result<Option<HierarchyDto>> {
        let mut conn = self.conn().await?;
        let row: Option<HierarchyRow> = hierarchies::table
            .filter(hierarchies::id.eq(hierarchy_id))
            .first(&mut conn)
            .await
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };

        let parent_object_id = match payload.parent_object_id {
            Some(value) => value,
            None => row.parent_object_id,
        };
        let children = match payload.child_object_ids {
            Some(value) => serde_json::to_string(&value)?,
            None => row.child_object_ids,
        };
        let level = payload.level.unwrap_or(row.level);
        let properties = match payload.properties {
            Some(value) => to_json_text(&value)?,
            None => row.properties,
        };

        diesel::update(hierarchies::table.filter(hierarchies::id.eq(hierarchy_id)))
            .set((
                hierarchies::parent_object_id.eq(parent_object_id.as_deref()),
                hierarchies::child_object_ids.eq(children.as_str()),
                hierarchies::level.eq(level),
                hierarchies::properties.eq(properties.as_str()),
            ))
            .execute(&mut conn)
            .await?;

        Ok(Some(HierarchyDto {
            id: hierarchy_id.to_string(),
            parent_object_id,
            child_object_ids: children_from_text(&children),
            level,
            properties: from_json_text(&properties, json!({})),
        }))
    }

    pub async fn delete_hierarchy(&self, hierarchy_id: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(hierarchies::table.filter(hierarchies::id.eq(hierarchy_id)))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }
}
