//! The three type catalogs: object types, relation types and hierarchy types.
//!
//! Catalog entries are vocabulary, not enforced foreign keys: deleting an
//! object type does not touch objects already tagged with that kind, and a
//! relation type's declared (primary, secondary) pair is not checked against
//! relation writes.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use serde_json::json;

use super::schema::{hierarchy_types, object_types, relation_types};
use super::{from_json_text, to_json_text, RowId, Store};
use crate::domain::{
    HierarchyTypeCreate, HierarchyTypeDto, HierarchyTypeUpdate, ObjectTypeCreate, ObjectTypeDto,
    ObjectTypeUpdate, RelationTypeCreate, RelationTypeDto, RelationTypeUpdate,
};
use crate::error::Result;

#[derive(Queryable)]
struct ObjectTypeRow {
    id: i32,
    object_type: String,
    parent_id: Option<i32>,
    description: Option<String>,
    attributes: String,
    tables: String,
}

#[derive(Insertable)]
#[diesel(table_name = object_types)]
struct NewObjectType<'a> {
    object_type: &'a str,
    parent_id: Option<i32>,
    description: Option<&'a str>,
    attributes: &'a str,
    tables: &'a str,
}

#[derive(Queryable)]
struct HierarchyTypeRow {
    id: i32,
    object_type: i32,
    inventory: String,
    purchase: String,
}

#[derive(Insertable)]
#[diesel(table_name = hierarchy_types)]
struct NewHierarchyType<'a> {
    object_type: i32,
    inventory: &'a str,
    purchase: &'a str,
}

#[derive(Insertable)]
#[diesel(table_name = relation_types)]
struct NewRelationType<'a> {
    name: &'a str,
    primary_type: i32,
    secondary_type: i32,
}

impl ObjectTypeRow {
    fn into_dto(self) -> ObjectTypeDto {
        ObjectTypeDto {
            id: self.id,
            object_type: self.object_type,
            parent_id: self.parent_id,
            description: self.description,
            attributes: from_json_text(&self.attributes, json!({})),
            tables: from_json_text(&self.tables, json!([])),
        }
    }
}

impl HierarchyTypeRow {
    fn into_dto(self) -> HierarchyTypeDto {
        HierarchyTypeDto {
            id: self.id,
            object_type: self.object_type,
            inventory: from_json_text(&self.inventory, json!([])),
            purchase: from_json_text(&self.purchase, json!([])),
        }
    }
}

impl Store {
    async fn last_rowid(conn: &mut super::SqlitePooledConn<'_>) -> Result<i32> {
        let row: RowId = diesel::sql_query("SELECT last_insert_rowid() as id")
            .get_result(conn)
            .await?;
        Ok(row.id as i32)
    }

    pub async fn list_object_types(&self) -> Result<Vec<ObjectTypeDto>> {
        let mut conn = self.conn().await?;
        let rows: Vec<ObjectTypeRow> = object_types::table
            .order(object_types::id.asc())
            .load(&mut conn)
            .await?;
        Ok(rows.into_iter().map(ObjectTypeRow::into_dto).collect())
    }

    pub async fn get_object_type(&self, type_id: i32) -> Result<Option<ObjectTypeDto>> {
        let mut conn = self.conn().await?;
        let row: Option<ObjectTypeRow> = object_types::table
            .filter(object_types::id.eq(type_id))
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row.map(ObjectTypeRow::into_dto))
    }

    pub async fn create_object_type(&self, payload: ObjectTypeCreate) -> Result<ObjectTypeDto> {
        let attributes = to_json_text(&payload.attributes.unwrap_or_else(|| json!({})))?;
        let tables = to_json_text(&payload.tables.unwrap_or_else(|| json!([])))?;
        let row = NewObjectType {
            object_type: &payload.object_type,
            parent_id: payload.parent_id,
            description: payload.description.as_deref(),
            attributes: &attributes,
            tables: &tables,
        };

        let mut conn = self.conn().await?;
        diesel::insert_into(object_types::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        let id = Self::last_rowid(&mut conn).await?;

        Ok(ObjectTypeDto {
            id,
            object_type: payload.object_type,
            parent_id: payload.parent_id,
            description: payload.description,
            attributes: from_json_text(&attributes, json!({})),
            tables: from_json_text(&tables, json!([])),
        })
    }

    pub async fn update_object_type(
        &self,
        type_id: i32,
        payload: ObjectTypeUpdate,
    ) -> Result<Option<ObjectTypeDto>> {
        let mut conn = self.conn().await?;
        let row: Option<ObjectTypeRow> = object_types::table
            .filter(object_types::id.eq(type_id))
            .first(&mut conn)
            .await
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };

        let object_type = payload.object_type.unwrap_or(row.object_type);
        let parent_id = match payload.parent_id {
            Some(value) => value,
            None => row.parent_id,
        };
        let description = match payload.description {
            Some(value) => value,
            None => row.description,
        };
        let attributes = match payload.attributes {
            Some(value) => to_json_text(&value)?,
            None => row.attributes,
        };
        let tables = match payload.tables {
            Some(value) => to_json_text(&value)?,
            None => row.tables,
        };

        diesel::update(object_types::table.filter(object_types::id.eq(type_id)))
            .set((
                object_types::object_type.eq(object_type.as_str()),
                object_types::parent_id.eq(parent_id),
                object_types::description.eq(description.as_deref()),
                object_types::attributes.eq(attributes.as_str()),
                object_types::tables.eq(tables.as_str()),
            ))
            .execute(&mut conn)
            .await?;

        Ok(Some(ObjectTypeDto {
            id: type_id,
            object_type,
            parent_id,
            description,
            attributes: from_json_text(&attributes, json!({})),
            tables: from_json_text(&tables, json!([])),
        }))
    }

    pub async fn delete_object_type(&self, type_id: i32) -> Result<bool> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(object_types::table.filter(object_types::id.eq(type_id)))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    pub async fn list_relation_types(&self) -> Result<Vec<RelationTypeDto>> {
        let mut conn = self.conn().await?;
        let rows: Vec<(i32, String, i32, i32)> = relation_types::table
            .order(relation_types::id.asc())
            .load(&mut conn)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name, primary_type, secondary_type)| RelationTypeDto {
                id,
                name,
                primary_type,
                secondary_type,
            })
            .collect())
    }

    pub async fn get_relation_type(&self, type_id: i32) -> Result<Option<RelationTypeDto>> {
        let mut conn = self.conn().await?;
        let row: Option<(i32, String, i32, i32)> = relation_types::table
            .filter(relation_types::id.eq(type_id))
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row.map(|(id, name, primary_type, secondary_type)| RelationTypeDto {
            id,
            name,
            primary_type,
            secondary_type,
        }))
    }

    pub async fn create_relation_type(
        &self,
        payload: RelationTypeCreate,
    ) -> Result<RelationTypeDto> {
        let row = NewRelationType {
            name: &payload.name,
            primary_type: payload.primary_type,
            secondary_type: payload.secondary_type,
        };

        let mut conn = self.conn().await?;
        diesel::insert_into(relation_types::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        let id = Self::last_rowid(&mut conn).await?;

        Ok(RelationTypeDto {
            id,
            name: payload.name,
            primary_type: payload.primary_type,
            secondary_type: payload.secondary_type,
        })
    }

    pub async fn update_relation_type(
        &self,
        type_id: i32,
        payload: RelationTypeUpdate,
    ) -> Result<Option<RelationTypeDto>> {
        let Some(existing) = self.get_relation_type(type_id).await? else {
            return Ok(None);
        };

        let name = payload.name.unwrap_or(existing.name);
        let primary_type = payload.primary_type.unwrap_or(existing.primary_type);
        let secondary_type = payload.secondary_type.unwrap_or(existing.secondary_type);

        let mut conn = self.conn().await?;
        diesel::update(relation_types::table.filter(relation_types::id.eq(type_id)))
            .set((
                relation_types::name.eq(name.as_str()),
                relation_types::primary_type.eq(primary_type),
                relation_types::secondary_type.eq(secondary_type),
            ))
            .execute(&mut conn)
            .await?;

        Ok(Some(RelationTypeDto {
            id: type_id,
            name,
            primary_type,
            secondary_type,
        }))
    }

    pub async fn delete_relation_type(&self, type_id: i32) -> Result<bool> {
        let mut conn = self.conn().await?;
        let deleted = diesel::delete(relation_types::table.filter(relation_types::id.eq(type_id)))
            .execute(&mut conn)
            .await?;
        Ok(deleted > 0)
    }

    pub async fn list_hierarchy_types(&self) -> Result<Vec<HierarchyTypeDto>> {
        let mut conn = self.conn().await?;
        let rows: Vec<HierarchyTypeRow> = hierarchy_types::table
            .order(hierarchy_types::id.asc())
            .load(&mut conn)
            .await?;
        Ok(rows.into_iter().map(HierarchyTypeRow::into_dto).collect())
    }

    pub async fn get_hierarchy_type(&self, type_id: i32) -> Result<Option<HierarchyTypeDto>> {
        let mut conn = self.conn().await?;
        let row: Option<HierarchyTypeRow> = hierarchy_types::table
            .filter(hierarchy_types::id.eq(type_id))
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row.map(HierarchyTypeRow::into_dto))
    }

    pub async fn create_hierarchy_type(
        &self,
        payload: HierarchyTypeCreate,
    ) -> Result<HierarchyTypeDto> {
        let inventory = to_json_text(&payload.inventory.unwrap_or_else(|| json!([])))?;
        let purchase = to_json_text(&payload.purchase.unwrap_or_else(|| json!([])))?;
        let row = NewHierarchyType {
            object_type: payload.object_type,
            inventory: &inventory,
            purchase: &purchase,
        };

        let mut conn = self.conn().await?;
        diesel::insert_into(hierarchy_types::table)
            .values(&row)
            .execute(&mut conn)
            .await?;
        let id = Self::last_rowid(&mut conn).await?;

        Ok(HierarchyTypeDto {
            id,
            object_type: payload.object_type,
            inventory: from_json_text(&inventory, json!([])),
            purchase: from_json_text(&purchase, json!([])),
        })
    }

    pub async fn update_hierarchy_type(
        &self,
        type_id: i32,
        payload: HierarchyTypeUpdate,
    ) -> Result<Option<HierarchyTypeDto>> {
        let mut conn = self.conn().await?;
        let row: Option<HierarchyTypeRow> = hierarchy_types::table
            .filter(hierarchy_types::id.eq(type_id))
            .first(&mut conn)
            .await
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };

        let object_type = payload.object_type.unwrap_or(row.object_type);
        let inventory = match payload.inventory {
            Some(value) => to_json_text(&value)?,
            None => row.inventory,
        };
        let purchase = match payload.purchase {
            Some(value) => to_json_text(&value)?,
            None => row.purchase,
        };

        diesel::update(hierarchy_types::table.filter(hierarchy_types::id.eq(type_id)))
            .set((
                hierarchy_types::object_type.eq(object_type),
                hierarchy_types::inventory.eq(inventory.as_str()),
                hierarchy_types::purchase.eq(purchase.as_str()),
            ))
            .execute(&mut conn)
            .await?;

        Ok(Some(HierarchyTypeDto {
            id: type_id,
            object_type,
            inventory: from_json_text(&inventory, json!([])),
            purchase: from_json_text(&purchase, json!([])),
        }))
    }

    pub async fn delete_hierarchy_type(&self, type_id: i32) -> Result<bool> {
        let mut conn = self.conn().await?;
        let deleted =
            diesel::delete(hierarchy_types::table.filter(hierarchy_types::id.eq(type_id)))
                .execute(&mut conn)
                .await?;
        Ok(deleted > 0)
    }
}
