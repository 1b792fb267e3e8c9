//! Typed relations and their secondary-object membership.
//!
//! The `relation_links` join table is the single source of truth for a
//! relation's secondary set; the `secondary_object_ids` field on the DTO is
//! computed on read, ordered by the position the caller supplied. Candidate
//! ids that do not resolve to an existing object are dropped best-effort and
//! logged, never failing the write.

use std::collections::{HashMap, HashSet};

use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::warn;
use uuid::Uuid;

use super::schema::{objects, relation_links, relations};
use super::{SqlitePooledConn, Store};
use crate::domain::{RelationCreate, RelationDto, RelationUpdate};
use crate::error::{ObjectDesignError, Result};

#[derive(Queryable)]
struct RelationRow {
    id: String,
    primary_object_id: String,
    relation_type: String,
    description: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = relations)]
struct NewRelation<'a> {
    id: &'a str,
    primary_object_id: &'a str,
    relation_type: &'a str,
    description: Option<&'a str>,
}

#[derive(Insertable)]
#[diesel(table_name = relation_links)]
struct NewLink<'a> {
    relation_id: &'a str,
    object_id: &'a str,
    position: i32,
}

impl RelationRow {
    fn into_dto(self, secondary_object_ids: Vec<String>) -> RelationDto {
        RelationDto {
            id: self.id,
            primary_object_id: self.primary_object_id,
            relation_type: self.relation_type,
            description: self.description,
            secondary_object_ids,
        }
    }
}

/// Resolves the candidate ids against the object table, keeps the survivors in
/// caller order and writes fresh join rows for them. Any existing join rows
/// for the relation must already be gone.
async fn link_secondary(
    conn: &mut SqlitePooledConn<'_>,
    relation_id: &str,
    candidates: &[String],
) -> Result<Vec<String>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }

    let existing: Vec<String> = objects::table
        .filter(objects::id.eq_any(candidates))
        .select(objects::id)
        .load(conn)
        .await?;
    let existing: HashSet<String> = existing.into_iter().collect();

    let mut kept = Vec::new();
    let mut dropped = Vec::new();
    for candidate in candidates {
        if existing.contains(candidate) {
            kept.push(candidate.clone());
        } else {
            dropped.push(candidate.clone());
        }
    }
    if !dropped.is_empty() {
        warn!(relation_id, ?dropped, "dropping unresolved secondary object ids");
    }

    for (position, object_id) in kept.iter().enumerate() {
        let link = NewLink {
            relation_id,
            object_id,
            position: position as i32,
        };
        diesel::insert_into(relation_links::table)
            .values(&link)
            .execute(conn)
            .await?;
    }

    Ok(kept)
}

async fn load_secondary(conn: &mut SqlitePooledConn<'_>, relation_id: &str) -> Result<Vec<String>> {
    let ids: Vec<String> = relation_links::table
        .filter(relation_links::relation_id.eq(relation_id))
        .order(relation_links::position.asc())
        .select(relation_links::object_id)
        .load(conn)
        .await?;
    Ok(ids)
}

impl Store {
    pub async fn list_relations(&self) -> Result<Vec<RelationDto>> {
        let mut conn = self.conn().await?;
        let rows: Vec<RelationRow> = relations::table.load(&mut conn).await?;
        let links: Vec<(String, String, i32)> = relation_links::table
            .order(relation_links::position.asc())
            .select((
                relation_links::relation_id,
                relation_links::object_id,
                relation_links::position,
            ))
            .load(&mut conn)
            .await?;

        let mut by_relation: HashMap<String, Vec<String>> = HashMap::new();
        for (relation_id, object_id, _) in links {
            by_relation.entry(relation_id).or_default().push(object_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let secondary = by_relation.remove(&row.id).unwrap_or_default();
                row.into_dto(secondary)
            })
            .collect())
    }

    pub async fn get_relation(&self, relation_id: &str) -> Result<Option<RelationDto>> {
        let mut conn = self.conn().await?;
        let row: Option<RelationRow> = relations::table
            .filter(relations::id.eq(relation_id))
            .first(&mut conn)
            .await
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };
        let secondary = load_secondary(&mut conn, relation_id).await?;
        Ok(Some(row.into_dto(secondary)))
    }

    /// Relations where the given object is the primary side, filtered in the
    /// query. Secondary-side membership is not indexed for this query;
    /// callers that need it scan the secondary lists themselves.
    pub async fn get_object_relations(&self, object_id: &str) -> Result<Vec<RelationDto>> {
        let mut conn = self.conn().await?;
        let rows: Vec<RelationRow> = relations::table
            .filter(relations::primary_object_id.eq(object_id))
            .load(&mut conn)
            .await?;
        let relation_ids: Vec<&str> = rows.iter().map(|row| row.id.as_str()).collect();
        let links: Vec<(String, String)> = relation_links::table
            .filter(relation_links::relation_id.eq_any(relation_ids))
            .order(relation_links::position.asc())
            .select((relation_links::relation_id, relation_links::object_id))
            .load(&mut conn)
            .await?;

        let mut by_relation: HashMap<String, Vec<String>> = HashMap::new();
        for (relation_id, linked_id) in links {
            by_relation.entry(relation_id).or_default().push(linked_id);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let secondary = by_relation.remove(&row.id).unwrap_or_default();
                row.into_dto(secondary)
            })
            .collect())
    }

    pub async fn create_relation(&self, payload: RelationCreate) -> Result<RelationDto> {
        let id = Uuid::new_v4().to_string();
        let mut conn = self.conn().await?;

        let dto = conn
            .transaction::<_, ObjectDesignError, _>(|conn| {
                let id = id.clone();
                async move {
                    let row = NewRelation {
                        id: &id,
                        primary_object_id: &payload.primary_object_id,
                        relation_type: &payload.relation_type,
                        description: payload.description.as_deref(),
                    };
                    diesel::insert_into(relations::table)
                        .values(&row)
                        .execute(conn)
                        .await?;

                    let kept = link_secondary(conn, &id, &payload.secondary_object_ids).await?;
                    Ok(RelationDto {
                        id: id.clone(),
                        primary_object_id: payload.primary_object_id,
                        relation_type: payload.relation_type,
                        description: payload.description,
                        secondary_object_ids: kept,
                    })
                }
                .scope_boxed()
            })
            .await?;

        Ok(dto)
    }

    /// Partial update. A supplied `secondary_object_ids` is a full replace:
    /// all existing join rows are cleared before the new set is resolved and
    /// inserted. An omitted field leaves existing links untouched.
    pub async fn update_relation(
        &self,
        relation_id: &str,
        payload: RelationUpdate,
    ) -> Result<Option<RelationDto>> {
        let mut conn = self.conn().await?;
        let row: Option<RelationRow> = relations::table
            .filter(relations::id.eq(relation_id))
            .first(&mut conn)
            .await
            .optional()?;
        let Some(row) = row else {
            return Ok(None);
        };

        let primary_object_id = payload.primary_object_id.unwrap_or(row.primary_object_id);
        let relation_type = payload.relation_type.unwrap_or(row.relation_type);
        let description = match payload.description {
            Some(value) => value,
            None => row.description,
        };
        let relation_id = relation_id.to_string();

        let dto = conn
            .transaction::<_, ObjectDesignError, _>(|conn| {
                let relation_id = relation_id.clone();
                async move {
                    diesel::update(relations::table.filter(relations::id.eq(&relation_id)))
                        .set((
                            relations::primary_object_id.eq(primary_object_id.as_str()),
                            relations::relation_type.eq(relation_type.as_str()),
                            relations::description.eq(description.as_deref()),
                        ))
                        .execute(conn)
                        .await?;

                    let secondary = match payload.secondary_object_ids {
                        Some(candidates) => {
                            diesel::delete(
                                relation_links::table
                                    .filter(relation_links::relation_id.eq(&relation_id)),
                            )
                            .execute(conn)
                            .await?;
                            link_secondary(conn, &relation_id, &candidates).await?
                        }
                        None => load_secondary(conn, &relation_id).await?,
                    };

                    Ok(RelationDto {
                        id: relation_id,
                        primary_object_id,
                        relation_type,
                        description,
                        secondary_object_ids: secondary,
                    })
                }
                .scope_boxed()
            })
            .await?;

        Ok(Some(dto))
    }

    pub async fn delete_relation(&self, relation_id: &str) -> Result<bool> {
        let mut conn = self.conn().await?;
        let relation_id = relation_id.to_string();
        let deleted = conn
            .transaction::<_, ObjectDesignError, _>(|conn| {
                let relation_id = relation_id.clone();
                async move {
                    diesel::delete(
                        relation_links::table
                            .filter(relation_links::relation_id.eq(&relation_id)),
                    )
                    .execute(conn)
                    .await?;
                    let deleted =
                        diesel::delete(relations::table.filter(relations::id.eq(&relation_id)))
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
