use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use super::schema::users;
use super::Store;
use crate::domain::UserDto;
use crate::error::Result;

#[derive(Queryable)]
pub(crate) struct UserRow {
    pub(crate) id: String,
    pub(crate) username: String,
    pub(crate) password_hash: String,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
struct NewUser<'a> {
    id: &'a str,
    username: &'a str,
    password_hash: &'a str,
}

impl UserRow {
    pub(crate) fn into_dto(self) -> UserDto {
        UserDto {
            id: self.id,
            username: self.username,
        }
    }
}

impl Store {
    pub(crate) async fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        let mut conn = self.conn().await?;
        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username))
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserDto>> {
        let mut conn = self.conn().await?;
        let row: Option<UserRow> = users::table
            .filter(users::id.eq(user_id))
            .first(&mut conn)
            .await
            .optional()?;
        Ok(row.map(UserRow::into_dto))
    }

    pub(crate) async fn create_user(&self, username: &str, password_hash: &str) -> Result<UserDto> {
        let id = Uuid::new_v4().to_string();
        let row = NewUser {
            id: &id,
            username,
            password_hash,
        };

        let mut conn = self.conn().await?;
        diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await?;

        Ok(UserDto {
            id,
            username: username.to_string(),
        })
    }
}
