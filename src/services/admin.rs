//! User and group administration.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::auth::groups::{permissions_for, ADMIN_GROUP, STANDARD_GROUP};
use crate::db::DbPool;
use crate::entities::{group, user, user_group};
use crate::errors::ServiceError;

/// A user together with the names of the groups they belong to
#[derive(Debug, Clone, Serialize)]
pub struct UserWithGroups {
    #[serde(flatten)]
    pub user: user::Model,
    pub groups: Vec<String>,
}

/// A group with its static permission list and member count
#[derive(Debug, Clone, Serialize)]
pub struct GroupWithPermissions {
    pub id: i32,
    pub name: String,
    pub permissions: Vec<String>,
    pub member_count: u64,
}

#[derive(Clone)]
pub struct AdminService {
    db_pool: Arc<DbPool>,
}

impl AdminService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Every user with their group memberships, ordered by username.
    pub async fn list_users(&self) -> Result<Vec<UserWithGroups>, ServiceError> {
        let users = user::Entity::find()
            .find_with_related(group::Entity)
            .all(&*self.db_pool)
            .await?;

        let mut listed: Vec<UserWithGroups> = users
            .into_iter()
            .map(|(user, groups)| UserWithGroups {
                user,
                groups: groups.into_iter().map(|g| g.name).collect(),
            })
            .collect();
        listed.sort_by(|a, b| a.user.username.cmp(&b.user.username));

        Ok(listed)
    }

    /// Every group with its permission list and member count.
    pub async fn list_groups(&self) -> Result<Vec<GroupWithPermissions>, ServiceError> {
        let groups = group::Entity::find().all(&*self.db_pool).await?;

        let mut listed = Vec::with_capacity(groups.len());
        for g in groups {
            let member_count = user_group::Entity::find()
                .filter(user_group::Column::GroupId.eq(g.id))
                .count(&*self.db_pool)
                .await?;
            listed.push(GroupWithPermissions {
                id: g.id,
                name: g.name.clone(),
                permissions: permissions_for(&g.name).to_vec(),
                member_count,
            });
        }
        listed.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(listed)
    }

    /// Creates the built-in groups and two bootstrap accounts when the
    /// user table is empty. Safe to call on every startup.
    pub async fn seed_defaults(&self) -> Result<(), ServiceError> {
        let admin_group = self.group_by_name_or_create(ADMIN_GROUP).await?;
        let standard_group = self.group_by_name_or_create(STANDARD_GROUP).await?;

        let user_count = user::Entity::find().count(&*self.db_pool).await?;
        if user_count > 0 {
            return Ok(());
        }

        let admin = self
            .create_user("admin_test", "admin_test@example.com", "Admin@123", false)
            .await?;
        self.add_to_group(&admin, admin_group.id).await?;

        let standard = self
            .create_user("user_test", "user_test@example.com", "User@123", false)
            .await?;
        self.add_to_group(&standard, standard_group.id).await?;

        info!("seeded default groups and bootstrap accounts");
        Ok(())
    }

    /// Creates a user with a freshly hashed password.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        is_superuser: bool,
    ) -> Result<user::Model, ServiceError> {
        let hash = hash_password(password)?;

        let created = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(hash),
            is_superuser: Set(is_superuser),
            is_active: Set(true),
            created_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await?;

        Ok(created)
    }

    /// Adds a user to a group, ignoring an existing membership.
    pub async fn add_to_group(
        &self,
        user: &user::Model,
        group_id: i32,
    ) -> Result<(), ServiceError> {
        let existing = user_group::Entity::find()
            .filter(user_group::Column::UserId.eq(user.id))
            .filter(user_group::Column::GroupId.eq(group_id))
            .one(&*self.db_pool)
            .await?;
        if existing.is_some() {
            return Ok(());
        }

        user_group::ActiveModel {
            user_id: Set(user.id),
            group_id: Set(group_id),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        Ok(())
    }

    async fn group_by_name_or_create(&self, name: &str) -> Result<group::Model, ServiceError> {
        if let Some(existing) = group::Entity::find()
            .filter(group::Column::Name.eq(name))
            .one(&*self.db_pool)
            .await?
        {
            return Ok(existing);
        }

        let created = group::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&*self.db_pool)
        .await?;

        Ok(created)
    }
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ServiceError::InternalError(format!("password hashing failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::{PasswordHash, PasswordVerifier};

    #[test]
    fn hashed_password_verifies() {
        let hash = hash_password("Admin@123").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"Admin@123", &parsed)
            .is_ok());
        assert!(Argon2::default()
            .verify_password(b"wrong", &parsed)
            .is_err());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same").unwrap();
        let b = hash_password("same").unwrap();
        assert_ne!(a, b);
    }
}
