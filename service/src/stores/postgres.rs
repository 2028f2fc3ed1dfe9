//! PostgreSQL repository implementations.
//!
//! Persistent storage for requests, users, and user roles. Queries use
//! the runtime API so the crate builds without a live `DATABASE_URL`;
//! the stage update is a single-row compare-and-swap so two racing
//! transitions can never both apply.
//!
//! # Example
//!
//! ```no_run
//! use request_service::stores::postgres::PostgresRequestRepository;
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/requests").await?;
//! let repo = PostgresRequestRepository::new(pool);
//! repo.migrate().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{RequestError, Result};
use crate::providers::{PageRequest, RequestRepository, SortOrder, UserRepository};
use crate::state::{Request, RequestId, Role, Stage, User, UserId};
use chrono::NaiveDate;
use sqlx::PgPool;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;

const REQUEST_COLUMNS: &str = "id, created_at, user_id, stage, description";

const fn direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Ascending => "ASC",
        SortOrder::Descending => "DESC",
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RequestRow {
    id: i64,
    created_at: NaiveDate,
    user_id: i64,
    stage: String,
    description: String,
}

impl RequestRow {
    fn into_request(self) -> Result<Request> {
        let stage = Stage::from_token(&self.stage).ok_or_else(|| {
            RequestError::Database(format!("Unknown stage token in store: {}", self.stage))
        })?;
        Ok(Request {
            id: RequestId(self.id),
            created_at: self.created_at,
            owner_user_id: UserId(self.user_id),
            stage,
            description: self.description,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    login: String,
    name: String,
    surname: String,
}

#[derive(Debug, sqlx::FromRow)]
struct UserRoleRow {
    user_id: i64,
    role: String,
}

fn parse_role(token: &str) -> Result<Role> {
    Role::from_token(token)
        .ok_or_else(|| RequestError::Database(format!("Unknown role token in store: {token}")))
}

fn rows_into_requests(rows: Vec<RequestRow>) -> Result<Vec<Request>> {
    rows.into_iter().map(RequestRow::into_request).collect()
}

/// PostgreSQL request repository.
#[derive(Clone)]
pub struct PostgresRequestRepository {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresRequestRepository {
    /// Create a new PostgreSQL request repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RequestError::Database(format!("Migration failed: {e}")))?;
        Ok(())
    }
}

impl RequestRepository for PostgresRequestRepository {
    fn find_by_id(&self, id: RequestId) -> impl Future<Output = Result<Request>> + Send {
        async move {
            let sql = format!("SELECT {REQUEST_COLUMNS} FROM requests WHERE id = $1");
            sqlx::query_as::<_, RequestRow>(&sql)
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RequestError::Database(format!("Failed to get request: {e}")))?
                .ok_or(RequestError::request_not_found(id))?
                .into_request()
        }
    }

    fn insert(
        &self,
        owner: UserId,
        created_at: NaiveDate,
        description: &str,
    ) -> impl Future<Output = Result<Request>> + Send {
        async move {
            let sql = format!(
                "INSERT INTO requests (created_at, user_id, stage, description) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING {REQUEST_COLUMNS}"
            );
            sqlx::query_as::<_, RequestRow>(&sql)
                .bind(created_at)
                .bind(owner.0)
                .bind(Stage::Draft.as_str())
                .bind(description)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    // A dangling owner reference surfaces as an FK violation.
                    if let sqlx::Error::Database(db_err) = &e {
                        if db_err.is_foreign_key_violation() {
                            return RequestError::IdentifierMismatch(format!(
                                "User with ID {owner} not found"
                            ));
                        }
                    }
                    RequestError::Database(format!("Failed to create request: {e}"))
                })?
                .into_request()
        }
    }

    fn update_description(
        &self,
        id: RequestId,
        description: &str,
    ) -> impl Future<Output = Result<Request>> + Send {
        async move {
            let sql = format!(
                "UPDATE requests SET description = $2 WHERE id = $1 RETURNING {REQUEST_COLUMNS}"
            );
            sqlx::query_as::<_, RequestRow>(&sql)
                .bind(id.0)
                .bind(description)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    RequestError::Database(format!("Failed to update description: {e}"))
                })?
                .ok_or(RequestError::request_not_found(id))?
                .into_request()
        }
    }

    fn update_stage(
        &self,
        id: RequestId,
        from: Stage,
        to: Stage,
    ) -> impl Future<Output = Result<Option<Request>>> + Send {
        async move {
            // Compare-and-swap: the row updates only if the stored
            // stage still equals `from`. Zero rows means the request is
            // gone or another call won the race.
            let sql = format!(
                "UPDATE requests SET stage = $3 WHERE id = $1 AND stage = $2 \
                 RETURNING {REQUEST_COLUMNS}"
            );
            let row = sqlx::query_as::<_, RequestRow>(&sql)
                .bind(id.0)
                .bind(from.as_str())
                .bind(to.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| RequestError::Database(format!("Failed to update stage: {e}")))?;

            row.map(RequestRow::into_request).transpose()
        }
    }

    fn list_by_owner(
        &self,
        owner: UserId,
        order: SortOrder,
        page: PageRequest,
    ) -> impl Future<Output = Result<Vec<Request>>> + Send {
        async move {
            let dir = direction(order);
            let sql = format!(
                "SELECT {REQUEST_COLUMNS} FROM requests WHERE user_id = $1 \
                 ORDER BY created_at {dir}, id {dir} LIMIT $2 OFFSET $3"
            );
            let rows = sqlx::query_as::<_, RequestRow>(&sql)
                .bind(owner.0)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RequestError::Database(format!("Failed to list requests: {e}")))?;
            rows_into_requests(rows)
        }
    }

    fn list_by_stage(
        &self,
        stage: Stage,
        order: SortOrder,
        page: PageRequest,
    ) -> impl Future<Output = Result<Vec<Request>>> + Send {
        async move {
            let dir = direction(order);
            let sql = format!(
                "SELECT {REQUEST_COLUMNS} FROM requests WHERE stage = $1 \
                 ORDER BY created_at {dir}, id {dir} LIMIT $2 OFFSET $3"
            );
            let rows = sqlx::query_as::<_, RequestRow>(&sql)
                .bind(stage.as_str())
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| RequestError::Database(format!("Failed to list requests: {e}")))?;
            rows_into_requests(rows)
        }
    }

    fn list_by_owner_name(
        &self,
        name_part1: &str,
        name_part2: &str,
        order: SortOrder,
        page: PageRequest,
    ) -> impl Future<Output = Result<Vec<Request>>> + Send {
        async move {
            let dir = direction(order);
            let sql = format!(
                "SELECT r.id, r.created_at, r.user_id, r.stage, r.description \
                 FROM requests r JOIN users u ON u.id = r.user_id \
                 WHERE (u.name = $1 AND u.surname = $2) OR (u.name = $2 AND u.surname = $1) \
                 ORDER BY r.created_at {dir}, r.id {dir} LIMIT $3 OFFSET $4"
            );
            let rows = sqlx::query_as::<_, RequestRow>(&sql)
                .bind(name_part1)
                .bind(name_part2)
                .bind(page.limit())
                .bind(page.offset())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    RequestError::Database(format!("Failed to search requests by name: {e}"))
                })?;
            rows_into_requests(rows)
        }
    }
}

/// PostgreSQL user repository.
#[derive(Clone)]
pub struct PostgresUserRepository {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new PostgreSQL user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn roles_for(&self, ids: &[i64]) -> Result<HashMap<i64, BTreeSet<Role>>> {
        let rows = sqlx::query_as::<_, UserRoleRow>(
            "SELECT user_id, role FROM user_roles WHERE user_id = ANY($1)",
        )
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RequestError::Database(format!("Failed to load roles: {e}")))?;

        let mut grouped: HashMap<i64, BTreeSet<Role>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.user_id)
                .or_default()
                .insert(parse_role(&row.role)?);
        }
        Ok(grouped)
    }

    fn assemble(rows: Vec<UserRow>, mut roles: HashMap<i64, BTreeSet<Role>>) -> Vec<User> {
        rows.into_iter()
            .map(|row| User {
                id: UserId(row.id),
                login: row.login,
                name: row.name,
                surname: row.surname,
                roles: roles.remove(&row.id).unwrap_or_default(),
            })
            .collect()
    }
}

impl UserRepository for PostgresUserRepository {
    fn find_by_id(&self, id: UserId) -> impl Future<Output = Result<User>> + Send {
        async move {
            let row = sqlx::query_as::<_, UserRow>(
                "SELECT id, login, name, surname FROM users WHERE id = $1",
            )
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RequestError::Database(format!("Failed to get user: {e}")))?
            .ok_or(RequestError::user_not_found(id))?;

            let mut roles = self.roles_for(&[row.id]).await?;
            Ok(User {
                id: UserId(row.id),
                login: row.login,
                name: row.name,
                surname: row.surname,
                roles: roles.remove(&row.id).unwrap_or_default(),
            })
        }
    }

    fn list_all(&self) -> impl Future<Output = Result<Vec<User>>> + Send {
        async move {
            let rows = sqlx::query_as::<_, UserRow>(
                "SELECT id, login, name, surname FROM users ORDER BY id",
            )
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RequestError::Database(format!("Failed to list users: {e}")))?;

            let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
            let roles = self.roles_for(&ids).await?;
            Ok(Self::assemble(rows, roles))
        }
    }

    fn find_by_name(
        &self,
        name_part1: &str,
        name_part2: &str,
    ) -> impl Future<Output = Result<Vec<User>>> + Send {
        async move {
            let rows = sqlx::query_as::<_, UserRow>(
                "SELECT id, login, name, surname FROM users \
                 WHERE (name = $1 AND surname = $2) OR (name = $2 AND surname = $1) \
                 ORDER BY id",
            )
            .bind(name_part1)
            .bind(name_part2)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                RequestError::Database(format!("Failed to search users by name: {e}"))
            })?;

            let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
            let roles = self.roles_for(&ids).await?;
            Ok(Self::assemble(rows, roles))
        }
    }

    fn add_role(&self, id: UserId, role: Role) -> impl Future<Output = Result<User>> + Send {
        async move {
            // ON CONFLICT DO NOTHING makes promotion idempotent: the
            // role set contains each role at most once. Zero affected
            // rows is ambiguous between "unknown user" and "role
            // already held"; the follow-up read settles both.
            sqlx::query(
                "INSERT INTO user_roles (user_id, role) \
                 SELECT id, $2 FROM users WHERE id = $1 \
                 ON CONFLICT DO NOTHING",
            )
            .bind(id.0)
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| RequestError::Database(format!("Failed to add role: {e}")))?;

            self.find_by_id(id).await
        }
    }
}
