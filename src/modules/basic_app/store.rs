use super::models::{NewSchool, School, SchoolChanges, SCHOOL_TABLE};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

/// School 仓库 Trait，约定标准 CRUD 操作。
/// 视图只依赖该 Trait，不关心底层是内存还是 SQLite。
#[async_trait]
pub trait SchoolRepository: Send + Sync {
    /// 创建表结构（幂等）
    async fn migrate(&self) -> AppResult<()>;

    /// 读取所有记录，按主键升序
    async fn fetch_all(&self) -> AppResult<Vec<School>>;

    /// 按主键读取一条记录
    async fn fetch_one(&self, id: i64) -> AppResult<Option<School>>;

    /// 插入记录，返回带主键的完整记录
    async fn insert(&self, school: NewSchool) -> AppResult<School>;

    /// 部分更新，记录不存在时返回 `None`
    async fn update(&self, id: i64, changes: &SchoolChanges) -> AppResult<Option<School>>;

    /// 删除记录，返回是否真的删除了
    async fn delete(&self, id: i64) -> AppResult<bool>;
}

/// 内存存储：主键单调递增，删除后不复用
#[derive(Debug, Default)]
pub struct MemorySchoolStore {
    inner: RwLock<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    rows: BTreeMap<i64, School>,
    last_id: i64,
}

impl MemorySchoolStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchoolRepository for MemorySchoolStore {
    async fn migrate(&self) -> AppResult<()> {
        Ok(())
    }

    async fn fetch_all(&self) -> AppResult<Vec<School>> {
        let state = self.inner.read().await;
        Ok(state.rows.values().cloned().collect())
    }

    async fn fetch_one(&self, id: i64) -> AppResult<Option<School>> {
        let state = self.inner.read().await;
        Ok(state.rows.get(&id).cloned())
    }

    async fn insert(&self, school: NewSchool) -> AppResult<School> {
        let mut state = self.inner.write().await;
        state.last_id += 1;
        let school = school.into_school(state.last_id);
        state.rows.insert(school.id, school.clone());
        Ok(school)
    }

    async fn update(&self, id: i64, changes: &SchoolChanges) -> AppResult<Option<School>> {
        let mut state = self.inner.write().await;
        Ok(state.rows.get_mut(&id).map(|school| {
            changes.apply_to(school);
            school.clone()
        }))
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let mut state = self.inner.write().await;
        Ok(state.rows.remove(&id).is_some())
    }
}

/// SQLite 存储
#[derive(Debug, Clone)]
pub struct SqlSchoolStore {
    pool: SqlitePool,
}

impl SqlSchoolStore {
    /// 根据 URL 建立连接池
    ///
    /// 内存库每个连接都是独立的数据库，因此只保留一个永不回收的连接。
    pub async fn connect(url: &str, max_connections: u32) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(options)
            .await?;

        info!(in_memory, max_connections, "SQLite 连接池已初始化");
        Ok(Self { pool })
    }
}

#[async_trait]
impl SchoolRepository for SqlSchoolStore {
    async fn migrate(&self) -> AppResult<()> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS "{SCHOOL_TABLE}" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name VARCHAR(256) NOT NULL,
                principal VARCHAR(256) NOT NULL,
                location VARCHAR(256) NOT NULL
            )
            "#
        );
        sqlx::query(&sql).execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_all(&self) -> AppResult<Vec<School>> {
        let sql = format!(
            r#"SELECT id, name, principal, location FROM "{SCHOOL_TABLE}" ORDER BY id"#
        );
        let rows = sqlx::query_as::<_, School>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn fetch_one(&self, id: i64) -> AppResult<Option<School>> {
        let sql = format!(
            r#"SELECT id, name, principal, location FROM "{SCHOOL_TABLE}" WHERE id = ?"#
        );
        let row = sqlx::query_as::<_, School>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert(&self, school: NewSchool) -> AppResult<School> {
        let sql = format!(
            r#"INSERT INTO "{SCHOOL_TABLE}" (name, principal, location) VALUES (?, ?, ?)"#
        );
        let result = sqlx::query(&sql)
            .bind(&school.name)
            .bind(&school.principal)
            .bind(&school.location)
            .execute(&self.pool)
            .await?;
        Ok(school.into_school(result.last_insert_rowid()))
    }

    async fn update(&self, id: i64, changes: &SchoolChanges) -> AppResult<Option<School>> {
        if changes.is_empty() {
            return self.fetch_one(id).await;
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!(r#"UPDATE "{SCHOOL_TABLE}" SET "#));
        {
            let mut set = builder.separated(", ");
            if let Some(name) = &changes.name {
                set.push("name = ").push_bind_unseparated(name.clone());
            }
            if let Some(principal) = &changes.principal {
                set.push("principal = ").push_bind_unseparated(principal.clone());
            }
            if let Some(location) = &changes.location {
                set.push("location = ").push_bind_unseparated(location.clone());
            }
        }
        builder.push(" WHERE id = ").push_bind(id);

        let result = builder.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch_one(id).await
    }

    async fn delete(&self, id: i64) -> AppResult<bool> {
        let sql = format!(r#"DELETE FROM "{SCHOOL_TABLE}" WHERE id = ?"#);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

/// 按 `database.url` 选择存储：`memory` 使用内存存储，其余按 SQLite URL 处理
pub async fn connect_store(url: &str, max_connections: u32) -> AppResult<Arc<dyn SchoolRepository>> {
    let url = url.trim();
    if url.eq_ignore_ascii_case("memory") {
        info!("使用内存存储");
        return Ok(Arc::new(MemorySchoolStore::new()));
    }
    if !url.starts_with("sqlite:") {
        return Err(AppError::validation(
            "database.url",
            format!("不支持的数据库地址: {}", url),
        ));
    }
    let store = SqlSchoolStore::connect(url, max_connections).await?;
    Ok(Arc::new(store))
}
