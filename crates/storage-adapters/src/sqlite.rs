//! # SQLite boulder repository
//!
//! Maps the `boulder` table onto the domain model. The `style` column holds
//! the JSON array text produced by the style codec; ids and timestamps are
//! assigned here, never by the caller.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domains::ports::BoulderRepository;
use domains::style;
use domains::{Boulder, StyleValue};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use crate::error::StorageError;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, description, grade, quality, type, image, image_line, \
                       latitude, longitude, height, style, top, sector_id, created_at, updated_at";

pub struct SqliteBoulderRepository {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct BoulderRow {
    id: String,
    name: String,
    description: Option<String>,
    grade: Option<String>,
    quality: Option<i32>,
    #[sqlx(rename = "type")]
    kind: Option<String>,
    image: Option<String>,
    image_line: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    height: Option<String>,
    style: Option<String>,
    top: Option<bool>,
    sector_id: Option<String>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<BoulderRow> for Boulder {
    type Error = StorageError;

    fn try_from(row: BoulderRow) -> Result<Self, Self::Error> {
        let id = parse_uuid(&row.id, &row.id, "id")?;
        let sector_id = row
            .sector_id
            .as_deref()
            .map(|raw| parse_uuid(&row.id, raw, "sector_id"))
            .transpose()?;

        Ok(Boulder {
            id: Some(id),
            name: row.name,
            description: row.description,
            grade: row.grade,
            quality: row.quality,
            kind: row.kind,
            image: row.image,
            image_line: row.image_line,
            latitude: row.latitude,
            longitude: row.longitude,
            height: row.height,
            style: row.style.map(StyleValue::Text),
            top: row.top,
            sector_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn parse_uuid(row: &str, raw: &str, column: &'static str) -> Result<Uuid, StorageError> {
    Uuid::parse_str(raw).map_err(|e| StorageError::CorruptRow {
        row: row.to_string(),
        column,
        reason: e.to_string(),
    })
}

/// Text written to the `style` column, whichever form the record holds.
fn style_column(boulder: &Boulder) -> Option<String> {
    match &boulder.style {
        None => None,
        Some(StyleValue::Text(text)) => Some(text.clone()),
        Some(StyleValue::Tags(tags)) => Some(style::encode(tags)),
    }
}

impl SqliteBoulderRepository {
    /// Opens (or creates) the database and applies pending migrations.
    ///
    /// An in-memory database lives only as long as its connection, so it is
    /// served from a single connection that is never recycled.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let in_memory = url.contains(":memory:");

        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Duration::from_secs(10))
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(url, "boulder store ready");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl BoulderRepository for SqliteBoulderRepository {
    async fn list_ordered_by_name(&self) -> anyhow::Result<Vec<Boulder>> {
        let query = format!("SELECT {COLUMNS} FROM boulder ORDER BY name ASC");
        let rows = sqlx::query_as::<_, BoulderRow>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;

        let boulders = rows
            .into_iter()
            .map(Boulder::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(boulders)
    }

    async fn insert(&self, draft: &Boulder) -> anyhow::Result<()> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let query = format!(
            "INSERT INTO boulder ({COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );

        sqlx::query(&query)
            .bind(id.to_string())
            .bind(&draft.name)
            .bind(&draft.description)
            .bind(&draft.grade)
            .bind(draft.quality)
            .bind(&draft.kind)
            .bind(&draft.image)
            .bind(&draft.image_line)
            .bind(draft.latitude)
            .bind(draft.longitude)
            .bind(&draft.height)
            .bind(style_column(draft))
            .bind(draft.top)
            .bind(draft.sector_id.map(|s| s.to_string()))
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;

        tracing::debug!(%id, name = %draft.name, "boulder row inserted");
        Ok(())
    }

    /// Full-record replacement. `image_line` is maintained elsewhere and is
    /// left as stored; `created_at` keeps its original value.
    async fn update(&self, boulder: &Boulder) -> anyhow::Result<()> {
        let id = boulder
            .id
            .ok_or_else(|| StorageError::NotFound("<draft>".to_string()))?;

        let result = sqlx::query(
            "UPDATE boulder SET
                name = ?, description = ?, grade = ?, quality = ?, type = ?, image = ?,
                latitude = ?, longitude = ?, height = ?, style = ?, top = ?, sector_id = ?,
                updated_at = ?
             WHERE id = ?",
        )
        .bind(&boulder.name)
        .bind(&boulder.description)
        .bind(&boulder.grade)
        .bind(boulder.quality)
        .bind(&boulder.kind)
        .bind(&boulder.image)
        .bind(boulder.latitude)
        .bind(boulder.longitude)
        .bind(&boulder.height)
        .bind(style_column(boulder))
        .bind(boulder.top)
        .bind(boulder.sector_id.map(|s| s.to_string()))
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(id.to_string()).into());
        }
        tracing::debug!(%id, "boulder row updated");
        Ok(())
    }
}
