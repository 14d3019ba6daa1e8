//! Dashboard statistics, a health report and the cleanup of orphaned uploads.

use super::slide::SlideKind;
use super::team::TEAM_SUBDIR;
use super::util::UploadStore;
use anyhow::Ok as AnyOk;
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use log::{info, warn};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::time::{Duration, SystemTime};

pub const DEFAULT_CLEANUP_DAYS: i64 = 7;
pub const CLEANUP_REPORT_LIMIT: usize = 10;

/// Tables reported by the health check.
pub const KEY_TABLES: [&str; 6] = [
    "eventhub_user",
    "eventhub_class",
    "eventhub_participant",
    "eventhub_slide",
    "eventhub_page_content",
    "eventhub_team_member",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct UserStats {
    pub total: i64,
    /// Logged in within the last 30 days.
    pub active: i64,
    pub new_today: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct CatalogStats {
    pub classes: i64,
    pub categories: i64,
    pub tickets: i64,
    pub participants: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct ActiveCount {
    pub total: i64,
    pub active: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct ContentStats {
    pub slides: ActiveCount,
    pub team_members: ActiveCount,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct SystemStats {
    pub total_tables: i64,
    pub server_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct AdminStats {
    pub users: UserStats,
    pub catalog: CatalogStats,
    pub content: ContentStats,
    pub system: SystemStats,
}

async fn count(pool: &sqlx::PgPool, sql: &str) -> Result<i64, anyhow::Error> {
    let (n,) = sqlx::query_as::<_, (i64,)>(sql).fetch_one(pool).await?;
    AnyOk(n)
}

async fn active_count(pool: &sqlx::PgPool, table: &str) -> Result<ActiveCount, anyhow::Error> {
    let (total, active) = sqlx::query_as::<_, (i64, i64)>(&format!(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM {}",
        table
    ))
    .fetch_one(pool)
    .await?;
    AnyOk(ActiveCount { total, active })
}

impl AdminStats {
    pub async fn collect(pool: &sqlx::PgPool) -> Result<AdminStats, anyhow::Error> {
        let counts = try_join_all(
            [
                "SELECT COUNT(*) FROM eventhub_user",
                "SELECT COUNT(*) FROM eventhub_user WHERE last_login >= now() - INTERVAL '30 days'",
                "SELECT COUNT(*) FROM eventhub_user WHERE created_at::date = CURRENT_DATE",
                "SELECT COUNT(*) FROM eventhub_class",
                "SELECT COUNT(*) FROM eventhub_category",
                "SELECT COUNT(*) FROM eventhub_ticket_tier",
                "SELECT COUNT(*) FROM eventhub_participant",
                "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'public'",
            ]
            .into_iter()
            .map(|sql| count(pool, sql)),
        )
        .await?;

        AnyOk(AdminStats {
            users: UserStats {
                total: counts[0],
                active: counts[1],
                new_today: counts[2],
            },
            catalog: CatalogStats {
                classes: counts[3],
                categories: counts[4],
                tickets: counts[5],
                participants: counts[6],
            },
            content: ContentStats {
                slides: active_count(pool, "eventhub_slide").await?,
                team_members: active_count(pool, "eventhub_team_member").await?,
            },
            system: SystemStats {
                total_tables: counts[7],
                server_time: Utc::now(),
            },
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct DatabaseHealth {
    pub connection: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct TableHealth {
    pub exists: bool,
    pub row_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct DirectoryHealth {
    pub exists: bool,
    pub writable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct HealthReport {
    /// `healthy` or `unhealthy`.
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub database: Option<DatabaseHealth>,
    pub tables: BTreeMap<String, TableHealth>,
    pub directories: BTreeMap<String, DirectoryHealth>,
    pub error: Option<String>,
}

/// The directories holding processed images, relative to the upload root.
pub fn managed_dirs() -> Vec<&'static str> {
    let mut dirs: Vec<&'static str> = SlideKind::all().iter().map(|k| k.subdir()).collect();
    dirs.push(TEAM_SUBDIR);
    dirs
}

pub fn directory_health(store: &UploadStore, subdir: &str) -> DirectoryHealth {
    let path = store.dir_of(subdir);
    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_dir() => DirectoryHealth {
            exists: true,
            writable: !meta.permissions().readonly(),
        },
        _ => DirectoryHealth {
            exists: false,
            writable: false,
        },
    }
}

impl HealthReport {
    pub async fn check(pool: &sqlx::PgPool, store: &UploadStore) -> HealthReport {
        let directories = managed_dirs()
            .into_iter()
            .map(|dir| (dir.to_string(), directory_health(store, dir)))
            .collect();

        let database = match crate::check_db_connection(pool).await {
            Ok(version) => DatabaseHealth {
                connection: "ok".to_string(),
                version,
            },
            Err(e) => {
                warn!("Health check failed: {}", e);
                return HealthReport {
                    status: "unhealthy".to_string(),
                    timestamp: Utc::now(),
                    database: None,
                    tables: BTreeMap::new(),
                    directories,
                    error: Some(e.to_string()),
                };
            }
        };

        let mut tables = BTreeMap::new();
        for table in KEY_TABLES {
            let health = match count(pool, &format!("SELECT COUNT(*) FROM {}", table)).await {
                Ok(row_count) => TableHealth {
                    exists: true,
                    row_count,
                },
                Err(_) => TableHealth {
                    exists: false,
                    row_count: 0,
                },
            };
            tables.insert(table.to_string(), health);
        }

        HealthReport {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
            database: Some(database),
            tables,
            directories,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct DeletedFiles {
    pub count: usize,
    /// At most ten names.
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct CleanupReport {
    pub days_old: i64,
    pub timestamp: DateTime<Utc>,
    pub deleted: BTreeMap<String, DeletedFiles>,
}

/// Relative paths (`<subdir>/<file>`) still referenced by slides or team members.
async fn referenced_files(pool: &sqlx::PgPool) -> Result<HashSet<String>, anyhow::Error> {
    let mut referenced = HashSet::new();

    let slides = sqlx::query_as::<_, (String, String)>("SELECT kind, filename FROM eventhub_slide")
        .fetch_all(pool)
        .await?;
    for (kind, filename) in slides {
        if let Some(kind) = SlideKind::all().iter().find(|k| k.as_str() == kind) {
            referenced.insert(format!("{}/{}", kind.subdir(), filename));
        }
    }

    let photos = sqlx::query_as::<_, (String,)>(
        "SELECT photo FROM eventhub_team_member WHERE photo IS NOT NULL",
    )
    .fetch_all(pool)
    .await?;
    referenced.extend(photos.into_iter().map(|r| r.0));

    AnyOk(referenced)
}

/// Delete files in `subdir` older than `max_age` whose relative path is not referenced.
pub fn remove_orphans(
    store: &UploadStore,
    subdir: &str,
    max_age: Duration,
    referenced: &HashSet<String>,
) -> Result<DeletedFiles, anyhow::Error> {
    let dir = store.dir_of(subdir);
    let mut deleted = Vec::new();
    if !dir.is_dir() {
        return AnyOk(DeletedFiles {
            count: 0,
            files: deleted,
        });
    }

    let now = SystemTime::now();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let meta = entry.metadata()?;
        if !meta.is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if referenced.contains(&format!("{}/{}", subdir, name)) {
            continue;
        }

        let age = meta
            .modified()
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .unwrap_or_default();
        if age < max_age {
            continue;
        }

        match std::fs::remove_file(entry.path()) {
            Ok(_) => deleted.push(name),
            Err(e) => warn!("Could not delete {}: {}", name, e),
        }
    }

    let count = deleted.len();
    deleted.truncate(CLEANUP_REPORT_LIMIT);
    AnyOk(DeletedFiles {
        count,
        files: deleted,
    })
}

impl CleanupReport {
    pub async fn run(
        pool: &sqlx::PgPool,
        store: &UploadStore,
        days_old: i64,
    ) -> Result<CleanupReport, anyhow::Error> {
        let days_old = days_old.max(0);
        let max_age = Duration::from_secs(days_old as u64 * 24 * 3600);
        let referenced = referenced_files(pool).await?;

        let mut deleted = BTreeMap::new();
        for dir in managed_dirs() {
            let result = remove_orphans(store, dir, max_age, &referenced)?;
            if result.count > 0 {
                info!("Cleanup removed {} file(s) from {}", result.count, dir);
            }
            deleted.insert(dir.to_string(), result);
        }

        AnyOk(CleanupReport {
            days_old,
            timestamp: Utc::now(),
            deleted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_managed_dirs() {
        assert_eq!(managed_dirs(), vec!["slider", "about", "services", "team"]);
    }

    #[test]
    fn test_directory_health() {
        let root = tempdir().unwrap();
        let store = UploadStore::new(root.path().to_path_buf());
        std::fs::create_dir_all(store.dir_of("team")).unwrap();

        let team = directory_health(&store, "team");
        assert!(team.exists);
        assert!(team.writable);
        assert!(!directory_health(&store, "slider").exists);
    }

    #[test]
    fn test_remove_orphans_keeps_referenced_files() {
        let root = tempdir().unwrap();
        let store = UploadStore::new(root.path().to_path_buf());
        store.save_as("team", "kept.jpg", b"a").unwrap();
        store.save_as("team", "orphan.jpg", b"b").unwrap();

        let referenced: HashSet<String> = ["team/kept.jpg".to_string()].into_iter().collect();

        let result = remove_orphans(&store, "team", Duration::from_secs(3600), &referenced).unwrap();
        assert_eq!(result.count, 0);

        let result = remove_orphans(&store, "team", Duration::ZERO, &referenced).unwrap();
        assert_eq!(result.count, 1);
        assert_eq!(result.files, vec!["orphan.jpg"]);
        assert!(store.exists("team/kept.jpg"));
        assert!(!store.exists("team/orphan.jpg"));
    }

    #[test]
    fn test_remove_orphans_missing_dir() {
        let root = tempdir().unwrap();
        let store = UploadStore::new(root.path().to_path_buf());
        let result = remove_orphans(&store, "about", Duration::ZERO, &HashSet::new()).unwrap();
        assert_eq!(result.count, 0);
    }
}
