//! Bench, site and database resolution.
//!
//! A bench is the framework's deployment directory:
//!
//! ```text
//! <bench>/
//!   apps/<app>/<app>/            app package
//!   sites/currentsite.txt        optional default site
//!   sites/common_site_config.json
//!   sites/<site>/site_config.json
//!   sites/<site>/db/<db_name>.db SQLite sites only
//! ```
//!
//! Site config keys override common config keys.

use std::fs;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use serde_json::{Map, Value};
use sqlx::mysql::MySqlConnectOptions;
use thiserror::Error;
use tracing::{debug, info};

use crate::db::{DbError, MariaDbStore, SiteStore, SqliteStore};

const DEFAULT_DB_HOST: &str = "127.0.0.1";
const DEFAULT_DB_PORT: u16 = 3306;

/// Errors resolving a site or its database.
#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("No site selected in bench {}", bench.display())]
    #[diagnostic(
        code(frappe_customs::config::no_site),
        help("Pass --site, set FRAPPE_SITE, or run `bench use <site>`")
    )]
    NoSite { bench: PathBuf },

    #[error("Site '{site}' not found in {}", sites_dir.display())]
    #[diagnostic(code(frappe_customs::config::site_not_found))]
    SiteNotFound { site: String, sites_dir: PathBuf },

    #[error("Failed to read {}: {source}", path.display())]
    #[diagnostic(code(frappe_customs::config::read))]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {message}", path.display())]
    #[diagnostic(code(frappe_customs::config::parse))]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported db_type '{db_type}'")]
    #[diagnostic(
        code(frappe_customs::config::unsupported_db_type),
        help("Supported engines are mariadb and sqlite")
    )]
    UnsupportedDbType { db_type: String },

    #[error("Site '{site}' has no db_name")]
    #[diagnostic(code(frappe_customs::config::missing_db_name))]
    MissingDbName { site: String },

    #[error("Database error: {0}")]
    #[diagnostic(code(frappe_customs::config::database))]
    Database(#[from] DbError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Database engine of a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbType {
    MariaDb,
    Sqlite,
}

/// Connection settings from a site's merged config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    pub db_type: DbType,
    pub db_name: String,
    pub db_password: Option<String>,
    pub db_host: String,
    pub db_port: u16,
    pub db_user: String,
}

impl SiteConfig {
    fn from_map(site: &str, map: &Map<String, Value>) -> ConfigResult<Self> {
        let db_type = match string_key(map, "db_type").as_deref() {
            None | Some("mariadb") | Some("mysql") => DbType::MariaDb,
            Some("sqlite") => DbType::Sqlite,
            Some(other) => {
                return Err(ConfigError::UnsupportedDbType {
                    db_type: other.to_string(),
                });
            }
        };

        let db_name = string_key(map, "db_name").ok_or_else(|| ConfigError::MissingDbName {
            site: site.to_string(),
        })?;

        let db_port = match map.get("db_port") {
            Some(Value::Number(n)) => n.as_u64().and_then(|p| u16::try_from(p).ok()),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
        .unwrap_or(DEFAULT_DB_PORT);

        Ok(Self {
            db_type,
            db_user: string_key(map, "db_user").unwrap_or_else(|| db_name.clone()),
            db_password: string_key(map, "db_password"),
            db_host: string_key(map, "db_host").unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
            db_port,
            db_name,
        })
    }

    /// MariaDB connection options for this site.
    pub fn mysql_options(&self) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .database(&self.db_name);
        match &self.db_password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

fn string_key(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// A bench directory on disk.
#[derive(Debug, Clone)]
pub struct Bench {
    pub root: PathBuf,
}

impl Bench {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn sites_dir(&self) -> PathBuf {
        self.root.join("sites")
    }

    /// App package directory, `<bench>/apps/<app>/<app>`.
    pub fn app_path(&self, app: &str) -> PathBuf {
        self.root.join("apps").join(app).join(app)
    }

    /// SQLite database file of a site.
    pub fn sqlite_path(&self, site: &str, db_name: &str) -> PathBuf {
        self.sites_dir()
            .join(site)
            .join("db")
            .join(format!("{}.db", db_name))
    }

    /// Pick the site: explicit name, then `currentsite.txt`, then
    /// `default_site` from common config.
    pub fn resolve_site(&self, explicit: Option<&str>) -> ConfigResult<String> {
        if let Some(site) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
            return Ok(site.to_string());
        }

        let current = self.sites_dir().join("currentsite.txt");
        if current.is_file() {
            let site = fs::read_to_string(&current).map_err(|source| ConfigError::Read {
                path: current.clone(),
                source,
            })?;
            let site = site.trim();
            if !site.is_empty() {
                debug!("Using site from {}", current.display());
                return Ok(site.to_string());
            }
        }

        let common = read_json_object(&self.sites_dir().join("common_site_config.json"))?;
        common
            .as_ref()
            .and_then(|map| string_key(map, "default_site"))
            .ok_or_else(|| ConfigError::NoSite {
                bench: self.root.clone(),
            })
    }

    /// Merged common and site config for `site`.
    pub fn site_config(&self, site: &str) -> ConfigResult<SiteConfig> {
        let site_dir = self.sites_dir().join(site);
        if !site_dir.is_dir() {
            return Err(ConfigError::SiteNotFound {
                site: site.to_string(),
                sites_dir: self.sites_dir(),
            });
        }

        let mut merged =
            read_json_object(&self.sites_dir().join("common_site_config.json"))?.unwrap_or_default();
        if let Some(site_map) = read_json_object(&site_dir.join("site_config.json"))? {
            merged.extend(site_map);
        }

        SiteConfig::from_map(site, &merged)
    }

    /// Open the site's database. `database_url` bypasses the site config.
    pub async fn open_store(&self, site: &str, database_url: Option<&str>) -> ConfigResult<SiteStore> {
        if let Some(url) = database_url {
            let store = SiteStore::connect(url).await?;
            info!(engine = store.engine(), "Connected via database URL");
            return Ok(store);
        }

        let config = self.site_config(site)?;
        let store = match config.db_type {
            DbType::MariaDb => {
                SiteStore::MariaDb(MariaDbStore::with_options(config.mysql_options()).await?)
            }
            DbType::Sqlite => SiteStore::Sqlite(
                SqliteStore::open(self.sqlite_path(site, &config.db_name)).await?,
            ),
        };
        info!(engine = store.engine(), site, "Connected to site");
        Ok(store)
    }
}

/// Read a JSON object file. A missing file reads as `None`.
fn read_json_object(path: &Path) -> ConfigResult<Option<Map<String, Value>>> {
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => Ok(Some(map)),
        Ok(_) => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            message: "expected a JSON object".to_string(),
        }),
        Err(e) => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }),
    }
}
