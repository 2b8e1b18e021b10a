//! Service configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{Result, ServerError};

pub const DEFAULT_DB_NAME: &str = "Foodwastedb";
const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Where the Foodwastedb database lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseTarget {
    /// SQLite file `<dir>/<db_name>.db`
    Sqlite { dir: PathBuf },
    /// MySQL server; the database is created on it and then selected
    MySql { server_url: String },
}

impl Default for DatabaseTarget {
    fn default() -> Self {
        DatabaseTarget::Sqlite {
            dir: std::env::temp_dir().join("foodwaste"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub target: DatabaseTarget,
    pub db_name: String,
    pub listen_addr: SocketAddr,
}

impl AppConfig {
    /// SQLite config rooted at `dir`, used by tests and local runs
    pub fn sqlite(dir: PathBuf) -> Self {
        Self {
            target: DatabaseTarget::Sqlite { dir },
            db_name: DEFAULT_DB_NAME.to_string(),
            listen_addr: DEFAULT_LISTEN_ADDR
                .parse()
                .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8080))),
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup("FOODWASTE_DB_BACKEND").unwrap_or_else(|| "sqlite".to_string());

        let target = match backend.to_ascii_lowercase().as_str() {
            "sqlite" => match lookup("FOODWASTE_DATA_DIR") {
                Some(dir) => DatabaseTarget::Sqlite { dir: PathBuf::from(dir) },
                None => DatabaseTarget::default(),
            },
            "mysql" => {
                let server_url = lookup("FOODWASTE_MYSQL_URL").ok_or_else(|| {
                    ServerError::Config("FOODWASTE_MYSQL_URL is required for the mysql backend".into())
                })?;
                if !server_url.starts_with("mysql://") {
                    return Err(ServerError::Config(format!(
                        "FOODWASTE_MYSQL_URL must start with mysql://, got {}",
                        server_url
                    )));
                }
                DatabaseTarget::MySql {
                    server_url: server_url.trim_end_matches('/').to_string(),
                }
            }
            other => return Err(ServerError::UnsupportedBackend(other.to_string())),
        };

        let db_name = lookup("FOODWASTE_DB_NAME").unwrap_or_else(|| DEFAULT_DB_NAME.to_string());
        if !is_plain_identifier(&db_name) {
            return Err(ServerError::Config(format!(
                "FOODWASTE_DB_NAME must be a plain identifier, got {:?}",
                db_name
            )));
        }

        let listen_addr = lookup("FOODWASTE_LISTEN_ADDR")
            .unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr.parse().map_err(|e| {
            ServerError::Config(format!("invalid FOODWASTE_LISTEN_ADDR {}: {}", listen_addr, e))
        })?;

        Ok(Self {
            target,
            db_name,
            listen_addr,
        })
    }
}

/// Database names are spliced into DDL, so only `[A-Za-z_][A-Za-z0-9_]*` is accepted
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
