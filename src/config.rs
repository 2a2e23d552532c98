//! Configuración leída del entorno (y de `.env` si existe).
//!
//! Variables:
//! - `RECIBOS_DB_URL`: `sqlite://`, `file://`, `postgres://` o `postgresql://`
//! - `RECIBOS_DB_PATH`: ruta del archivo sqlite (si no hay URL)
//! - `RECIBOS_ALLOW_EARLY_PAYMENT`: `true/false/1/0/si/no` (default `true`)
//! - `RECIBOS_LOG`: filtro de nivel (default `info`)
//! - `RECIBOS_LOG_DIR`: directorio opcional para el log en archivo

use crate::validator::Politica;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_DB_PATH: &str = "data/recibos.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub db_url: Option<String>,
    pub db_path: PathBuf,
    pub politica: Politica,
    pub log_filter: String,
    pub log_dir: Option<String>,
}

// load .env if present
fn load_dotenv() {
    let _ = dotenv::dotenv();
}

/// Interpreta un booleano de configuración; `None` si no se reconoce.
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "si" | "sí" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn from_env() -> Self {
        load_dotenv();
        let db_url = env::var("RECIBOS_DB_URL").ok().filter(|s| !s.trim().is_empty());
        let db_path = env::var("RECIBOS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));
        let allow_early_payment = env::var("RECIBOS_ALLOW_EARLY_PAYMENT")
            .ok()
            .and_then(|s| parse_flag(&s))
            .unwrap_or(true);
        let log_filter = env::var("RECIBOS_LOG").unwrap_or_else(|_| "info".to_string());
        let log_dir = env::var("RECIBOS_LOG_DIR").ok().filter(|s| !s.trim().is_empty());
        Config {
            db_url,
            db_path,
            politica: Politica { allow_early_payment },
            log_filter,
            log_dir,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_url: None,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            politica: Politica::default(),
            log_filter: "info".to_string(),
            log_dir: None,
        }
    }
}
