//! Adaptadores de persistencia para cuotas y boletas.
//!
//! - `db`: conexión SQLite/Postgres, esquema e implementación de los almacenes
//! - `filtro`: traducción de `FiltroRegistro` a SQL parametrizado
//! - `memoria`: almacenes en memoria

pub mod db;
pub mod filtro;
pub mod memoria;

pub use db::{init_db, open_connection, ConexionRecibos};
pub use memoria::{MemoriaCuotas, MemoriaLedger};
