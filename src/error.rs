use thiserror::Error;

/// Fallas de infraestructura. Los problemas de negocio (cuota ajena,
/// duplicados, etc.) nunca llegan aquí: viven en el `Veredicto`.
#[derive(Debug, Error)]
pub enum RecibosError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("postgres error: {0}")]
    Postgres(#[from] postgres::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store unavailable: {0}")]
    Almacen(String),

    #[error("invalid stored date '{0}'")]
    Fecha(String),
}

impl RecibosError {
    /// Clase de error expuesta al llamador; todas son de infraestructura.
    pub fn kind(&self) -> &'static str {
        "infrastructure"
    }
}

pub type Result<T> = std::result::Result<T, RecibosError>;
