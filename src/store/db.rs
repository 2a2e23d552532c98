use crate::config::Config;
use crate::duplicates::{FiltroRegistro, LedgerStore};
use crate::error::{RecibosError, Result};
use crate::models::{Cuota, EstadoCuota, RegistroBoleta};
use crate::store::filtro::{build_exists_query, Dialecto, Valor};
use crate::validator::InstallmentStore;
use chrono::{DateTime, NaiveDate, Utc};
use log::error;
use rusqlite::{ffi, params, Connection, OptionalExtension};
use std::fmt;
use std::fs;

// Postgres client for remote DB support
use postgres::error::SqlState;
use postgres::types::ToSql;
use postgres::{Client, NoTls};

/// Conexión al almacén de cuotas y boletas: SQLite o Postgres.
/// Para Postgres guardamos la URL y cada operación conecta en un hilo
/// separado, así el llamador no necesita un runtime.
pub enum ConexionRecibos {
    Sqlite(Connection),
    /// Contiene la URL completa (postgres://...)
    PostgresConfig(String),
}

impl fmt::Debug for ConexionRecibos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConexionRecibos::Sqlite(_) => write!(f, "ConexionRecibos::Sqlite(..)"),
            ConexionRecibos::PostgresConfig(_) => write!(f, "ConexionRecibos::PostgresConfig(..)"),
        }
    }
}

const SQLITE_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS inscripciones (
        id INTEGER PRIMARY KEY,
        carnet TEXT NOT NULL,
        programa TEXT
    );
    CREATE INDEX IF NOT EXISTS inscripciones_carnet ON inscripciones (carnet);

    CREATE TABLE IF NOT EXISTS cuotas (
        id INTEGER PRIMARY KEY,
        inscripcion_id INTEGER NOT NULL REFERENCES inscripciones(id),
        fecha_vencimiento TEXT NOT NULL,
        estado TEXT NOT NULL,
        monto REAL
    );

    CREATE TABLE IF NOT EXISTS boletas (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        inscripcion_id INTEGER NOT NULL REFERENCES inscripciones(id),
        cuota_id INTEGER NOT NULL REFERENCES cuotas(id),
        banco_norm TEXT NOT NULL,
        boleta_norm TEXT NOT NULL,
        hash_archivo TEXT,
        monto REAL NOT NULL,
        creado_en TEXT NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS boletas_unicas ON boletas (inscripcion_id, banco_norm, boleta_norm);
    CREATE INDEX IF NOT EXISTS boletas_hash ON boletas (inscripcion_id, hash_archivo);
    CREATE INDEX IF NOT EXISTS boletas_boleta ON boletas (boleta_norm);
";

const POSTGRES_SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS inscripciones (
        id BIGINT PRIMARY KEY,
        carnet TEXT NOT NULL,
        programa TEXT
    );
    CREATE INDEX IF NOT EXISTS inscripciones_carnet ON inscripciones (carnet);

    CREATE TABLE IF NOT EXISTS cuotas (
        id BIGINT PRIMARY KEY,
        inscripcion_id BIGINT NOT NULL REFERENCES inscripciones(id),
        fecha_vencimiento TEXT NOT NULL,
        estado TEXT NOT NULL,
        monto DOUBLE PRECISION
    );

    CREATE TABLE IF NOT EXISTS boletas (
        id BIGSERIAL PRIMARY KEY,
        inscripcion_id BIGINT NOT NULL REFERENCES inscripciones(id),
        cuota_id BIGINT NOT NULL REFERENCES cuotas(id),
        banco_norm TEXT NOT NULL,
        boleta_norm TEXT NOT NULL,
        hash_archivo TEXT,
        monto DOUBLE PRECISION NOT NULL,
        creado_en TEXT NOT NULL
    );
    CREATE UNIQUE INDEX IF NOT EXISTS boletas_unicas ON boletas (inscripcion_id, banco_norm, boleta_norm);
    CREATE INDEX IF NOT EXISTS boletas_hash ON boletas (inscripcion_id, hash_archivo);
    CREATE INDEX IF NOT EXISTS boletas_boleta ON boletas (boleta_norm);
";

const SELECT_CUOTA_SQLITE: &str = "SELECT c.id, c.inscripcion_id, i.carnet, c.fecha_vencimiento, c.estado, i.programa, c.monto
     FROM cuotas c JOIN inscripciones i ON i.id = c.inscripcion_id
     WHERE c.id = ?1 AND i.carnet = ?2";

const SELECT_CUOTA_POSTGRES: &str = "SELECT c.id, c.inscripcion_id, i.carnet, c.fecha_vencimiento, c.estado, i.programa, c.monto
     FROM cuotas c JOIN inscripciones i ON i.id = c.inscripcion_id
     WHERE c.id = $1 AND i.carnet = $2";

fn parse_fecha(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| RecibosError::Fecha(s.to_string()))
}

fn parse_ts(s: &str) -> Result<DateTime<Utc>> {
    s.parse::<DateTime<Utc>>().map_err(|_| RecibosError::Fecha(s.to_string()))
}

/// Ejecuta `f` con un cliente Postgres recién conectado, en un hilo dedicado.
fn con_postgres<T, F>(url: &str, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&mut Client) -> Result<T> + Send + 'static,
{
    let url = url.to_string();
    let handle = std::thread::spawn(move || -> Result<T> {
        let mut client = Client::connect(&url, NoTls)?;
        f(&mut client)
    });
    match handle.join() {
        Ok(res) => res,
        Err(e) => Err(RecibosError::Almacen(format!("thread join error: {:?}", e))),
    }
}

fn valores_postgres(valores: &[Valor]) -> Vec<Box<dyn ToSql + Sync + Send>> {
    valores
        .iter()
        .map(|v| -> Box<dyn ToSql + Sync + Send> {
            match v {
                Valor::Int(i) => Box::new(*i),
                Valor::Texto(s) => Box::new(s.clone()),
            }
        })
        .collect()
}

/// Abre la conexión según la configuración. Acepta sqlite://, file://,
/// postgres:// y postgresql://; sin URL usa `db_path` (sqlite).
pub fn open_connection(config: &Config) -> Result<ConexionRecibos> {
    if let Some(url) = &config.db_url {
        if let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("file://")) {
            return Ok(ConexionRecibos::Sqlite(Connection::open(path)?));
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            return Ok(ConexionRecibos::PostgresConfig(url.clone()));
        } else {
            return Err(RecibosError::Almacen(format!("RECIBOS_DB_URL uses unsupported scheme: {}", url)));
        }
    }

    if let Some(dir) = config.db_path.parent() {
        if !dir.as_os_str().is_empty() && !dir.exists() {
            fs::create_dir_all(dir)?;
        }
    }
    Ok(ConexionRecibos::Sqlite(Connection::open(&config.db_path)?))
}

/// Crea tablas e índices si no existen.
pub fn init_db(conn: &ConexionRecibos) -> Result<()> {
    match conn {
        ConexionRecibos::Sqlite(c) => init_sqlite(c),
        ConexionRecibos::PostgresConfig(url) => con_postgres(url, |client| {
            client.batch_execute(POSTGRES_SCHEMA)?;
            Ok(())
        }),
    }
}

pub fn init_sqlite(conn: &Connection) -> Result<()> {
    conn.execute_batch(SQLITE_SCHEMA)?;
    Ok(())
}

// --- SQLite: funciones sobre &Connection (sirven también dentro de una Transaction) ---

pub fn sqlite_find_cuota(conn: &Connection, cuota_id: i64, carnet: &str) -> Result<Option<Cuota>> {
    let row = conn
        .query_row(SELECT_CUOTA_SQLITE, params![cuota_id, carnet], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, Option<f64>>(6)?,
            ))
        })
        .optional()?;
    match row {
        Some((id, inscripcion_id, carnet, fecha, estado, programa, monto)) => Ok(Some(Cuota {
            id,
            inscripcion_id,
            carnet,
            fecha_vencimiento: parse_fecha(&fecha)?,
            estado: EstadoCuota::from(estado),
            programa,
            monto,
        })),
        None => Ok(None),
    }
}

pub fn sqlite_exists(conn: &Connection, filtro: &FiltroRegistro) -> Result<bool> {
    let (sql, valores) = build_exists_query(filtro, Dialecto::Sqlite);
    let params: Vec<rusqlite::types::Value> = valores
        .into_iter()
        .map(|v| match v {
            Valor::Int(i) => rusqlite::types::Value::Integer(i),
            Valor::Texto(s) => rusqlite::types::Value::Text(s),
        })
        .collect();
    let n: i64 = conn.query_row(&sql, rusqlite::params_from_iter(params.iter()), |row| row.get(0))?;
    Ok(n != 0)
}

/// Inserta la boleta. `Ok(None)` si el índice único la rechaza; cualquier
/// otra restricción violada es un error.
pub fn sqlite_insert_registro(conn: &Connection, r: &RegistroBoleta) -> Result<Option<i64>> {
    let res = conn.execute(
        "INSERT INTO boletas (inscripcion_id, cuota_id, banco_norm, boleta_norm, hash_archivo, monto, creado_en)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            r.inscripcion_id,
            r.cuota_id,
            r.banco_norm,
            r.boleta_norm,
            r.hash_archivo,
            r.monto,
            r.creado_en.to_rfc3339(),
        ],
    );
    match res {
        Ok(_) => Ok(Some(conn.last_insert_rowid())),
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn sqlite_listar_registros(conn: &Connection, inscripcion_id: i64) -> Result<Vec<RegistroBoleta>> {
    let mut stmt = conn.prepare(
        "SELECT id, inscripcion_id, cuota_id, banco_norm, boleta_norm, hash_archivo, monto, creado_en
         FROM boletas WHERE inscripcion_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![inscripcion_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, f64>(6)?,
            row.get::<_, String>(7)?,
        ))
    })?;
    let mut out = Vec::new();
    for r in rows {
        let (id, inscripcion_id, cuota_id, banco_norm, boleta_norm, hash_archivo, monto, ts) = r?;
        out.push(RegistroBoleta {
            id: Some(id),
            inscripcion_id,
            cuota_id,
            banco_norm,
            boleta_norm,
            hash_archivo,
            monto,
            creado_en: parse_ts(&ts)?,
        });
    }
    Ok(out)
}

impl InstallmentStore for Connection {
    fn find_pending_installment(&self, cuota_id: i64, carnet: &str) -> Result<Option<Cuota>> {
        sqlite_find_cuota(self, cuota_id, carnet)
    }
}

impl LedgerStore for Connection {
    fn exists_ledger_entry(&self, filtro: &FiltroRegistro) -> Result<bool> {
        sqlite_exists(self, filtro)
    }
}

// --- ConexionRecibos: despacha a SQLite o Postgres ---

impl InstallmentStore for ConexionRecibos {
    fn find_pending_installment(&self, cuota_id: i64, carnet: &str) -> Result<Option<Cuota>> {
        match self {
            ConexionRecibos::Sqlite(c) => sqlite_find_cuota(c, cuota_id, carnet),
            ConexionRecibos::PostgresConfig(url) => {
                let carnet = carnet.to_string();
                con_postgres(url, move |client| {
                    let rows = client.query(SELECT_CUOTA_POSTGRES, &[&cuota_id, &carnet])?;
                    match rows.first() {
                        Some(r) => {
                            let fecha: String = r.get(3);
                            let estado: String = r.get(4);
                            Ok(Some(Cuota {
                                id: r.get(0),
                                inscripcion_id: r.get(1),
                                carnet: r.get(2),
                                fecha_vencimiento: parse_fecha(&fecha)?,
                                estado: EstadoCuota::from(estado),
                                programa: r.get(5),
                                monto: r.get(6),
                            }))
                        }
                        None => Ok(None),
                    }
                })
            }
        }
    }
}

impl LedgerStore for ConexionRecibos {
    fn exists_ledger_entry(&self, filtro: &FiltroRegistro) -> Result<bool> {
        let res = match self {
            ConexionRecibos::Sqlite(c) => sqlite_exists(c, filtro),
            ConexionRecibos::PostgresConfig(url) => {
                let (sql, valores) = build_exists_query(filtro, Dialecto::Postgres);
                con_postgres(url, move |client| {
                    let boxed = valores_postgres(&valores);
                    let refs: Vec<&(dyn ToSql + Sync)> = boxed.iter().map(|b| b.as_ref() as &(dyn ToSql + Sync)).collect();
                    let row = client.query_one(sql.as_str(), &refs)?;
                    Ok(row.get::<_, bool>(0))
                })
            }
        };
        if let Err(e) = &res {
            error!("consulta de boletas falló: {}", e);
        }
        res
    }
}

impl ConexionRecibos {
    /// Inserta la boleta; `Ok(None)` si viola el índice único.
    pub fn insert_registro(&self, r: &RegistroBoleta) -> Result<Option<i64>> {
        match self {
            ConexionRecibos::Sqlite(c) => sqlite_insert_registro(c, r),
            ConexionRecibos::PostgresConfig(url) => {
                let r = r.clone();
                con_postgres(url, move |client| {
                    let res = client.query_one(
                        "INSERT INTO boletas (inscripcion_id, cuota_id, banco_norm, boleta_norm, hash_archivo, monto, creado_en)
                         VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id",
                        &[
                            &r.inscripcion_id,
                            &r.cuota_id,
                            &r.banco_norm,
                            &r.boleta_norm,
                            &r.hash_archivo,
                            &r.monto,
                            &r.creado_en.to_rfc3339(),
                        ],
                    );
                    match res {
                        Ok(row) => Ok(Some(row.get::<_, i64>(0))),
                        Err(e) if e.code() == Some(&SqlState::UNIQUE_VIOLATION) => Ok(None),
                        Err(e) => Err(e.into()),
                    }
                })
            }
        }
    }

    pub fn insert_inscripcion(&self, id: i64, carnet: &str, programa: Option<&str>) -> Result<()> {
        match self {
            ConexionRecibos::Sqlite(c) => {
                c.execute(
                    "INSERT OR REPLACE INTO inscripciones (id, carnet, programa) VALUES (?1, ?2, ?3)",
                    params![id, carnet, programa],
                )?;
                Ok(())
            }
            ConexionRecibos::PostgresConfig(url) => {
                let carnet = carnet.to_string();
                let programa = programa.map(str::to_string);
                con_postgres(url, move |client| {
                    client.execute(
                        "INSERT INTO inscripciones (id, carnet, programa) VALUES ($1, $2, $3)
                         ON CONFLICT (id) DO UPDATE SET carnet = EXCLUDED.carnet, programa = EXCLUDED.programa",
                        &[&id, &carnet, &programa],
                    )?;
                    Ok(())
                })
            }
        }
    }

    pub fn insert_cuota(&self, cuota: &Cuota) -> Result<()> {
        let fecha = cuota.fecha_vencimiento.format("%Y-%m-%d").to_string();
        let estado = cuota.estado.as_str().to_string();
        match self {
            ConexionRecibos::Sqlite(c) => {
                c.execute(
                    "INSERT OR REPLACE INTO cuotas (id, inscripcion_id, fecha_vencimiento, estado, monto) VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![cuota.id, cuota.inscripcion_id, fecha, estado, cuota.monto],
                )?;
                Ok(())
            }
            ConexionRecibos::PostgresConfig(url) => {
                let (id, inscripcion_id, monto) = (cuota.id, cuota.inscripcion_id, cuota.monto);
                con_postgres(url, move |client| {
                    client.execute(
                        "INSERT INTO cuotas (id, inscripcion_id, fecha_vencimiento, estado, monto) VALUES ($1, $2, $3, $4, $5)
                         ON CONFLICT (id) DO UPDATE SET inscripcion_id = EXCLUDED.inscripcion_id,
                           fecha_vencimiento = EXCLUDED.fecha_vencimiento, estado = EXCLUDED.estado, monto = EXCLUDED.monto",
                        &[&id, &inscripcion_id, &fecha, &estado, &monto],
                    )?;
                    Ok(())
                })
            }
        }
    }

    pub fn listar_registros(&self, inscripcion_id: i64) -> Result<Vec<RegistroBoleta>> {
        match self {
            ConexionRecibos::Sqlite(c) => sqlite_listar_registros(c, inscripcion_id),
            ConexionRecibos::PostgresConfig(url) => con_postgres(url, move |client| {
                let rows = client.query(
                    "SELECT id, inscripcion_id, cuota_id, banco_norm, boleta_norm, hash_archivo, monto, creado_en
                     FROM boletas WHERE inscripcion_id = $1 ORDER BY id",
                    &[&inscripcion_id],
                )?;
                let mut out = Vec::new();
                for r in rows.iter() {
                    let ts: String = r.get(7);
                    out.push(RegistroBoleta {
                        id: Some(r.get(0)),
                        inscripcion_id: r.get(1),
                        cuota_id: r.get(2),
                        banco_norm: r.get(3),
                        boleta_norm: r.get(4),
                        hash_archivo: r.get(5),
                        monto: r.get(6),
                        creado_en: parse_ts(&ts)?,
                    });
                }
                Ok(out)
            }),
        }
    }
}
