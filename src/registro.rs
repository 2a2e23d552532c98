//! Lado del llamador: valida y, si el veredicto es limpio, persiste la boleta.
//!
//! En SQLite todo ocurre dentro de una transacción `IMMEDIATE`. En cualquier
//! motor, el índice único `(inscripcion_id, banco_norm, boleta_norm)` es la
//! garantía final: si otra solicitud gana la carrera, la inserción se rechaza
//! y se informa como duplicado exacto.

use crate::duplicates::MSG_DUPLICADO_EXACTO;
use crate::error::Result;
use crate::models::{EtapaValidacion, RegistroBoleta, SolicitudRecibo, Veredicto, CAMPO_BOLETA};
use crate::store::db::{sqlite_insert_registro, ConexionRecibos};
use crate::validator::{validate_submission, ContextoValidacion, Politica};
use chrono::{NaiveDate, Utc};
use log::{info, warn};
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
pub struct ResultadoRegistro {
    pub veredicto: Veredicto,
    /// Boleta persistida (con id) si fue aceptada
    pub registro: Option<RegistroBoleta>,
}

/// Lee los bytes del comprobante. Un archivo ilegible es falla de infraestructura.
pub fn leer_comprobante(ruta: &Path) -> Result<Vec<u8>> {
    Ok(std::fs::read(ruta)?)
}

fn validar_y_registrar<F>(
    ctx: &ContextoValidacion<'_>,
    carnet: &str,
    solicitud: &SolicitudRecibo,
    hoy: NaiveDate,
    insertar: F,
) -> Result<ResultadoRegistro>
where
    F: FnOnce(&RegistroBoleta) -> Result<Option<i64>>,
{
    let mut veredicto = validate_submission(ctx, carnet, solicitud, hoy)?;
    let mut registro = match veredicto.to_registro(solicitud, Utc::now()) {
        Some(r) => r,
        None => return Ok(ResultadoRegistro { veredicto, registro: None }),
    };

    match insertar(&registro)? {
        Some(id) => {
            registro.id = Some(id);
            info!("boleta {} registrada para inscripcion {}", registro.boleta_norm, registro.inscripcion_id);
            Ok(ResultadoRegistro { veredicto, registro: Some(registro) })
        }
        None => {
            warn!(
                "índice único rechazó boleta {} en inscripcion {}",
                registro.boleta_norm, registro.inscripcion_id
            );
            veredicto.agregar_error(CAMPO_BOLETA, MSG_DUPLICADO_EXACTO);
            veredicto.etapa = EtapaValidacion::Rechazada;
            Ok(ResultadoRegistro { veredicto, registro: None })
        }
    }
}

/// Valida y registra dentro de una transacción SQLite. Si no se registra
/// nada, la transacción se descarta.
pub fn submit_receipt_sqlite(
    conn: &mut Connection,
    politica: Politica,
    carnet: &str,
    solicitud: &SolicitudRecibo,
    hoy: NaiveDate,
) -> Result<ResultadoRegistro> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let resultado = {
        let vista: &Connection = &tx;
        let ctx = ContextoValidacion::new(vista, vista, politica);
        validar_y_registrar(&ctx, carnet, solicitud, hoy, |r| sqlite_insert_registro(vista, r))?
    };
    if resultado.registro.is_some() {
        tx.commit()?;
    }
    Ok(resultado)
}

/// Valida y registra con la conexión configurada.
pub fn submit_receipt(
    conn: &mut ConexionRecibos,
    politica: Politica,
    carnet: &str,
    solicitud: &SolicitudRecibo,
    hoy: NaiveDate,
) -> Result<ResultadoRegistro> {
    match conn {
        ConexionRecibos::Sqlite(c) => submit_receipt_sqlite(c, politica, carnet, solicitud, hoy),
        ConexionRecibos::PostgresConfig(_) => {
            let store: &ConexionRecibos = conn;
            let ctx = ContextoValidacion::new(store, store, politica);
            validar_y_registrar(&ctx, carnet, solicitud, hoy, |r| store.insert_registro(r))
        }
    }
}
