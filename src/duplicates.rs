//! Detección de boletas duplicadas contra el libro de registros.
//!
//! Tres chequeos independientes, todos se ejecutan siempre:
//! - exacto: misma inscripción, mismo banco y misma boleta
//! - cruzado: mismo estudiante y misma boleta, pero otra inscripción u otro banco
//! - archivo: misma inscripción y mismo hash de archivo (sólo si hay archivo)

use crate::error::Result;
use crate::models::{ClaveNormalizada, CAMPO_BOLETA, CAMPO_COMPROBANTE};
use log::{debug, warn};
use serde::Serialize;

pub const MSG_DUPLICADO_EXACTO: &str = "Esta boleta ya fue registrada para esta inscripción y banco.";
pub const MSG_DUPLICADO_CRUZADO: &str =
    "Esta boleta ya fue utilizada en otra inscripción o banco del mismo estudiante; requiere revisión.";
pub const MSG_DUPLICADO_ARCHIVO: &str = "Este comprobante ya fue subido para esta inscripción.";

/// Filtro de existencia sobre el libro. Los campos `None` no restringen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FiltroRegistro {
    pub inscripcion_id: Option<i64>,
    pub banco_norm: Option<String>,
    pub boleta_norm: Option<String>,
    /// Dueño de la inscripción (requiere join con inscripciones)
    pub carnet: Option<String>,
    pub hash_archivo: Option<String>,
    /// Excluye las filas cuyo (inscripcion_id, banco_norm) sea este par
    pub excluir_par: Option<(i64, String)>,
}

/// Superficie de consulta del libro de boletas aceptadas.
pub trait LedgerStore {
    fn exists_ledger_entry(&self, filtro: &FiltroRegistro) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TipoDuplicado {
    Exacto,
    Cruzado,
    Archivo,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Duplicado {
    pub tipo: TipoDuplicado,
    pub campo: &'static str,
    pub mensaje: &'static str,
}

impl Duplicado {
    fn new(tipo: TipoDuplicado) -> Self {
        let (campo, mensaje) = match tipo {
            TipoDuplicado::Exacto => (CAMPO_BOLETA, MSG_DUPLICADO_EXACTO),
            TipoDuplicado::Cruzado => (CAMPO_BOLETA, MSG_DUPLICADO_CRUZADO),
            TipoDuplicado::Archivo => (CAMPO_COMPROBANTE, MSG_DUPLICADO_ARCHIVO),
        };
        Duplicado { tipo, campo, mensaje }
    }
}

/// Datos de entrada de la detección.
#[derive(Debug, Clone)]
pub struct ConsultaDuplicados<'a> {
    pub inscripcion_id: i64,
    pub carnet: &'a str,
    pub clave: &'a ClaveNormalizada,
    pub hash_archivo: Option<&'a str>,
}

pub fn filtro_exacto(c: &ConsultaDuplicados<'_>) -> FiltroRegistro {
    FiltroRegistro {
        inscripcion_id: Some(c.inscripcion_id),
        banco_norm: Some(c.clave.banco_norm.clone()),
        boleta_norm: Some(c.clave.boleta_norm.clone()),
        ..Default::default()
    }
}

/// Mismo estudiante, misma boleta, y (otro banco o otra inscripción).
pub fn filtro_cruzado(c: &ConsultaDuplicados<'_>) -> FiltroRegistro {
    FiltroRegistro {
        carnet: Some(c.carnet.to_string()),
        boleta_norm: Some(c.clave.boleta_norm.clone()),
        excluir_par: Some((c.inscripcion_id, c.clave.banco_norm.clone())),
        ..Default::default()
    }
}

pub fn filtro_archivo(c: &ConsultaDuplicados<'_>, hash: &str) -> FiltroRegistro {
    FiltroRegistro {
        inscripcion_id: Some(c.inscripcion_id),
        hash_archivo: Some(hash.to_string()),
        ..Default::default()
    }
}

/// Ejecuta los tres chequeos y devuelve los hallazgos en orden
/// (exacto, cruzado, archivo). Un error del almacén se propaga tal cual.
pub fn detect_duplicates<S: LedgerStore + ?Sized>(store: &S, consulta: &ConsultaDuplicados<'_>) -> Result<Vec<Duplicado>> {
    let mut hallazgos = Vec::new();

    if store.exists_ledger_entry(&filtro_exacto(consulta))? {
        debug!(
            "duplicado exacto: inscripcion={} banco={} boleta={}",
            consulta.inscripcion_id, consulta.clave.banco_norm, consulta.clave.boleta_norm
        );
        hallazgos.push(Duplicado::new(TipoDuplicado::Exacto));
    }

    if store.exists_ledger_entry(&filtro_cruzado(consulta))? {
        warn!(
            "boleta {} reutilizada por carnet {} fuera de inscripcion={} banco={}",
            consulta.clave.boleta_norm, consulta.carnet, consulta.inscripcion_id, consulta.clave.banco_norm
        );
        hallazgos.push(Duplicado::new(TipoDuplicado::Cruzado));
    }

    if let Some(hash) = consulta.hash_archivo {
        if store.exists_ledger_entry(&filtro_archivo(consulta, hash))? {
            debug!("comprobante repetido en inscripcion={} hash={}", consulta.inscripcion_id, hash);
            hallazgos.push(Duplicado::new(TipoDuplicado::Archivo));
        }
    }

    Ok(hallazgos)
}
