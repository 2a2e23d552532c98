// Estructuras de datos principales

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Claves de campo fijas usadas en el veredicto.
pub const CAMPO_CUOTA: &str = "cuota_id";
pub const CAMPO_BOLETA: &str = "numero_boleta";
pub const CAMPO_COMPROBANTE: &str = "comprobante";

/// Estado de una cuota. Se persiste como `"pending"`, `"paid"` o el texto crudo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EstadoCuota {
    Pendiente,
    Pagada,
    Otro(String),
}

impl EstadoCuota {
    pub fn as_str(&self) -> &str {
        match self {
            EstadoCuota::Pendiente => "pending",
            EstadoCuota::Pagada => "paid",
            EstadoCuota::Otro(s) => s.as_str(),
        }
    }
}

impl From<String> for EstadoCuota {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => EstadoCuota::Pendiente,
            "paid" => EstadoCuota::Pagada,
            _ => EstadoCuota::Otro(s),
        }
    }
}

impl From<&str> for EstadoCuota {
    fn from(s: &str) -> Self {
        EstadoCuota::from(s.to_string())
    }
}

impl From<EstadoCuota> for String {
    fn from(e: EstadoCuota) -> Self {
        e.as_str().to_string()
    }
}

/// Cuota (installment) adeudada por una inscripción. Sólo lectura para el núcleo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cuota {
    pub id: i64,
    pub inscripcion_id: i64,
    /// Carnet del estudiante dueño de la inscripción
    pub carnet: String,
    pub fecha_vencimiento: NaiveDate,
    pub estado: EstadoCuota,
    #[serde(default)]
    pub programa: Option<String>,
    #[serde(default)]
    pub monto: Option<f64>,
}

/// Solicitud de "subir recibo". Vive sólo durante una validación.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolicitudRecibo {
    pub cuota_id: i64,
    pub numero_boleta: String,
    pub banco: String,
    pub monto: f64,
    /// Bytes del archivo subido (opcional)
    #[serde(skip)]
    pub comprobante: Option<Vec<u8>>,
}

/// Claves canónicas de comparación derivadas de la boleta y el banco.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaveNormalizada {
    pub boleta_norm: String,
    pub banco_norm: String,
}

/// Fila del libro de boletas ya aceptadas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistroBoleta {
    pub id: Option<i64>,
    pub inscripcion_id: i64,
    pub cuota_id: i64,
    pub banco_norm: String,
    pub boleta_norm: String,
    /// SHA-256 en hex minúsculas
    pub hash_archivo: Option<String>,
    pub monto: f64,
    pub creado_en: DateTime<Utc>,
}

/// Etapas del flujo de validación de una solicitud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtapaValidacion {
    Recibida,
    CuotaResuelta,
    ElegibilidadVerificada,
    Normalizada,
    DuplicadosVerificados,
    Aceptada,
    Rechazada,
}

/// Resultado de una pasada de validación, con los errores agrupados por campo.
///
/// Se considera aceptado si y sólo si `errores` está vacío. Los valores
/// derivados (`clave`, `cuota`, `hash_archivo`) son los que el llamador usa
/// para construir el `RegistroBoleta`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Veredicto {
    pub errores: BTreeMap<String, Vec<String>>,
    pub clave: Option<ClaveNormalizada>,
    pub cuota: Option<Cuota>,
    pub hash_archivo: Option<String>,
    pub etapa: EtapaValidacion,
}

impl Default for Veredicto {
    fn default() -> Self {
        Veredicto {
            errores: BTreeMap::new(),
            clave: None,
            cuota: None,
            hash_archivo: None,
            etapa: EtapaValidacion::Recibida,
        }
    }
}

impl Veredicto {
    pub fn agregar_error(&mut self, campo: &str, mensaje: impl Into<String>) {
        self.errores.entry(campo.to_string()).or_default().push(mensaje.into());
    }

    pub fn is_accepted(&self) -> bool {
        self.errores.is_empty()
    }

    /// Errores de un campo (vacío si no hay)
    pub fn errores_de(&self, campo: &str) -> &[String] {
        self.errores.get(campo).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Construye el registro a persistir. `None` si el veredicto tiene errores
    /// o le faltan los valores derivados.
    pub fn to_registro(&self, solicitud: &SolicitudRecibo, creado_en: DateTime<Utc>) -> Option<RegistroBoleta> {
        if !self.is_accepted() {
            return None;
        }
        let cuota = self.cuota.as_ref()?;
        let clave = self.clave.as_ref()?;
        Some(RegistroBoleta {
            id: None,
            inscripcion_id: cuota.inscripcion_id,
            cuota_id: cuota.id,
            banco_norm: clave.banco_norm.clone(),
            boleta_norm: clave.boleta_norm.clone(),
            hash_archivo: self.hash_archivo.clone(),
            monto: solicitud.monto,
            creado_en,
        })
    }
}
