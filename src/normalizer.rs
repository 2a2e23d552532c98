//! Normalización de boletas y bancos.
//!
//! Funciones puras: mismo texto de entrada, misma clave de salida. La tabla de
//! alias se construye una sola vez por proceso y es de sólo lectura.

use crate::models::ClaveNormalizada;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Grupos (canónico, alias conocidos). El canónico también se incluye como alias.
const ALIAS_BANCOS: &[(&str, &[&str])] = &[
    ("BANCO INDUSTRIAL", &["BI", "BANCO INDUSTRIAL", "INDUSTRIAL"]),
    ("BANRURAL", &["BANRURAL", "BAN RURAL", "RURAL"]),
    ("BAM", &["BAM", "BANCO AGROMERCANTIL"]),
    ("G&T CONTINENTAL", &["G&T", "G Y T", "GYT", "G&T CONTINENTAL"]),
    ("PROMERICA", &["PROMERICA"]),
];

// alias -> canónico
static TABLA_ALIAS: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

fn tabla_alias() -> &'static HashMap<&'static str, &'static str> {
    TABLA_ALIAS.get_or_init(|| {
        let mut m = HashMap::new();
        for (canonico, alias) in ALIAS_BANCOS {
            for a in alias.iter() {
                m.insert(*a, *canonico);
            }
        }
        m
    })
}

/// Pasa a mayúsculas (Unicode completo) y descarta todo lo que no sea letra o
/// dígito ASCII. `"AB-12 34/cd"` -> `"AB1234CD"`.
pub fn normalize_receipt_number(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

/// Recorta, pasa a mayúsculas y resuelve contra la tabla de alias por
/// coincidencia exacta. Bancos desconocidos se devuelven tal cual (recortados
/// y en mayúsculas).
pub fn normalize_bank_name(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    match tabla_alias().get(upper.as_str()) {
        Some(canonico) => (*canonico).to_string(),
        None => upper,
    }
}

/// SHA-256 de los bytes del archivo, en hex minúsculas.
pub fn compute_content_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn normalize_key(numero_boleta: &str, banco: &str) -> ClaveNormalizada {
    ClaveNormalizada {
        boleta_norm: normalize_receipt_number(numero_boleta),
        banco_norm: normalize_bank_name(banco),
    }
}

/// Nombres canónicos conocidos, ordenados.
pub fn bancos_canonicos() -> Vec<&'static str> {
    let mut v: Vec<&'static str> = ALIAS_BANCOS.iter().map(|(c, _)| *c).collect();
    v.sort();
    v
}
