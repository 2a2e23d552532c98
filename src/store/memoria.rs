//! Implementaciones en memoria de los almacenes. Útiles para pruebas y para
//! incrustar el validador sin base de datos.

use crate::duplicates::{FiltroRegistro, LedgerStore};
use crate::error::Result;
use crate::models::{Cuota, RegistroBoleta};
use crate::validator::InstallmentStore;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct MemoriaLedger {
    /// inscripcion_id -> carnet del dueño
    pub inscripciones: HashMap<i64, String>,
    pub registros: Vec<RegistroBoleta>,
}

impl MemoriaLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registrar(&mut self, mut registro: RegistroBoleta) -> i64 {
        let id = self.registros.len() as i64 + 1;
        registro.id = Some(id);
        self.registros.push(registro);
        id
    }

    fn coincide(&self, f: &FiltroRegistro, r: &RegistroBoleta) -> bool {
        if let Some(i) = f.inscripcion_id {
            if r.inscripcion_id != i { return false; }
        }
        if let Some(b) = &f.banco_norm {
            if &r.banco_norm != b { return false; }
        }
        if let Some(b) = &f.boleta_norm {
            if &r.boleta_norm != b { return false; }
        }
        if let Some(h) = &f.hash_archivo {
            if r.hash_archivo.as_ref() != Some(h) { return false; }
        }
        if let Some(c) = &f.carnet {
            // sin inscripción conocida no hay dueño: no coincide
            match self.inscripciones.get(&r.inscripcion_id) {
                Some(dueno) if dueno == c => {}
                _ => return false,
            }
        }
        if let Some((insc, banco)) = &f.excluir_par {
            if r.inscripcion_id == *insc && &r.banco_norm == banco { return false; }
        }
        true
    }
}

impl LedgerStore for MemoriaLedger {
    fn exists_ledger_entry(&self, filtro: &FiltroRegistro) -> Result<bool> {
        Ok(self.registros.iter().any(|r| self.coincide(filtro, r)))
    }
}

#[derive(Debug, Default)]
pub struct MemoriaCuotas {
    pub cuotas: HashMap<i64, Cuota>,
}

impl MemoriaCuotas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agregar(&mut self, cuota: Cuota) {
        self.cuotas.insert(cuota.id, cuota);
    }
}

impl InstallmentStore for MemoriaCuotas {
    fn find_pending_installment(&self, cuota_id: i64, carnet: &str) -> Result<Option<Cuota>> {
        Ok(self.cuotas.get(&cuota_id).filter(|c| c.carnet == carnet).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use crate::models::EstadoCuota;

    #[test]
    fn cuota_ajena_no_se_encuentra() {
        let mut m = MemoriaCuotas::new();
        m.agregar(Cuota {
            id: 1,
            inscripcion_id: 5,
            carnet: "A".to_string(),
            fecha_vencimiento: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            estado: EstadoCuota::Pendiente,
            programa: None,
            monto: None,
        });
        assert!(m.find_pending_installment(1, "A").unwrap().is_some());
        assert!(m.find_pending_installment(1, "B").unwrap().is_none());
        assert!(m.find_pending_installment(2, "A").unwrap().is_none());
    }

    #[test]
    fn excluir_par_solo_quita_la_combinacion_exacta() {
        let mut l = MemoriaLedger::new();
        l.inscripciones.insert(5, "A".to_string());
        l.registrar(RegistroBoleta {
            id: None,
            inscripcion_id: 5,
            cuota_id: 1,
            banco_norm: "BAM".to_string(),
            boleta_norm: "1".to_string(),
            hash_archivo: None,
            monto: 1.0,
            creado_en: Utc::now(),
        });
        let mut f = FiltroRegistro { boleta_norm: Some("1".to_string()), ..Default::default() };
        f.excluir_par = Some((5, "BAM".to_string()));
        assert!(!l.exists_ledger_entry(&f).unwrap());
        f.excluir_par = Some((5, "BANRURAL".to_string()));
        assert!(l.exists_ledger_entry(&f).unwrap());
        f.excluir_par = Some((6, "BAM".to_string()));
        assert!(l.exists_ledger_entry(&f).unwrap());
    }
}
