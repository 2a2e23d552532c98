//! Validación de una solicitud de "subir recibo".
//!
//! El flujo es una secuencia fija de etapas:
//! `Recibida -> CuotaResuelta -> ElegibilidadVerificada -> Normalizada ->
//! DuplicadosVerificados -> {Aceptada | Rechazada}`.
//!
//! Los errores se acumulan en el `Veredicto`; ninguna etapa corta el flujo
//! salvo la ausencia de la cuota, sin la cual no hay inscripción contra la que
//! buscar duplicados.

use crate::duplicates::{detect_duplicates, ConsultaDuplicados, LedgerStore};
use crate::error::Result;
use crate::models::{Cuota, EstadoCuota, EtapaValidacion, SolicitudRecibo, Veredicto, CAMPO_CUOTA};
use crate::normalizer::{compute_content_hash, normalize_key};
use chrono::NaiveDate;
use log::{debug, info};

pub const MSG_CUOTA_NO_ENCONTRADA: &str =
    "La cuota seleccionada no existe o no pertenece al estudiante autenticado.";
pub const MSG_CUOTA_NO_PENDIENTE: &str = "La cuota seleccionada no está pendiente de pago.";
pub const MSG_CUOTA_NO_HABILITADA: &str = "La cuota seleccionada aún no está habilitada para pago.";

/// Búsqueda de cuotas. Debe filtrar por dueño (carnet) y existencia en una
/// sola consulta; el estado NO se filtra aquí, lo revisa el validador.
pub trait InstallmentStore {
    fn find_pending_installment(&self, cuota_id: i64, carnet: &str) -> Result<Option<Cuota>>;
}

/// Política de pagos configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Politica {
    /// Permite pagar cuotas cuyo vencimiento aún no llega
    pub allow_early_payment: bool,
}

impl Default for Politica {
    fn default() -> Self {
        Politica { allow_early_payment: true }
    }
}

/// Colaboradores externos de una validación.
pub struct ContextoValidacion<'a> {
    pub cuotas: &'a dyn InstallmentStore,
    pub ledger: &'a dyn LedgerStore,
    pub politica: Politica,
}

impl<'a> ContextoValidacion<'a> {
    pub fn new(cuotas: &'a dyn InstallmentStore, ledger: &'a dyn LedgerStore, politica: Politica) -> Self {
        ContextoValidacion { cuotas, ledger, politica }
    }
}

fn avanzar(v: &mut Veredicto, etapa: EtapaValidacion) {
    debug!("validacion: {:?} -> {:?}", v.etapa, etapa);
    v.etapa = etapa;
}

/// Revisa estado y fecha de vencimiento, agregando los errores que apliquen.
fn verificar_elegibilidad(v: &mut Veredicto, cuota: &Cuota, politica: Politica, hoy: NaiveDate) {
    if cuota.estado != EstadoCuota::Pendiente {
        v.agregar_error(CAMPO_CUOTA, MSG_CUOTA_NO_PENDIENTE);
    }
    if !politica.allow_early_payment && cuota.fecha_vencimiento > hoy {
        v.agregar_error(CAMPO_CUOTA, MSG_CUOTA_NO_HABILITADA);
    }
}

/// Valida una solicitud para el estudiante `carnet` a la fecha `hoy`.
///
/// Devuelve `Err` sólo ante fallas de infraestructura; todo problema de
/// negocio queda en el veredicto.
pub fn validate_submission(
    ctx: &ContextoValidacion<'_>,
    carnet: &str,
    solicitud: &SolicitudRecibo,
    hoy: NaiveDate,
) -> Result<Veredicto> {
    let mut v = Veredicto::default();

    // Recibida -> CuotaResuelta
    let cuota = ctx.cuotas.find_pending_installment(solicitud.cuota_id, carnet)?;
    match &cuota {
        Some(c) => {
            avanzar(&mut v, EtapaValidacion::CuotaResuelta);
            // CuotaResuelta -> ElegibilidadVerificada
            verificar_elegibilidad(&mut v, c, ctx.politica, hoy);
            avanzar(&mut v, EtapaValidacion::ElegibilidadVerificada);
        }
        None => v.agregar_error(CAMPO_CUOTA, MSG_CUOTA_NO_ENCONTRADA),
    }

    // -> Normalizada
    let clave = normalize_key(&solicitud.numero_boleta, &solicitud.banco);
    let hash = solicitud.comprobante.as_deref().map(compute_content_hash);
    avanzar(&mut v, EtapaValidacion::Normalizada);

    // Normalizada -> DuplicadosVerificados
    if let Some(c) = &cuota {
        let consulta = ConsultaDuplicados {
            inscripcion_id: c.inscripcion_id,
            carnet,
            clave: &clave,
            hash_archivo: hash.as_deref(),
        };
        for d in detect_duplicates(ctx.ledger, &consulta)? {
            v.agregar_error(d.campo, d.mensaje);
        }
        avanzar(&mut v, EtapaValidacion::DuplicadosVerificados);
    }

    v.clave = Some(clave);
    v.hash_archivo = hash;
    v.cuota = cuota;

    let fin = if v.is_accepted() { EtapaValidacion::Aceptada } else { EtapaValidacion::Rechazada };
    avanzar(&mut v, fin);
    info!(
        "boleta para cuota {} de {}: {:?} ({} campos con error)",
        solicitud.cuota_id,
        carnet,
        v.etapa,
        v.errores.len()
    );
    Ok(v)
}

/// Igual que `validate_submission` usando la fecha local de hoy.
pub fn validate_submission_now(
    ctx: &ContextoValidacion<'_>,
    carnet: &str,
    solicitud: &SolicitudRecibo,
) -> Result<Veredicto> {
    let hoy = chrono::Local::now().date_naive();
    validate_submission(ctx, carnet, solicitud, hoy)
}
