use chrono::{NaiveDate, Utc};
use recibos::duplicates::{MSG_DUPLICADO_ARCHIVO, MSG_DUPLICADO_CRUZADO, MSG_DUPLICADO_EXACTO};
use recibos::models::*;
use recibos::store::memoria::{MemoriaCuotas, MemoriaLedger};
use recibos::validator::*;
use recibos::compute_content_hash;

const CARNET: &str = "2020-001";
const OTRO_CARNET: &str = "2019-777";

fn fecha(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn cuota(id: i64, inscripcion_id: i64, carnet: &str, estado: EstadoCuota, vence: NaiveDate) -> Cuota {
    Cuota {
        id,
        inscripcion_id,
        carnet: carnet.to_string(),
        fecha_vencimiento: vence,
        estado,
        programa: None,
        monto: Some(500.0),
    }
}

/// Persona 2020-001 con inscripciones 5 y 7; persona 2019-777 con la 9.
/// El libro tiene una boleta X1 de BANRURAL en la inscripción 5.
fn escenario() -> (MemoriaCuotas, MemoriaLedger) {
    let mut cuotas = MemoriaCuotas::new();
    cuotas.agregar(cuota(1, 5, CARNET, EstadoCuota::Pendiente, fecha(2026, 1, 31)));
    cuotas.agregar(cuota(2, 7, CARNET, EstadoCuota::Pendiente, fecha(2026, 1, 31)));
    cuotas.agregar(cuota(3, 5, CARNET, EstadoCuota::Pagada, fecha(2025, 12, 31)));
    cuotas.agregar(cuota(4, 5, CARNET, EstadoCuota::Pendiente, fecha(2026, 6, 30)));
    cuotas.agregar(cuota(9, 9, OTRO_CARNET, EstadoCuota::Pendiente, fecha(2026, 1, 31)));

    let mut ledger = MemoriaLedger::new();
    ledger.inscripciones.insert(5, CARNET.to_string());
    ledger.inscripciones.insert(7, CARNET.to_string());
    ledger.inscripciones.insert(9, OTRO_CARNET.to_string());
    ledger.registrar(RegistroBoleta {
        id: None,
        inscripcion_id: 5,
        cuota_id: 1,
        banco_norm: "BANRURAL".to_string(),
        boleta_norm: "X1".to_string(),
        hash_archivo: Some(compute_content_hash(b"scan-original")),
        monto: 500.0,
        creado_en: Utc::now(),
    });
    (cuotas, ledger)
}

fn solicitud(cuota_id: i64, boleta: &str, banco: &str) -> SolicitudRecibo {
    SolicitudRecibo {
        cuota_id,
        numero_boleta: boleta.to_string(),
        banco: banco.to_string(),
        monto: 500.0,
        comprobante: None,
    }
}

fn hoy() -> NaiveDate {
    fecha(2026, 2, 15)
}

#[test]
fn test_exact_duplicate_detection() {
    let (c, l) = escenario();
    let ctx = ContextoValidacion::new(&c, &l, Politica::default());
    let v = validate_submission(&ctx, CARNET, &solicitud(1, "x-1", "Ban Rural"), hoy()).unwrap();
    assert!(!v.is_accepted());
    assert_eq!(v.etapa, EtapaValidacion::Rechazada);
    assert_eq!(v.errores_de(CAMPO_BOLETA), [MSG_DUPLICADO_EXACTO]);
}

#[test]
fn test_soft_duplicate_other_enrollment() {
    let (c, l) = escenario();
    let ctx = ContextoValidacion::new(&c, &l, Politica::default());
    for banco in ["BANRURAL", "bi", "Banco XYZ"] {
        let v = validate_submission(&ctx, CARNET, &solicitud(2, "X-1", banco), hoy()).unwrap();
        assert_eq!(v.errores_de(CAMPO_BOLETA), [MSG_DUPLICADO_CRUZADO], "banco {}", banco);
    }
}

#[test]
fn test_soft_duplicate_other_bank_same_enrollment() {
    let (c, l) = escenario();
    let ctx = ContextoValidacion::new(&c, &l, Politica::default());
    let v = validate_submission(&ctx, CARNET, &solicitud(1, "X1", "BAM"), hoy()).unwrap();
    assert_eq!(v.errores_de(CAMPO_BOLETA), [MSG_DUPLICADO_CRUZADO]);
}

#[test]
fn test_no_cross_person_leakage() {
    let (c, l) = escenario();
    let ctx = ContextoValidacion::new(&c, &l, Politica::default());
    let v = validate_submission(&ctx, OTRO_CARNET, &solicitud(9, "X1", "BANRURAL"), hoy()).unwrap();
    assert!(v.is_accepted(), "errores inesperados: {:?}", v.errores);
}

#[test]
fn test_file_hash_duplicate() {
    let (c, l) = escenario();
    let ctx = ContextoValidacion::new(&c, &l, Politica::default());

    let mut s = solicitud(1, "OTRA-99", "BANRURAL");
    s.comprobante = Some(b"scan-original".to_vec());
    let v = validate_submission(&ctx, CARNET, &s, hoy()).unwrap();
    assert_eq!(v.errores_de(CAMPO_COMPROBANTE), [MSG_DUPLICADO_ARCHIVO]);
    assert!(v.errores_de(CAMPO_BOLETA).is_empty());
    assert_eq!(v.hash_archivo, Some(compute_content_hash(b"scan-original")));

    // sin archivo nunca se evalúa
    let v = validate_submission(&ctx, CARNET, &solicitud(1, "OTRA-99", "BANRURAL"), hoy()).unwrap();
    assert!(v.is_accepted());

    // mismo archivo en otra inscripción no es duplicado de archivo
    let mut s = solicitud(2, "OTRA-99", "BANRURAL");
    s.comprobante = Some(b"scan-original".to_vec());
    let v = validate_submission(&ctx, CARNET, &s, hoy()).unwrap();
    assert!(v.errores_de(CAMPO_COMPROBANTE).is_empty());
}

#[test]
fn test_paid_installment_always_rejected() {
    let (c, l) = escenario();
    for allow in [true, false] {
        let ctx = ContextoValidacion::new(&c, &l, Politica { allow_early_payment: allow });
        let v = validate_submission(&ctx, CARNET, &solicitud(3, "NUEVA-1", "BAM"), hoy()).unwrap();
        assert_eq!(v.errores_de(CAMPO_CUOTA), [MSG_CUOTA_NO_PENDIENTE]);
    }
}

#[test]
fn test_future_due_date_depends_on_policy() {
    let (c, l) = escenario();
    let s = solicitud(4, "NUEVA-2", "BAM");

    let estricto = ContextoValidacion::new(&c, &l, Politica { allow_early_payment: false });
    let v = validate_submission(&estricto, CARNET, &s, hoy()).unwrap();
    assert_eq!(v.errores_de(CAMPO_CUOTA), [MSG_CUOTA_NO_HABILITADA]);

    let flexible = ContextoValidacion::new(&c, &l, Politica { allow_early_payment: true });
    let v = validate_submission(&flexible, CARNET, &s, hoy()).unwrap();
    assert!(v.is_accepted());
}

#[test]
fn test_error_accumulation() {
    let (c, mut l) = escenario();
    l.registrar(RegistroBoleta {
        id: None,
        inscripcion_id: 5,
        cuota_id: 3,
        banco_norm: "BAM".to_string(),
        boleta_norm: "PAGADA1".to_string(),
        hash_archivo: None,
        monto: 500.0,
        creado_en: Utc::now(),
    });
    let ctx = ContextoValidacion::new(&c, &l, Politica::default());
    // cuota pagada y además boleta ya registrada para la misma inscripción y banco
    let v = validate_submission(&ctx, CARNET, &solicitud(3, "pagada-1", "banco agromercantil"), hoy()).unwrap();
    assert_eq!(v.errores_de(CAMPO_CUOTA), [MSG_CUOTA_NO_PENDIENTE]);
    assert_eq!(v.errores_de(CAMPO_BOLETA), [MSG_DUPLICADO_EXACTO]);
    assert_eq!(v.errores.len(), 2);
}

#[test]
fn test_accumulation_across_three_fields() {
    let (c, l) = escenario();
    let ctx = ContextoValidacion::new(&c, &l, Politica { allow_early_payment: false });
    let mut s = solicitud(4, "X1", "rural");
    s.comprobante = Some(b"scan-original".to_vec());
    let v = validate_submission(&ctx, CARNET, &s, hoy()).unwrap();
    assert_eq!(v.errores_de(CAMPO_CUOTA), [MSG_CUOTA_NO_HABILITADA]);
    assert_eq!(v.errores_de(CAMPO_BOLETA), [MSG_DUPLICADO_EXACTO]);
    assert_eq!(v.errores_de(CAMPO_COMPROBANTE), [MSG_DUPLICADO_ARCHIVO]);
}

#[test]
fn test_unknown_installment_skips_duplicate_checks() {
    let (c, l) = escenario();
    let ctx = ContextoValidacion::new(&c, &l, Politica::default());
    let v = validate_submission(&ctx, CARNET, &solicitud(9, "X1", "BANRURAL"), hoy()).unwrap();
    assert_eq!(v.errores_de(CAMPO_CUOTA), [MSG_CUOTA_NO_ENCONTRADA]);
    assert!(v.errores_de(CAMPO_BOLETA).is_empty());
    assert!(v.cuota.is_none());
}

#[test]
fn test_accepted_verdict_builds_ledger_entry() {
    let (c, l) = escenario();
    let ctx = ContextoValidacion::new(&c, &l, Politica::default());
    let mut s = solicitud(2, "  nueva / 77 ", "g y t");
    s.comprobante = Some(b"otro-scan".to_vec());
    let v = validate_submission(&ctx, CARNET, &s, hoy()).unwrap();
    assert_eq!(v.etapa, EtapaValidacion::Aceptada);
    let r = v.to_registro(&s, Utc::now()).expect("Debe construir registro");
    assert_eq!(r.inscripcion_id, 7);
    assert_eq!(r.cuota_id, 2);
    assert_eq!(r.banco_norm, "G&T CONTINENTAL");
    assert_eq!(r.boleta_norm, "NUEVA77");
    assert_eq!(r.hash_archivo, Some(compute_content_hash(b"otro-scan")));
}
