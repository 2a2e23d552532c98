use recibos::normalizer::*;

#[test]
fn test_receipt_stripping() {
    assert_eq!(normalize_receipt_number("AB-12 34/cd"), "AB1234CD");
    assert_eq!(normalize_receipt_number("x-1"), "X1");
    assert_eq!(normalize_receipt_number("No. 000-45"), "NO00045");
}

#[test]
fn test_receipt_idempotence() {
    let muestras = [
        "AB-12 34/cd",
        "  boleta #123  ",
        "ñ-ü-ß",
        "१२३ 456", // dígitos no ASCII se descartan
        "",
        "ABC123",
    ];
    for s in muestras {
        let una = normalize_receipt_number(s);
        assert_eq!(normalize_receipt_number(&una), una, "no idempotente para {:?}", s);
        assert!(una.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}

#[test]
fn test_alias_closure() {
    let grupos: &[(&str, &[&str])] = &[
        ("BANCO INDUSTRIAL", &["BI", "BANCO INDUSTRIAL", "INDUSTRIAL"]),
        ("BANRURAL", &["BANRURAL", "BAN RURAL", "RURAL"]),
        ("BAM", &["BAM", "BANCO AGROMERCANTIL"]),
        ("G&T CONTINENTAL", &["G&T", "G Y T", "GYT", "G&T CONTINENTAL"]),
        ("PROMERICA", &["PROMERICA"]),
    ];
    for (canonico, alias) in grupos {
        for a in alias.iter() {
            assert_eq!(normalize_bank_name(a), *canonico);
            assert_eq!(normalize_bank_name(&a.to_lowercase()), *canonico);
            assert_eq!(normalize_bank_name(&format!("\t {} \n", a)), *canonico);
        }
    }
    assert_eq!(normalize_bank_name(" bi "), "BANCO INDUSTRIAL");
}

#[test]
fn test_unknown_bank_passthrough() {
    assert_eq!(normalize_bank_name("Banco XYZ"), "BANCO XYZ");
    assert_eq!(normalize_bank_name("  banco de los trabajadores "), "BANCO DE LOS TRABAJADORES");
    assert_eq!(normalize_bank_name(""), "");
}

#[test]
fn test_bank_normalization_idempotent() {
    for s in ["bi", "Banco XYZ", " g y t ", "rural"] {
        let una = normalize_bank_name(s);
        assert_eq!(normalize_bank_name(&una), una);
    }
}

#[test]
fn test_content_hash_is_lowercase_hex() {
    let h = compute_content_hash(b"comprobante escaneado");
    assert_eq!(h.len(), 64);
    assert!(h.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    assert_eq!(h, compute_content_hash(b"comprobante escaneado"));
    assert_ne!(h, compute_content_hash(b"comprobante escaneado."));
}
