// Biblioteca raíz del crate `recibos`.
// Normalización de boletas, detección de duplicados y validación de la
// solicitud de "subir recibo", más los adaptadores de persistencia.
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod registro;
pub mod store;
pub mod validator;

pub use error::{RecibosError, Result};
pub use normalizer::{compute_content_hash, normalize_bank_name, normalize_receipt_number};
pub use registro::{submit_receipt, ResultadoRegistro};
pub use validator::{validate_submission, validate_submission_now, ContextoValidacion, InstallmentStore, Politica};
