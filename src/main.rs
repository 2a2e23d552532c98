// --- Recepción de boletas - Archivo principal ---

use clap::{Args, Parser, Subcommand};
use chrono::NaiveDate;
use recibos::config::Config;
use recibos::models::{Cuota, EstadoCuota, SolicitudRecibo};
use recibos::normalizer::bancos_canonicos;
use recibos::registro::leer_comprobante;
use recibos::store::{init_db, open_connection};
use recibos::{submit_receipt, validate_submission, ContextoValidacion};
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "recibos", version, about = "Validación y registro de boletas de pago")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crea las tablas si no existen
    Init,
    /// Registra (o reemplaza) una inscripción
    Seed {
        #[arg(long)]
        inscripcion: i64,
        #[arg(long)]
        carnet: String,
        #[arg(long)]
        programa: Option<String>,
    },
    /// Registra (o reemplaza) una cuota
    SeedCuota {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        inscripcion: i64,
        /// Fecha de vencimiento YYYY-MM-DD
        #[arg(long)]
        vence: NaiveDate,
        #[arg(long, default_value = "pending")]
        estado: String,
        #[arg(long)]
        monto: Option<f64>,
    },
    /// Valida una boleta sin registrarla
    Validar(SolicitudArgs),
    /// Valida y, si es aceptada, registra la boleta
    Subir(SolicitudArgs),
    /// Lista las boletas registradas de una inscripción
    Boletas {
        #[arg(long)]
        inscripcion: i64,
    },
    /// Nombres canónicos de bancos
    Bancos,
}

#[derive(Args, Debug)]
struct SolicitudArgs {
    /// Carnet del estudiante autenticado
    #[arg(long)]
    carnet: String,
    #[arg(long)]
    cuota: i64,
    #[arg(long)]
    boleta: String,
    #[arg(long)]
    banco: String,
    #[arg(long)]
    monto: f64,
    /// Archivo del comprobante (opcional)
    #[arg(long)]
    comprobante: Option<PathBuf>,
    /// Fecha de referencia YYYY-MM-DD (default: hoy)
    #[arg(long)]
    fecha: Option<NaiveDate>,
}

impl SolicitudArgs {
    fn to_solicitud(&self) -> recibos::Result<SolicitudRecibo> {
        let comprobante = match &self.comprobante {
            Some(p) => Some(leer_comprobante(p)?),
            None => None,
        };
        Ok(SolicitudRecibo {
            cuota_id: self.cuota,
            numero_boleta: self.boleta.clone(),
            banco: self.banco.clone(),
            monto: self.monto,
            comprobante,
        })
    }

    fn hoy(&self) -> NaiveDate {
        self.fecha.unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

fn imprimir<T: serde::Serialize>(v: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(v)?);
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = Config::from_env();
    recibos::logging::init_logger(config.log_dir.as_deref(), &config.log_filter);

    if let Commands::Bancos = cli.command {
        return imprimir(&bancos_canonicos());
    }

    let mut conn = open_connection(&config)?;
    init_db(&conn)?;

    match cli.command {
        Commands::Init => imprimir(&json!({"status": "ok"})),
        Commands::Seed { inscripcion, carnet, programa } => {
            conn.insert_inscripcion(inscripcion, &carnet, programa.as_deref())?;
            imprimir(&json!({"status": "ok", "inscripcion": inscripcion}))
        }
        Commands::SeedCuota { id, inscripcion, vence, estado, monto } => {
            let cuota = Cuota {
                id,
                inscripcion_id: inscripcion,
                carnet: String::new(),
                fecha_vencimiento: vence,
                estado: EstadoCuota::from(estado),
                programa: None,
                monto,
            };
            conn.insert_cuota(&cuota)?;
            imprimir(&json!({"status": "ok", "cuota": id}))
        }
        Commands::Validar(args) => {
            let solicitud = args.to_solicitud()?;
            let ctx = ContextoValidacion::new(&conn, &conn, config.politica);
            let veredicto = validate_submission(&ctx, &args.carnet, &solicitud, args.hoy())?;
            imprimir(&veredicto)
        }
        Commands::Subir(args) => {
            let solicitud = args.to_solicitud()?;
            let resultado = submit_receipt(&mut conn, config.politica, &args.carnet, &solicitud, args.hoy())?;
            imprimir(&resultado)
        }
        Commands::Boletas { inscripcion } => imprimir(&conn.listar_registros(inscripcion)?),
        Commands::Bancos => Ok(()),
    }
}
