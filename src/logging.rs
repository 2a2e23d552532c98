//! Inicialización del logger (`log` + `log4rs`).
//!
//! Consola en stderr y, si se indica un directorio, un archivo `recibos.log`.
//! El logger es global: llamadas repetidas se ignoran.

use log::LevelFilter;
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config,
};
use std::path::PathBuf;

const LOG_LINE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} [{l:<5}] {t} - {m}{n}";
const CONSOLE_APPENDER: &str = "stderr";
const FILE_APPENDER: &str = "log_file";
pub const LOG_FILE_NAME: &str = "recibos.log";

/// Convierte el filtro (`"debug"`, `"warn"`, ...) en nivel; `info` si no se reconoce.
pub fn parse_level(filter: &str) -> LevelFilter {
    filter.trim().parse::<LevelFilter>().unwrap_or(LevelFilter::Info)
}

pub fn init_logger(log_dir: Option<&str>, filter: &str) {
    let level = parse_level(filter);

    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
        .build();

    let mut builder = Config::builder().appender(Appender::builder().build(CONSOLE_APPENDER, Box::new(console)));
    let mut root = Root::builder().appender(CONSOLE_APPENDER);

    if let Some(dir) = log_dir.map(str::trim).filter(|s| !s.is_empty()) {
        let path = PathBuf::from(dir).join(LOG_FILE_NAME);
        match FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_LINE_PATTERN)))
            .build(&path)
        {
            Ok(file) => {
                builder = builder.appender(Appender::builder().build(FILE_APPENDER, Box::new(file)));
                root = root.appender(FILE_APPENDER);
            }
            Err(e) => eprintln!("no se pudo abrir {}: {}", path.display(), e),
        }
    }

    match builder.build(root.build(level)) {
        Ok(config) => {
            let _ = log4rs::init_config(config);
        }
        Err(e) => eprintln!("configuración de log inválida: {}", e),
    }
}
