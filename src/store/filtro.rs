//! Traducción de `FiltroRegistro` a una consulta `SELECT EXISTS(...)`
//! parametrizada, válida para SQLite (`?N`) y Postgres (`$N`).

use crate::duplicates::FiltroRegistro;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialecto {
    Sqlite,
    Postgres,
}

/// Valor de parámetro ya tipado.
#[derive(Debug, Clone, PartialEq)]
pub enum Valor {
    Int(i64),
    Texto(String),
}

struct Constructor {
    dialecto: Dialecto,
    condiciones: Vec<String>,
    valores: Vec<Valor>,
}

impl Constructor {
    fn marcador(&mut self, v: Valor) -> String {
        self.valores.push(v);
        let n = self.valores.len();
        match self.dialecto {
            Dialecto::Sqlite => format!("?{}", n),
            Dialecto::Postgres => format!("${}", n),
        }
    }

    fn igual(&mut self, columna: &str, v: Valor) {
        let m = self.marcador(v);
        self.condiciones.push(format!("{} = {}", columna, m));
    }
}

/// Devuelve el SQL y los valores en orden de marcador.
pub fn build_exists_query(filtro: &FiltroRegistro, dialecto: Dialecto) -> (String, Vec<Valor>) {
    let mut c = Constructor { dialecto, condiciones: Vec::new(), valores: Vec::new() };

    if let Some(i) = filtro.inscripcion_id {
        c.igual("b.inscripcion_id", Valor::Int(i));
    }
    if let Some(s) = &filtro.banco_norm {
        c.igual("b.banco_norm", Valor::Texto(s.clone()));
    }
    if let Some(s) = &filtro.boleta_norm {
        c.igual("b.boleta_norm", Valor::Texto(s.clone()));
    }
    if let Some(s) = &filtro.hash_archivo {
        c.igual("b.hash_archivo", Valor::Texto(s.clone()));
    }
    if let Some(s) = &filtro.carnet {
        c.igual("i.carnet", Valor::Texto(s.clone()));
    }
    if let Some((insc, banco)) = &filtro.excluir_par {
        let mi = c.marcador(Valor::Int(*insc));
        let mb = c.marcador(Valor::Texto(banco.clone()));
        c.condiciones.push(format!("NOT (b.inscripcion_id = {} AND b.banco_norm = {})", mi, mb));
    }

    let join = if filtro.carnet.is_some() {
        " JOIN inscripciones i ON i.id = b.inscripcion_id"
    } else {
        ""
    };
    let donde = if c.condiciones.is_empty() {
        "1 = 1".to_string()
    } else {
        c.condiciones.join(" AND ")
    };
    let sql = format!("SELECT EXISTS(SELECT 1 FROM boletas b{} WHERE {})", join, donde);
    (sql, c.valores)
}
