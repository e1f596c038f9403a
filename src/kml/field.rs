use crate::prelude::*;
use anyhow::{anyhow, bail, Context};
use csv::ReaderBuilder;
use once_cell::sync::Lazy;
use std::{collections::HashMap, fmt, fs::File, io::Read, path::Path, str::FromStr};

/// Canonical field keys understood by the placemark renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    NombreUnidadEconomica,
    DescripcionEstratoPersonalOcupado,
    TipoVialidad,
    NombreVialidad,
    NumeroExteriorOKilometro,
    LetraExterior,
    NumeroInterior,
    LetraInterior,
    TipoAsentamientoHumano,
    NombreAsentamientoHumano,
    TipoCentroComercial,
    CorredorCentroMercado,
    NumeroLocal,
    CodigoPostal,
    EntidadFederativa,
    Municipio,
    Localidad,
    Telefono,
    CorreoElectronico,
    SitioInternet,
    FechaIncorporacionDenue,
    Latitud,
    Longitud,
}

impl Field {
    pub const ALL: [Field; 23] = [
        Field::NombreUnidadEconomica,
        Field::DescripcionEstratoPersonalOcupado,
        Field::TipoVialidad,
        Field::NombreVialidad,
        Field::NumeroExteriorOKilometro,
        Field::LetraExterior,
        Field::NumeroInterior,
        Field::LetraInterior,
        Field::TipoAsentamientoHumano,
        Field::NombreAsentamientoHumano,
        Field::TipoCentroComercial,
        Field::CorredorCentroMercado,
        Field::NumeroLocal,
        Field::CodigoPostal,
        Field::EntidadFederativa,
        Field::Municipio,
        Field::Localidad,
        Field::Telefono,
        Field::CorreoElectronico,
        Field::SitioInternet,
        Field::FechaIncorporacionDenue,
        Field::Latitud,
        Field::Longitud,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::NombreUnidadEconomica => "nombre_unidad_economica",
            Field::DescripcionEstratoPersonalOcupado => "descripcion_estrato_personal_ocupado",
            Field::TipoVialidad => "tipo_vialidad",
            Field::NombreVialidad => "nombre_vialidad",
            Field::NumeroExteriorOKilometro => "numero_exterior_o_kilometro",
            Field::LetraExterior => "letra_exterior",
            Field::NumeroInterior => "numero_interior",
            Field::LetraInterior => "letra_interior",
            Field::TipoAsentamientoHumano => "tipo_asentamiento_humano",
            Field::NombreAsentamientoHumano => "nombre_asentamiento_humano",
            Field::TipoCentroComercial => "tipo_centro_comercial",
            Field::CorredorCentroMercado => "corredor_centro_mercado",
            Field::NumeroLocal => "numero_local",
            Field::CodigoPostal => "codigo_postal",
            Field::EntidadFederativa => "entidad_federativa",
            Field::Municipio => "municipio",
            Field::Localidad => "localidad",
            Field::Telefono => "telefono",
            Field::CorreoElectronico => "correo_electronico",
            Field::SitioInternet => "sitio_internet",
            Field::FechaIncorporacionDenue => "fecha_incorporacion_denue",
            Field::Latitud => "latitud",
            Field::Longitud => "longitud",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = anyhow::Error;

    fn from_str(key: &str) -> Result<Self> {
        Field::ALL
            .into_iter()
            .find(|field| field.key() == key)
            .ok_or_else(|| anyhow!("Unknown field key: {}", key))
    }
}

/// Translates input column headers into canonical fields. Matching is exact and case-sensitive.
#[derive(Debug, Clone, Default)]
pub struct FieldMap {
    columns: HashMap<String, Field>,
}

impl FieldMap {
    pub fn new<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, Field)>,
        S: Into<String>,
    {
        Self {
            columns: pairs
                .into_iter()
                .map(|(header, field)| (header.into(), field))
                .collect(),
        }
    }

    pub fn lookup(&self, header: &str) -> Option<Field> {
        self.columns
            .get(header.trim_start_matches('\u{feff}'))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open field map {}", path.display()))?;
        let field_map = Self::from_reader(file)
            .with_context(|| format!("Invalid field map {}", path.display()))?;
        tracing::info!(
            "Loaded {} column mappings from {}",
            field_map.len(),
            path.display()
        );

        Ok(field_map)
    }

    /// Reads a two-column `column,field` CSV.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers = reader.headers()?;
        if headers.len() != 2 {
            bail!(
                "Expected 2 columns (column,field) but found {}",
                headers.len()
            );
        }

        let mut columns = HashMap::new();
        for (row, record) in reader.records().enumerate() {
            let record = record.with_context(|| format!("Unreadable field map row {}", row + 2))?;
            let header = record.get(0).unwrap_or_default().trim();
            let field = record
                .get(1)
                .unwrap_or_default()
                .trim()
                .parse::<Field>()
                .with_context(|| format!("Field map row {}", row + 2))?;
            columns.insert(header.to_string(), field);
        }

        Ok(Self { columns })
    }
}

/// Column headers of the INEGI DENUE bulk download.
pub static DENUE_FIELD_MAP: Lazy<FieldMap> = Lazy::new(|| {
    FieldMap::new([
        ("Nombre de la Unidad Económica", Field::NombreUnidadEconomica),
        (
            "Descripcion estrato personal ocupado",
            Field::DescripcionEstratoPersonalOcupado,
        ),
        ("Tipo de vialidad", Field::TipoVialidad),
        ("Nombre de la vialidad", Field::NombreVialidad),
        ("Número exterior o kilómetro", Field::NumeroExteriorOKilometro),
        ("Letra exterior", Field::LetraExterior),
        ("Número interior", Field::NumeroInterior),
        ("Letra interior", Field::LetraInterior),
        ("Tipo de asentamiento humano", Field::TipoAsentamientoHumano),
        ("Nombre de asentamiento humano", Field::NombreAsentamientoHumano),
        ("Tipo centro comercial", Field::TipoCentroComercial),
        (
            "Corredor industrial, centro comercial o mercado público",
            Field::CorredorCentroMercado,
        ),
        ("Número de local", Field::NumeroLocal),
        ("Código Postal", Field::CodigoPostal),
        ("Entidad federativa", Field::EntidadFederativa),
        ("Municipio", Field::Municipio),
        ("Localidad", Field::Localidad),
        ("Número de teléfono", Field::Telefono),
        ("Correo electrónico", Field::CorreoElectronico),
        ("Sitio en Internet", Field::SitioInternet),
        ("Fecha de incorporación al DENUE", Field::FechaIncorporacionDenue),
        ("Latitud", Field::Latitud),
        ("Longitud", Field::Longitud),
    ])
});
