use super::field::{Field, FieldMap};
use csv::ByteRecord;

/// One input row, keyed by canonical field. Columns absent from the input stay empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BusinessRecord {
    pub nombre_unidad_economica: String,
    pub descripcion_estrato_personal_ocupado: String,
    pub tipo_vialidad: String,
    pub nombre_vialidad: String,
    pub numero_exterior_o_kilometro: String,
    pub letra_exterior: String,
    pub numero_interior: String,
    pub letra_interior: String,
    pub tipo_asentamiento_humano: String,
    pub nombre_asentamiento_humano: String,
    pub tipo_centro_comercial: String,
    pub corredor_centro_mercado: String,
    pub numero_local: String,
    pub codigo_postal: String,
    pub entidad_federativa: String,
    pub municipio: String,
    pub localidad: String,
    pub telefono: String,
    pub correo_electronico: String,
    pub sitio_internet: String,
    pub fecha_incorporacion_denue: String,
    pub latitud: String,
    pub longitud: String,
}

impl BusinessRecord {
    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::NombreUnidadEconomica => &mut self.nombre_unidad_economica,
            Field::DescripcionEstratoPersonalOcupado => {
                &mut self.descripcion_estrato_personal_ocupado
            }
            Field::TipoVialidad => &mut self.tipo_vialidad,
            Field::NombreVialidad => &mut self.nombre_vialidad,
            Field::NumeroExteriorOKilometro => &mut self.numero_exterior_o_kilometro,
            Field::LetraExterior => &mut self.letra_exterior,
            Field::NumeroInterior => &mut self.numero_interior,
            Field::LetraInterior => &mut self.letra_interior,
            Field::TipoAsentamientoHumano => &mut self.tipo_asentamiento_humano,
            Field::NombreAsentamientoHumano => &mut self.nombre_asentamiento_humano,
            Field::TipoCentroComercial => &mut self.tipo_centro_comercial,
            Field::CorredorCentroMercado => &mut self.corredor_centro_mercado,
            Field::NumeroLocal => &mut self.numero_local,
            Field::CodigoPostal => &mut self.codigo_postal,
            Field::EntidadFederativa => &mut self.entidad_federativa,
            Field::Municipio => &mut self.municipio,
            Field::Localidad => &mut self.localidad,
            Field::Telefono => &mut self.telefono,
            Field::CorreoElectronico => &mut self.correo_electronico,
            Field::SitioInternet => &mut self.sitio_internet,
            Field::FechaIncorporacionDenue => &mut self.fecha_incorporacion_denue,
            Field::Latitud => &mut self.latitud,
            Field::Longitud => &mut self.longitud,
        }
    }

    pub fn set(&mut self, field: Field, value: &str) {
        *self.slot(field) = value.to_string();
    }
}

/// Canonical field for each column position of an input file, resolved once from its header row.
#[derive(Debug, Clone)]
pub struct ColumnLayout {
    columns: Vec<Option<Field>>,
}

impl ColumnLayout {
    /// Header cells are matched after trimming trailing whitespace. Bytes that are not
    /// valid UTF-8 are replaced rather than rejected.
    pub fn resolve(field_map: &FieldMap, headers: &ByteRecord) -> Self {
        let columns: Vec<Option<Field>> = headers
            .iter()
            .map(|header| {
                let header = String::from_utf8_lossy(header);
                let field = field_map.lookup(header.trim_end());
                if field.is_none() {
                    tracing::debug!("Ignoring unmapped column: {}", header);
                }
                field
            })
            .collect();

        let layout = Self { columns };
        for field in Field::ALL {
            if !layout.contains(field) {
                tracing::debug!("Input has no column for {}; it will render empty", field);
            }
        }
        for field in [Field::NombreUnidadEconomica, Field::Latitud, Field::Longitud] {
            if !layout.contains(field) {
                tracing::warn!("No input column maps to {}", field);
            }
        }

        layout
    }

    pub fn contains(&self, field: Field) -> bool {
        self.columns.contains(&Some(field))
    }

    /// Builds a record from one row, trimming trailing whitespace from every value.
    /// Invalid UTF-8 sequences become U+FFFD.
    pub fn decode(&self, row: &ByteRecord) -> BusinessRecord {
        let mut record = BusinessRecord::default();
        for (field, value) in self.columns.iter().zip(row.iter()) {
            if let Some(field) = field {
                let value = String::from_utf8_lossy(value);
                record.set(*field, value.trim_end());
            }
        }

        record
    }
}
