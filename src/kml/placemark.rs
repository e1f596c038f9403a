use super::{
    record::BusinessRecord,
    text::{escape_markup, normalize_display},
};
use itertools::Itertools;
use std::fmt;

const TABLE_STYLE: &str = concat!(
    "<style type=\"text/css\">",
    ".tg {font-family:Arial, sans-serif;font-size:12px;border-collapse:collapse;border-spacing:0;border-color:#ccc;}",
    ".tg td {padding:8px 6px;border-style:solid;border-width:1px;overflow:hidden;word-break:normal;border-color:#ccc;color:#333;background:transparent;}",
    ".tg tr:nth-child(odd) {background-color:#f9f9f9;} .tg tr.alt {background-color:#f0f0f0;}",
    "</style>",
);

const DESCRIPTION_ATTRIBUTES: &str =
    r#"addr="0" color="55ff0000" ride_begin="0" ride_end="0" width="10.0""#;

/// Markup-safe text. Only obtainable by escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Escaped(String);

impl Escaped {
    pub fn text(raw: &str) -> Self {
        Self(escape_markup(raw))
    }

    /// Escapes `html` twice: once as HTML content, once for embedding in an XML element.
    pub fn double_escaped(html: &str) -> Self {
        Self(escape_markup(&escape_markup(html)))
    }
}

impl fmt::Display for Escaped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input text copied into the output untouched.
#[derive(Debug, Clone, Copy)]
pub struct Verbatim<'a>(pub &'a str);

impl fmt::Display for Verbatim<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Renders one `<Placemark>` fragment. Missing fields render as empty text.
pub fn render(record: &BusinessRecord) -> String {
    let name = Escaped::text(&normalize_display(&record.nombre_unidad_economica));
    let description = Escaped::double_escaped(&description_html(record));

    placemark(
        &name,
        &description,
        Verbatim(&record.latitud),
        Verbatim(&record.longitud),
    )
}

fn placemark(
    name: &Escaped,
    description: &Escaped,
    latitude: Verbatim,
    longitude: Verbatim,
) -> String {
    format!(
        "<Placemark>\n  <name>{}</name>\n  <description {}>{}</description>\n  <Point><coordinates>{},{},0</coordinates></Point>\n</Placemark>\n",
        name, DESCRIPTION_ATTRIBUTES, description, latitude, longitude
    )
}

fn description_html(record: &BusinessRecord) -> String {
    let n = normalize_display;
    let street = address_line([
        n(&record.tipo_vialidad),
        n(&record.nombre_vialidad),
        n(&record.numero_exterior_o_kilometro) + &n(&record.letra_exterior),
        n(&record.numero_interior) + &n(&record.letra_interior),
    ]);
    let settlement = address_line([
        n(&record.tipo_asentamiento_humano),
        n(&record.nombre_asentamiento_humano),
        n(&record.tipo_centro_comercial),
        n(&record.corredor_centro_mercado),
        n(&record.numero_local),
        n(&record.codigo_postal),
    ]);
    let region = address_line([
        n(&record.entidad_federativa),
        n(&record.municipio),
        n(&record.localidad),
    ]);

    let rows = [
        ("Personal", &record.descripcion_estrato_personal_ocupado),
        ("Teléfono", &record.telefono),
        ("Correo", &record.correo_electronico),
        ("Sitio Web", &record.sitio_internet),
        ("Fecha Incorporación", &record.fecha_incorporacion_denue),
    ]
    .into_iter()
    .map(|(label, value)| labeled_row(label, &n(value)))
    .join("");

    format!(
        "{}<table class=\"tg\"><tr class=\"alt\"><td colspan=\"2\"><b>Dirección:</b><br />{}<br />{}<br />{}</td></tr>{}</table>",
        TABLE_STYLE, street, settlement, region, rows
    )
}

fn address_line<const N: usize>(parts: [String; N]) -> String {
    parts.into_iter().filter(|part| !part.is_empty()).join(" ")
}

fn labeled_row(label: &str, value: &str) -> String {
    format!("<tr><td><b>{}</b></td><td>{}</td></tr>", label, value)
}
