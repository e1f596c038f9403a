use crate::kml::{
    document,
    field::FieldMap,
    placemark,
    record::{BusinessRecord, ColumnLayout},
};
use crate::prelude::*;
use anyhow::{bail, ensure, Context};
use csv::ReaderBuilder;
use futures::{Stream, StreamExt};
use std::{fs::File, future::Future, io::Read, num::NonZeroUsize, path::Path, pin::pin, time::Instant};
use tokio::{
    io::{AsyncWrite, AsyncWriteExt, BufWriter},
    sync::mpsc,
    task,
};
use tokio_stream::wrappers::ReceiverStream;

pub struct ConvertConfig {
    pub title: String,
    pub concurrency: NonZeroUsize,
    pub field_map: FieldMap,
}

pub async fn run_conversion(input: &Path, output: &Path, config: &ConvertConfig) -> Result<usize> {
    let started = Instant::now();
    let source = File::open(input)
        .with_context(|| format!("Failed to open input {}", input.display()))?;
    let sink = tokio::fs::File::create(output)
        .await
        .with_context(|| format!("Failed to create output {}", output.display()))?;
    let mut sink = BufWriter::new(sink);

    let placemarks = write_document(source, &mut sink, config).await?;
    tracing::info!(
        "Wrote {} placemarks to {} in {:.2?}",
        placemarks,
        output.display(),
        started.elapsed()
    );

    Ok(placemarks)
}

/// Streams `source` into `sink` as a KML document and returns the number of placemarks written.
/// The footer is only written once every row read has been rendered and written, in input order.
pub async fn write_document<R, W>(source: R, sink: &mut W, config: &ConvertConfig) -> Result<usize>
where
    R: Read + Send + 'static,
    W: AsyncWrite + Unpin,
{
    sink.write_all(document::header(&config.title).as_bytes()).await?;

    let (records_tx, records_rx) = mpsc::channel(config.concurrency.get() * 2);
    let field_map = config.field_map.clone();
    let reader = task::spawn_blocking(move || read_records(source, &field_map, records_tx));

    let mut dispatched = 0;
    let mut written = 0;
    {
        let records = ReceiverStream::new(records_rx).inspect(|_| dispatched += 1);
        let mut fragments = pin!(buffered_in_order(records, config.concurrency, render_fragment));
        while let Some(fragment) = fragments.next().await {
            sink.write_all(fragment?.as_bytes()).await?;
            written += 1;
        }
    }

    let read = reader.await.context("CSV reader task failed")??;
    ensure!(
        read == dispatched && dispatched == written,
        "Record count mismatch: read {}, dispatched {}, written {}",
        read,
        dispatched,
        written
    );

    sink.write_all(document::FOOTER.as_bytes()).await?;
    sink.flush().await?;

    Ok(written)
}

/// Runs `f` over `input` with at most `concurrency` futures in flight and yields their
/// outputs in input order, however they complete.
pub fn buffered_in_order<S, F, Fut>(
    input: S,
    concurrency: NonZeroUsize,
    f: F,
) -> impl Stream<Item = Fut::Output>
where
    S: Stream,
    F: FnMut(S::Item) -> Fut,
    Fut: Future,
{
    input.map(f).buffered(concurrency.get())
}

async fn render_fragment(record: BusinessRecord) -> Result<String> {
    Ok(task::spawn(async move { placemark::render(&record) }).await?)
}

fn read_records<R: Read>(
    source: R,
    field_map: &FieldMap,
    records: mpsc::Sender<BusinessRecord>,
) -> Result<usize> {
    let mut reader = ReaderBuilder::new().has_headers(true).from_reader(source);
    let headers = reader.byte_headers().context("Failed to read CSV header row")?;
    let layout = ColumnLayout::resolve(field_map, headers);

    let mut read = 0;
    for row in reader.byte_records() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::error!("Malformed CSV data row {}: {}", read + 1, e);
                bail!("Malformed CSV data row {}: {}", read + 1, e);
            }
        };
        if records.blocking_send(layout.decode(&row)).is_err() {
            bail!("Placemark writer stopped before data row {}", read + 1);
        }
        read += 1;
    }

    Ok(read)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kml::field::DENUE_FIELD_MAP;
    use std::{fs, io::Cursor, time::Duration};

    const HEADER: &str = "Nombre de la Unidad Económica,Latitud,Longitud,Número de teléfono\n";

    fn config(concurrency: usize) -> ConvertConfig {
        ConvertConfig {
            title: "INEGI".to_string(),
            concurrency: NonZeroUsize::new(concurrency).unwrap(),
            field_map: DENUE_FIELD_MAP.clone(),
        }
    }

    async fn convert(csv: String, concurrency: usize) -> (Result<usize>, String) {
        convert_bytes(csv.into_bytes(), concurrency).await
    }

    async fn convert_bytes(csv: Vec<u8>, concurrency: usize) -> (Result<usize>, String) {
        let mut sink = Vec::new();
        let result = write_document(Cursor::new(csv), &mut sink, &config(concurrency)).await;
        (result, String::from_utf8(sink).unwrap())
    }

    #[tokio::test]
    async fn converts_a_single_row() {
        let csv = format!("{}tienda abc,19.4,-99.1,5555555555\n", HEADER);
        let (result, kml) = convert(csv, 10).await;

        assert_eq!(result.unwrap(), 1);
        assert!(kml.starts_with(&document::header("INEGI")));
        assert!(kml.ends_with(document::FOOTER));
        assert_eq!(kml.matches("<Placemark>").count(), 1);
        assert!(kml.contains("<name>Tienda Abc</name>"));
        assert!(kml.contains("<coordinates>19.4,-99.1,0</coordinates>"));
    }

    #[tokio::test]
    async fn header_only_input_produces_an_empty_document() {
        let (result, kml) = convert(HEADER.to_string(), 10).await;

        assert_eq!(result.unwrap(), 0);
        assert_eq!(kml, format!("{}{}", document::header("INEGI"), document::FOOTER));
    }

    #[tokio::test]
    async fn missing_columns_render_empty_cells() {
        let csv = "Nombre de la Unidad Económica,Latitud,Longitud\nfarmacia,20.1,-101.5\n".to_string();
        let (result, kml) = convert(csv, 10).await;

        assert_eq!(result.unwrap(), 1);
        let empty_phone = crate::kml::placemark::Escaped::double_escaped(
            "<tr><td><b>Teléfono</b></td><td></td></tr>",
        );
        assert!(kml.contains(&empty_phone.to_string()));
    }

    #[tokio::test]
    async fn keeps_input_order_for_many_rows() {
        let rows: String = (0..250).map(|i| format!("negocio {},{}.0,-99.0,\n", i, i)).collect();
        let (result, kml) = convert(format!("{}{}", HEADER, rows), 7).await;

        assert_eq!(result.unwrap(), 250);
        let names: Vec<&str> = kml
            .match_indices("<name>Negocio ")
            .map(|(at, _)| {
                let rest = &kml[at + "<name>Negocio ".len()..];
                &rest[..rest.find('<').unwrap()]
            })
            .collect();
        let expected: Vec<String> = (0..250).map(|i| i.to_string()).collect();
        assert_eq!(names, expected);
    }

    #[tokio::test]
    async fn trailing_whitespace_is_trimmed_on_read() {
        let csv = format!("{}tienda abc   ,19.4  ,-99.1\t,\n", HEADER);
        let (_, kml) = convert(csv, 10).await;
        assert!(kml.contains("<coordinates>19.4,-99.1,0</coordinates>"));
    }

    #[tokio::test]
    async fn header_cells_with_trailing_whitespace_still_map() {
        let csv = "Nombre de la Unidad Económica ,Latitud ,Longitud\ntienda abc,19.4,-99.1\n".to_string();
        let (result, kml) = convert(csv, 10).await;

        assert_eq!(result.unwrap(), 1);
        assert!(kml.contains("<name>Tienda Abc</name>"));
        assert!(kml.contains("<coordinates>19.4,-99.1,0</coordinates>"));
    }

    #[tokio::test]
    async fn invalid_utf8_in_a_row_does_not_abort_the_run() {
        let mut csv = HEADER.as_bytes().to_vec();
        csv.extend_from_slice(b"panader\xeda la espiga,19.4,-99.1,\n");
        let (result, kml) = convert_bytes(csv, 10).await;

        assert_eq!(result.unwrap(), 1);
        assert!(kml.contains("<name>Panader\u{fffd}a La Espiga</name>"));
        assert!(kml.contains("<coordinates>19.4,-99.1,0</coordinates>"));
        assert!(kml.ends_with(document::FOOTER));
    }

    #[tokio::test]
    async fn malformed_row_aborts_without_footer() {
        let csv = format!("{}tienda abc,19.4,-99.1,\nrota,1.0\n", HEADER);
        let (result, kml) = convert(csv, 10).await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Malformed CSV data row 2"));
        assert!(!kml.contains("</Document></kml>"));
    }

    #[tokio::test]
    async fn yields_in_input_order_when_completions_are_reversed() {
        let input = futures::stream::iter(0..8u64);
        let outputs: Vec<u64> = buffered_in_order(input, NonZeroUsize::new(8).unwrap(), |i| async move {
            tokio::time::sleep(Duration::from_millis((8 - i) * 5)).await;
            i
        })
        .collect()
        .await;

        assert_eq!(outputs, (0..8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn run_conversion_writes_the_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("denue.csv");
        let output = dir.path().join("denue.kml");
        fs::write(&input, format!("{}tienda abc,19.4,-99.1,\n", HEADER)).unwrap();

        let placemarks = run_conversion(&input, &output, &config(10)).await.unwrap();

        assert_eq!(placemarks, 1);
        let kml = fs::read_to_string(&output).unwrap();
        assert!(kml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<kml><Document><name>INEGI</name>\n"));
        assert!(kml.ends_with("</Document></kml>\n"));
    }

    #[tokio::test]
    async fn missing_input_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.kml");
        let result = run_conversion(&dir.path().join("missing.csv"), &output, &config(10)).await;

        assert!(result.is_err());
        assert!(!output.exists());
    }
}
