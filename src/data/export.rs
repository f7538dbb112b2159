use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Date32Array, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Datelike, NaiveDate};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

use super::model::Transaction;

/// `NaiveDate::num_days_from_ce` of 1970-01-01, the Arrow Date32 origin.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Write the filtered transactions to a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – one flat row per transaction, customer fields inlined
/// * `.json`    – array of the same flat records
/// * `.parquet` – one Arrow column per flat field, `date` as Date32
pub fn export_transactions(path: &Path, rows: &[&Transaction]) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => write_csv(path, rows),
        "json" => write_json(path, rows),
        "parquet" | "pq" => write_parquet(path, rows),
        other => bail!("Unsupported export extension: .{other}"),
    }?;

    log::info!("Exported {} transactions to {}", rows.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Flat record
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FlatTransaction<'a> {
    id: &'a str,
    date: NaiveDate,
    timestamp: &'a str,
    amount: f64,
    product: &'a str,
    product_id: &'a str,
    category: &'a str,
    region: &'a str,
    customer_id: &'a str,
    segment: &'a str,
    lifetime_value: f64,
    payment_method: &'a str,
    status: &'a str,
}

impl<'a> From<&'a Transaction> for FlatTransaction<'a> {
    fn from(t: &'a Transaction) -> Self {
        FlatTransaction {
            id: &t.id,
            date: t.date,
            timestamp: &t.timestamp,
            amount: t.amount,
            product: &t.product,
            product_id: &t.product_id,
            category: &t.category,
            region: &t.region,
            customer_id: &t.customer.id,
            segment: &t.customer.segment,
            lifetime_value: t.customer.lifetime_value,
            payment_method: &t.payment_method,
            status: &t.status,
        }
    }
}

// ---------------------------------------------------------------------------
// CSV / JSON writers
// ---------------------------------------------------------------------------

fn write_csv(path: &Path, rows: &[&Transaction]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for (row_no, t) in rows.iter().enumerate() {
        writer
            .serialize(FlatTransaction::from(*t))
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_json(path: &Path, rows: &[&Transaction]) -> Result<()> {
    let file = File::create(path).context("creating JSON file")?;
    let records: Vec<FlatTransaction> = rows.iter().map(|t| FlatTransaction::from(*t)).collect();
    serde_json::to_writer_pretty(BufWriter::new(file), &records).context("writing JSON")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Parquet writer
// ---------------------------------------------------------------------------

fn string_column<'a>(rows: &[&'a Transaction], f: impl Fn(&'a Transaction) -> &'a str) -> ArrayRef {
    Arc::new(StringArray::from(rows.iter().map(|t| f(*t)).collect::<Vec<_>>()))
}

fn write_parquet(path: &Path, rows: &[&Transaction]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("date", DataType::Date32, false),
        Field::new("timestamp", DataType::Utf8, false),
        Field::new("amount", DataType::Float64, false),
        Field::new("product", DataType::Utf8, false),
        Field::new("productId", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, false),
        Field::new("region", DataType::Utf8, false),
        Field::new("customerId", DataType::Utf8, false),
        Field::new("segment", DataType::Utf8, false),
        Field::new("lifetimeValue", DataType::Float64, false),
        Field::new("paymentMethod", DataType::Utf8, false),
        Field::new("status", DataType::Utf8, false),
    ]));

    let dates = Date32Array::from(
        rows.iter()
            .map(|t| t.date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
            .collect::<Vec<i32>>(),
    );
    let amounts = Float64Array::from(rows.iter().map(|t| t.amount).collect::<Vec<_>>());
    let lifetime = Float64Array::from(
        rows.iter()
            .map(|t| t.customer.lifetime_value)
            .collect::<Vec<_>>(),
    );

    let columns: Vec<ArrayRef> = vec![
        string_column(rows, |t| t.id.as_str()),
        Arc::new(dates),
        string_column(rows, |t| t.timestamp.as_str()),
        Arc::new(amounts),
        string_column(rows, |t| t.product.as_str()),
        string_column(rows, |t| t.product_id.as_str()),
        string_column(rows, |t| t.category.as_str()),
        string_column(rows, |t| t.region.as_str()),
        string_column(rows, |t| t.customer.id.as_str()),
        string_column(rows, |t| t.customer.segment.as_str()),
        Arc::new(lifetime),
        string_column(rows, |t| t.payment_method.as_str()),
        string_column(rows, |t| t.status.as_str()),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use arrow::array::Array;
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    use super::*;
    use crate::data::testing::sample_dataset;

    #[test]
    fn csv_has_flat_header_and_one_line_per_row() {
        let ds = sample_dataset();
        let rows: Vec<&Transaction> = ds.transactions.iter().take(3).collect();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        export_transactions(&path, &rows).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "id,date,timestamp,amount,product,productId,category,region,customerId,segment,lifetimeValue,paymentMethod,status"
        );
        assert!(lines.next().unwrap().starts_with("T1,2024-01-01,"));
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn json_records_carry_segment() {
        let ds = sample_dataset();
        let rows: Vec<&Transaction> = ds.transactions.iter().collect();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.JSON");

        export_transactions(&path, &rows).unwrap();

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let records = parsed.as_array().unwrap();
        assert_eq!(records.len(), 7);
        assert_eq!(records[0]["segment"], "SMB");
        assert_eq!(records[0]["customerId"], "C1");
    }

    #[test]
    fn parquet_reads_back() {
        let ds = sample_dataset();
        let rows: Vec<&Transaction> = ds.transactions.iter().collect();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.parquet");

        export_transactions(&path, &rows).unwrap();

        let file = File::open(&path).unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)
            .unwrap()
            .build()
            .unwrap();
        let mut n = 0;
        for batch in reader {
            let batch = batch.unwrap();
            let dates = batch
                .column(batch.schema().index_of("date").unwrap())
                .as_any()
                .downcast_ref::<Date32Array>()
                .unwrap()
                .clone();
            if n == 0 {
                // 2024-01-01
                assert_eq!(dates.value(0), 19_723);
            }
            n += batch.num_rows();
        }
        assert_eq!(n, 7);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let err = export_transactions(&dir.path().join("out.xlsx"), &[]).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }
}
