//! One estimate per CSV row.
//!
//! Headers are record field names (`bedrooms`, `city`, ...). Output repeats the
//! input columns and appends `price`, `display` and `error`. A bad row gets an
//! error cell; it never stops the batch.

use std::io::{Read, Write};

use griya_core::PropertyRecord;
use serde::Serialize;

use crate::service::Service;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub rows: usize,
    pub ok: usize,
    pub failed: usize,
}

/// Only read I/O failures and output write failures abort the batch.
pub fn run_batch<R: Read, W: Write>(
    service: &Service,
    input: R,
    output: W,
) -> Result<BatchSummary, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(input);
    let headers = reader.headers()?.clone();

    let mut writer = csv::Writer::from_writer(output);
    let mut out_headers = headers.clone();
    out_headers.push_field("price");
    out_headers.push_field("display");
    out_headers.push_field("error");
    writer.write_record(&out_headers)?;

    let mut summary = BatchSummary::default();
    for (idx, row) in reader.records().enumerate() {
        let row_no = idx + 1;
        summary.rows += 1;

        let (echo, outcome) = match row {
            Ok(row) => {
                let outcome = price_row(service, &headers, &row).map_err(|e| format!("row {row_no}: {e}"));
                (echo_columns(&row, headers.len()), outcome)
            }
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => (
                echo_columns(&csv::StringRecord::new(), headers.len()),
                Err(format!("row {row_no}: {e}")),
            ),
        };

        let mut out = echo;
        match outcome {
            Ok(estimate) => {
                summary.ok += 1;
                out.push_field(&estimate.price.to_string());
                out.push_field(&estimate.display);
                out.push_field("");
            }
            Err(message) => {
                summary.failed += 1;
                log::debug!("batch {}", message);
                out.push_field("");
                out.push_field("");
                out.push_field(&message);
            }
        }
        writer.write_record(&out)?;
    }
    writer.flush()?;
    Ok(summary)
}

fn price_row(
    service: &Service,
    headers: &csv::StringRecord,
    row: &csv::StringRecord,
) -> Result<crate::service::Estimate, String> {
    if row.len() != headers.len() {
        return Err(format!("expected {} fields, found {}", headers.len(), row.len()));
    }
    let record: PropertyRecord = row.deserialize(Some(headers)).map_err(|e| e.to_string())?;
    service.estimate(record).map_err(|e| e.to_string())
}

/// The row's input cells, padded or cut to the header width.
fn echo_columns(row: &csv::StringRecord, width: usize) -> csv::StringRecord {
    let mut echo: csv::StringRecord = row.iter().take(width).collect();
    while echo.len() < width {
        echo.push_field("");
    }
    echo
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ServiceOptions;
    use griya_model::LoadedModel;
    use std::sync::Arc;

    const MODEL: &str = r#"{
        "format": "griya-linear", "version": 1,
        "feature_names": ["bedrooms", "bathrooms", "land_size_m2", "building_size_m2", "floors", "city", "furnishing"],
        "intercept": 0.0,
        "weights": { "bedrooms": 1000.0, "bathrooms": 0.0, "land_size_m2": 0.0, "building_size_m2": 0.0, "floors": 0.0 },
        "categories": {
            "city": { "Bekasi": 0.0, "Bogor": 0.0, "Depok": 0.0, "Jakarta Barat": 0.0, "Jakarta Pusat": 0.0,
                      "Jakarta Selatan": 0.0, "Jakarta Timur": 0.0, "Jakarta Utara": 0.0, "Tangerang": 0.0 },
            "furnishing": { "baru": 0.0, "furnished": 0.0, "semi furnished": 0.0, "unfurnished": 0.0 }
        }
    }"#;

    fn service(options: ServiceOptions) -> Service {
        Service::new(Arc::new(LoadedModel::from_slice(MODEL.as_bytes()).unwrap()), options)
    }

    #[test]
    fn bad_rows_do_not_abort() {
        let input = "\
bedrooms,bathrooms,land_size_m2,building_size_m2,floors,city,furnishing
3,2,100,90,2,Bekasi,unfurnished
4,2,100,90,2,Paris,unfurnished
2,1,80,60,1,Jakarta Barat,semi furnished
";
        let mut out = Vec::new();
        let summary = run_batch(&service(ServiceOptions::default()), input.as_bytes(), &mut out).unwrap();
        assert_eq!(summary, BatchSummary { rows: 3, ok: 2, failed: 1 });

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "bedrooms,bathrooms,land_size_m2,building_size_m2,floors,city,furnishing,price,display,error"
        );
        assert!(lines[1].ends_with(",3000,\"Rp 3,000.00\","), "{}", lines[1]);
        assert!(lines[2].contains("row 2"), "{}", lines[2]);
        assert!(lines[3].contains("Jakarta Barat,semi furnished,2000,"), "{}", lines[3]);
    }

    #[test]
    fn ragged_rows_do_not_abort() {
        let input = "\
bedrooms,bathrooms,land_size_m2,building_size_m2,floors,city,furnishing
3,2,100,90,2,Bekasi,unfurnished
4,2,100,90
2,1,80,60,1,Depok,baru,extra
2,1,80,60,1,Depok,baru
";
        let mut out = Vec::new();
        let summary = run_batch(&service(ServiceOptions::default()), input.as_bytes(), &mut out).unwrap();
        assert_eq!(summary, BatchSummary { rows: 4, ok: 2, failed: 2 });

        let mut reader = csv::Reader::from_reader(out.as_slice());
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert!(rows.iter().all(|r| r.len() == 10));
        assert_eq!(&rows[1][0], "4");
        assert_eq!(&rows[1][4], "");
        assert_eq!(&rows[1][9], "row 2: expected 7 fields, found 4");
        assert_eq!(&rows[2][9], "row 3: expected 7 fields, found 8");
        assert_eq!(&rows[3][5], "Depok");
        assert_eq!(&rows[3][7], "2000");
    }

    #[test]
    fn invalid_utf8_row_is_reported() {
        let mut input = b"bedrooms,bathrooms,land_size_m2,building_size_m2,floors,city,furnishing\n".to_vec();
        input.extend_from_slice(b"3,2,100,90,2,Bek\xffasi,baru\n");
        input.extend_from_slice(b"3,2,100,90,2,Bogor,baru\n");

        let mut out = Vec::new();
        let summary = run_batch(&service(ServiceOptions::default()), input.as_slice(), &mut out).unwrap();
        assert_eq!(summary, BatchSummary { rows: 2, ok: 1, failed: 1 });
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("row 1:"), "{text}");
        assert!(text.contains("Bogor,baru,3000,"), "{text}");
    }

    #[test]
    fn validation_failures_are_per_row() {
        let input = "\
bedrooms,bathrooms,land_size_m2,building_size_m2,floors,city,furnishing
3,2,100,150,2,Bogor,baru
3,2,100,100,2,Bogor,baru
";
        let options = ServiceOptions { validate_sizes: true, ..Default::default() };
        let mut out = Vec::new();
        let summary = run_batch(&service(options), input.as_bytes(), &mut out).unwrap();
        assert_eq!(summary, BatchSummary { rows: 2, ok: 1, failed: 1 });
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("cannot exceed land size"));
    }

    #[test]
    fn optional_columns_may_be_blank() {
        let input = "\
bedrooms,bathrooms,land_size_m2,building_size_m2,floors,city,furnishing,carports
3,2,100,90,2,Depok,furnished,
";
        let mut out = Vec::new();
        let summary = run_batch(&service(ServiceOptions::default()), input.as_bytes(), &mut out).unwrap();
        assert_eq!(summary.ok, 1);
    }
}
