//! Batch command - compute a CSV of input records, one row per result

use crate::cmd::write_csv;
use crate::core::{ExemptionFlag, TaxInput};
use crate::engine::Engine;
use crate::rules::{Registry, TaxYear};
use clap::Args;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BatchCommand {
    /// CSV file of input rows (or stdin with "-"); see `schema csv-header`
    #[arg(short, long)]
    input: PathBuf,

    /// Tax year end (e.g. 2025 for 2024/25)
    #[arg(short, long, default_value_t = 2025)]
    year: i32,
}

/// One CSV input row. Flags are space-separated keys, e.g.
/// "first-time-buyer non-resident".
#[derive(Debug, Deserialize)]
struct BatchRecord {
    scheme: String,
    gross: Decimal,
    #[serde(default)]
    other_income: Option<Decimal>,
    #[serde(default)]
    charitable_gift: Option<Decimal>,
    #[serde(default)]
    flags: Option<String>,
}

/// One CSV output row. Amounts are pre-rounded strings; a failed row
/// carries its message in `error` with everything else blank.
#[derive(Debug, Serialize)]
struct BatchResultRecord {
    scheme: String,
    tax_year: String,
    gross: String,
    total_allowance: String,
    taxable_base: String,
    tax_due: String,
    effective_rate: String,
    net: String,
    exemptions: String,
    error: String,
}

impl BatchCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let engine = Engine::new(Registry::uk(TaxYear(self.year))?);
        let records = self.read_records()?;

        let results: Vec<BatchResultRecord> = records
            .iter()
            .map(|record| compute_row(&engine, record))
            .collect();
        write_csv(results, io::stdout())
    }

    fn read_records(&self) -> anyhow::Result<Vec<BatchRecord>> {
        if self.input.as_os_str() == "-" {
            let mut buffer = Vec::new();
            BufReader::new(io::stdin().lock()).read_to_end(&mut buffer)?;
            if buffer.is_empty() {
                anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
            }
            read_records_csv(&buffer[..])
        } else {
            read_records_csv(BufReader::new(File::open(&self.input)?))
        }
    }
}

fn read_records_csv<R: Read>(reader: R) -> anyhow::Result<Vec<BatchRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for record in rdr.deserialize() {
        records.push(record?);
    }
    Ok(records)
}

fn parse_flags(flags: &str) -> Result<Vec<ExemptionFlag>, String> {
    flags
        .split_whitespace()
        .map(|key| ExemptionFlag::from_key(key).ok_or_else(|| format!("unknown flag `{key}`")))
        .collect()
}

fn compute_row(engine: &Engine, record: &BatchRecord) -> BatchResultRecord {
    let flags = match record.flags.as_deref().map(parse_flags).transpose() {
        Ok(flags) => flags.unwrap_or_default(),
        Err(message) => return failed_row(record, message),
    };
    let input = TaxInput {
        gross: record.gross,
        other_income: record.other_income.unwrap_or(Decimal::ZERO),
        charitable_gift: record.charitable_gift.unwrap_or(Decimal::ZERO),
        flags,
    };
    match engine.compute(&record.scheme, &input) {
        Ok(result) => BatchResultRecord {
            scheme: result.scheme,
            tax_year: result.tax_year,
            gross: format!("{:.2}", result.gross),
            total_allowance: format!("{:.2}", result.total_allowance),
            taxable_base: format!("{:.2}", result.taxable_base),
            tax_due: format!("{:.2}", result.tax_due),
            effective_rate: format!("{:.4}", result.effective_rate),
            net: format!("{:.2}", result.net),
            exemptions: result.exemptions.join(" "),
            error: String::new(),
        },
        Err(e) => failed_row(record, e.to_string()),
    }
}

fn failed_row(record: &BatchRecord, message: String) -> BatchResultRecord {
    BatchResultRecord {
        scheme: record.scheme.clone(),
        tax_year: String::new(),
        gross: String::new(),
        total_allowance: String::new(),
        taxable_base: String::new(),
        tax_due: String::new(),
        effective_rate: String::new(),
        net: String::new(),
        exemptions: String::new(),
        error: message,
    }
}
