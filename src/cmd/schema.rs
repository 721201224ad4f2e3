//! Schema command - print expected input/output formats

use crate::core::{TaxComputation, TaxInput};
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// What to print
    #[arg(value_enum, default_value = "input-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema for the input record
    InputSchema,
    /// JSON Schema for the result record
    ResultSchema,
    /// CSV header row for the batch command
    CsvHeader,
    /// CSV column descriptions for the batch command
    CsvFields,
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::InputSchema => {
                let schema = schema_for!(TaxInput);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::ResultSchema => {
                let schema = schema_for!(TaxComputation);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::CsvHeader => {
                println!("{}", CSV_COLUMNS.join(","));
            }
            SchemaFormat::CsvFields => {
                println!("Batch CSV Input Format");
                println!("======================");
                println!();
                for (name, required, description) in CSV_FIELD_DESCRIPTIONS {
                    let req = if *required { "required" } else { "optional" };
                    println!("{:18} ({:8})  {}", name, req, description);
                }
                println!();
                println!("Flags are space-separated keys, e.g. \"first-time-buyer non-resident\"");
            }
        }
        Ok(())
    }
}

const CSV_COLUMNS: &[&str] = &["scheme", "gross", "other_income", "charitable_gift", "flags"];

const CSV_FIELD_DESCRIPTIONS: &[(&str, bool, &str)] = &[
    ("scheme", true, "Scheme key, e.g. england-income-tax"),
    (
        "gross",
        true,
        "Gross amount the scheme taxes (income, estate, price, gain, Band D charge)",
    ),
    (
        "other_income",
        false,
        "Other taxable income for shared-band schemes and income tapers",
    ),
    (
        "charitable_gift",
        false,
        "Charitable gift, deducted where the scheme allows",
    ),
    ("flags", false, "Exemption/relief flags"),
];
