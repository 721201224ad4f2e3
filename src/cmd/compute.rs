//! Compute command - run one input record through a configured scheme

use crate::cmd::{format_gbp, format_pct};
use crate::core::{ExemptionFlag, TaxComputation, TaxInput};
use crate::engine::Engine;
use crate::rules::{Registry, TaxYear};
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

#[derive(Args, Debug)]
pub struct ComputeCommand {
    /// Scheme key, e.g. england-income-tax (see `schemes`)
    #[arg(short, long)]
    scheme: String,

    /// Tax year end (e.g. 2025 for 2024/25)
    #[arg(short, long, default_value_t = 2025)]
    year: i32,

    /// Derive the tax year from a calendar date instead (YYYY-MM-DD)
    #[arg(long, conflicts_with = "year")]
    date: Option<NaiveDate>,

    /// Gross amount the scheme taxes (income, estate value, purchase
    /// price, gain, Band D charge)
    #[arg(short, long, allow_negative_numbers = true)]
    gross: Option<Decimal>,

    /// Other taxable income, for shared-band schemes and income tapers
    #[arg(long, default_value_t = Decimal::ZERO, allow_negative_numbers = true)]
    other_income: Decimal,

    /// Charitable gift, deducted where the scheme allows
    #[arg(long, default_value_t = Decimal::ZERO, allow_negative_numbers = true)]
    charitable_gift: Decimal,

    /// Exemption/relief flags
    #[arg(short, long, value_enum, value_delimiter = ',')]
    flags: Vec<ExemptionFlag>,

    /// Read the input record as JSON from a file (or stdin with "-")
    #[arg(
        short,
        long,
        conflicts_with_all = ["gross", "other_income", "charitable_gift", "flags"]
    )]
    input: Option<PathBuf>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

#[derive(Tabled)]
struct BandRow {
    #[tabled(rename = "Band")]
    band: String,
    #[tabled(rename = "Rate")]
    rate: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Tax")]
    tax: String,
}

impl ComputeCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let year = self.date.map(TaxYear::from_date).unwrap_or(TaxYear(self.year));
        let engine = Engine::new(Registry::uk(year)?);
        let input = self.read_input()?;

        match engine.compute(&self.scheme, &input) {
            Ok(result) => {
                if self.json {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                } else {
                    print_result(&result);
                }
                Ok(())
            }
            Err(e) => anyhow::bail!("invalid input: {e}"),
        }
    }

    fn read_input(&self) -> anyhow::Result<TaxInput> {
        match &self.input {
            Some(path) if path.as_os_str() == "-" => read_json(BufReader::new(io::stdin().lock())),
            Some(path) => read_json_file(path),
            None => {
                let gross = self
                    .gross
                    .ok_or_else(|| anyhow::anyhow!("either --gross or --input is required"))?;
                Ok(TaxInput {
                    gross,
                    other_income: self.other_income,
                    charitable_gift: self.charitable_gift,
                    flags: self.flags.clone(),
                })
            }
        }
    }
}

fn read_json_file(path: &Path) -> anyhow::Result<TaxInput> {
    let file = File::open(path)?;
    read_json(BufReader::new(file))
}

fn read_json<R: Read>(mut reader: R) -> anyhow::Result<TaxInput> {
    let mut buffer = String::new();
    reader.read_to_string(&mut buffer)?;
    if buffer.trim().is_empty() {
        anyhow::bail!("No input received. Provide a file or pipe data to stdin.");
    }
    Ok(serde_json::from_str(&buffer)?)
}

fn print_result(result: &TaxComputation) {
    println!();
    println!("SCHEME {} ({})", result.scheme, result.tax_year);
    println!("Gross: {}", format_gbp(result.gross));
    println!();

    if !result.allowances.is_empty() {
        println!("ALLOWANCES");
        for allowance in &result.allowances {
            if allowance.reduction.is_zero() {
                println!("  {}: {}", allowance.name, format_gbp(allowance.amount));
            } else {
                println!(
                    "  {}: {} (reduced from {} by taper)",
                    allowance.name,
                    format_gbp(allowance.amount),
                    format_gbp(allowance.base)
                );
            }
        }
        println!("  Total: {}", format_gbp(result.total_allowance));
        println!();
    }

    println!("Taxable: {}", format_gbp(result.taxable_base));

    if !result.bands.is_empty() {
        let rows: Vec<BandRow> = result
            .bands
            .iter()
            .map(|band| BandRow {
                band: match band.to {
                    Some(to) => format!("{} - {}", format_gbp(band.from), format_gbp(to)),
                    None => format!("{} +", format_gbp(band.from)),
                },
                rate: format_pct(band.rate),
                amount: format_gbp(band.amount),
                tax: format_gbp(band.tax),
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::sharp()));
    }

    if !result.exemptions.is_empty() {
        println!("Exemptions applied: {}", result.exemptions.join(", "));
    }

    println!();
    println!(
        "TAX DUE: {} | Effective rate: {} | Net: {}",
        format_gbp(result.tax_due),
        format_pct(result.effective_rate),
        format_gbp(result.net)
    );
    println!();
}
