//! Schemes command - list the configured jurisdiction rulesets

use crate::cmd::format_pct;
use crate::rules::{Registry, TaxYear};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

#[derive(Args, Debug)]
pub struct SchemesCommand {
    /// Tax year end (e.g. 2025 for 2024/25)
    #[arg(short, long, default_value_t = 2025)]
    year: i32,
}

#[derive(Tabled)]
struct SchemeRow {
    #[tabled(rename = "Key")]
    key: &'static str,
    #[tabled(rename = "Name")]
    name: &'static str,
    #[tabled(rename = "Year")]
    year: String,
    #[tabled(rename = "Bands")]
    bands: usize,
    #[tabled(rename = "Top rate")]
    top_rate: String,
    #[tabled(rename = "Allowances")]
    allowances: usize,
}

impl SchemesCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let registry = Registry::uk(TaxYear(self.year))?;
        let rows: Vec<SchemeRow> = registry
            .iter()
            .map(|ruleset| SchemeRow {
                key: ruleset.key,
                name: ruleset.name,
                year: ruleset.tax_year.display(),
                bands: ruleset.schedule.tiers().len(),
                top_rate: format_pct(ruleset.schedule.top_rate()),
                allowances: ruleset.allowances.len(),
            })
            .collect();
        println!("{}", Table::new(rows).with(Style::sharp()));
        Ok(())
    }
}
