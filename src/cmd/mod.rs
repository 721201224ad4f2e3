pub mod batch;
pub mod compute;
pub mod schema;
pub mod schemes;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Format an amount in GBP to the minor unit.
pub fn format_gbp(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    if rounded < Decimal::ZERO {
        format!("-£{:.2}", -rounded)
    } else {
        format!("£{:.2}", rounded)
    }
}

/// Format a ratio as a percentage, e.g. 0.1905 -> "19.05%".
pub fn format_pct(rate: Decimal) -> String {
    format!("{:.2}%", (rate * dec!(100)).round_dp(2))
}

pub fn write_csv<I, R, W>(records: I, writer: W) -> anyhow::Result<()>
where
    I: IntoIterator<Item = R>,
    R: serde::Serialize,
    W: std::io::Write,
{
    let mut wtr = csv::Writer::from_writer(writer);
    for record in records.into_iter() {
        wtr.serialize(record)?;
    }
    wtr.flush()?;
    Ok(())
}
