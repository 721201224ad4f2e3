use super::allowance::ResolvedAllowance;
use super::tiered::TierContribution;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Serialize;

/// Full breakdown of one computation, in the same unit as the input
/// and with no locale formatting. Built fresh per call and never
/// stored by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct TaxComputation {
    pub scheme: String,
    /// Tax year in "2024/25" form
    pub tax_year: String,
    pub gross: Decimal,
    pub allowances: Vec<ResolvedAllowance>,
    pub total_allowance: Decimal,
    pub taxable_base: Decimal,
    /// Band slices rounded for display; `tax_due` is rounded from the
    /// full-precision sum, so the rounded slices may differ by a penny
    pub bands: Vec<TierContribution>,
    /// Names of exemptions/reliefs that fired, in the order applied
    pub exemptions: Vec<String>,
    /// Total liability, rounded to the minor currency unit
    pub tax_due: Decimal,
    /// Liability over gross to 4 dp, from the full-precision total;
    /// 0 when gross is 0
    pub effective_rate: Decimal,
    /// Gross minus liability, floored at zero
    pub net: Decimal,
}
