//! Composite computation pipeline: validate → exemption short-circuit →
//! allowance resolution → taxable-base derivation → rate selection →
//! tiered calculation → derived metrics.

use crate::core::{
    compute_tiered, resolve_allowance_set, BandSchedule, TaxComputation, TaxInput,
    ValidationError,
};
use crate::rules::{ExemptionRule, JurisdictionRuleSet, Registry};
use rust_decimal::Decimal;

/// Owns the read-only scheme registry. Any number of callers may
/// compute concurrently; every call only reads configuration and
/// allocates its own result.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Registry,
}

impl Engine {
    pub fn new(registry: Registry) -> Engine {
        Engine { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn compute(&self, key: &str, input: &TaxInput) -> Result<TaxComputation, ValidationError> {
        let rules = self
            .registry
            .get(key)
            .ok_or_else(|| ValidationError::UnknownScheme {
                key: key.to_string(),
            })?;
        compute(input, rules)
    }
}

/// Run the full pipeline for one input against one scheme. Pure and
/// deterministic: identical input produces an identical result.
pub fn compute(
    input: &TaxInput,
    rules: &JurisdictionRuleSet,
) -> Result<TaxComputation, ValidationError> {
    input.validate()?;

    // Exemptions that fully determine the outcome fire before any
    // allowance or tier work.
    for exemption in &rules.exemptions {
        if let ExemptionRule::FullRelief { flag, liability } = exemption {
            if input.has_flag(*flag) {
                log::debug!("{}: full relief via {}", rules.key, flag.display());
                return Ok(fixed_outcome(input, rules, *liability, flag.display()));
            }
        }
    }

    let (total_allowance, allowances) = resolve_allowance_set(&rules.allowances, input);

    // Scheme-specific deductions come after the allowances; the
    // pre-deduction base feeds the reduced-rate predicate below.
    let base_before_gift = (input.gross - total_allowance).max(Decimal::ZERO);
    let gift = if rules.gift_deductible {
        input.charitable_gift
    } else {
        Decimal::ZERO
    };
    let taxable_base = (base_before_gift - gift).max(Decimal::ZERO);
    log::debug!(
        "{}: gross {} - allowances {} - deductions {} = taxable {}",
        rules.key,
        input.gross,
        total_allowance,
        gift,
        taxable_base
    );

    let (schedule, exemptions) = select_schedule(rules, input, base_before_gift);
    let outcome = compute_tiered(taxable_base, &schedule);

    let tax_due = to_pounds_pence(outcome.total);
    Ok(TaxComputation {
        scheme: rules.key.to_string(),
        tax_year: rules.tax_year.display(),
        gross: input.gross,
        allowances,
        total_allowance,
        taxable_base,
        bands: outcome.contributions.iter().map(|c| c.rounded()).collect(),
        exemptions,
        tax_due,
        effective_rate: effective_rate(outcome.total, input.gross),
        net: (input.gross - tax_due).max(Decimal::ZERO),
    })
}

/// Pick the schedule for this input: shared-band escalation first, then
/// flag-driven alternative schedules, reduced-rate predicates and
/// surcharges in configuration order.
fn select_schedule(
    rules: &JurisdictionRuleSet,
    input: &TaxInput,
    base_before_gift: Decimal,
) -> (BandSchedule, Vec<String>) {
    let mut schedule = rules.schedule.clone();
    let mut applied = Vec::new();

    if let Some(shared) = &rules.shared_band {
        if shared.exhausted(input) {
            log::debug!(
                "{}: shared band consumed ({} of {})",
                rules.key,
                shared.consumed(input),
                shared.band_width
            );
            schedule = shared.higher_schedule.clone();
        }
    }

    for exemption in &rules.exemptions {
        match exemption {
            ExemptionRule::AlternativeSchedule {
                flag,
                schedule: alternative,
                qualifies,
            } if input.has_flag(*flag) => {
                if qualifies.map_or(true, |q| q(input)) {
                    schedule = alternative.clone();
                    applied.push(flag.display().to_string());
                }
            }
            ExemptionRule::ReducedRate {
                name,
                schedule: reduced,
                qualifies,
            } if qualifies(input, base_before_gift) => {
                schedule = reduced.clone();
                applied.push(name.to_string());
            }
            ExemptionRule::Surcharge { flag, points } if input.has_flag(*flag) => {
                schedule = schedule.with_surcharge(*points);
                applied.push(flag.display().to_string());
            }
            _ => {}
        }
    }

    (schedule, applied)
}

fn fixed_outcome(
    input: &TaxInput,
    rules: &JurisdictionRuleSet,
    liability: Decimal,
    exemption: &str,
) -> TaxComputation {
    let tax_due = to_pounds_pence(liability);
    TaxComputation {
        scheme: rules.key.to_string(),
        tax_year: rules.tax_year.display(),
        gross: input.gross,
        allowances: Vec::new(),
        total_allowance: Decimal::ZERO,
        taxable_base: Decimal::ZERO,
        bands: Vec::new(),
        exemptions: vec![exemption.to_string()],
        tax_due,
        effective_rate: effective_rate(liability, input.gross),
        net: (input.gross - tax_due).max(Decimal::ZERO),
    }
}

/// Round to the minor currency unit with a fixed two-decimal scale, so
/// serialized amounts always read "0.00" rather than "0".
fn to_pounds_pence(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp(2);
    rounded.rescale(2);
    rounded
}

/// Liability over gross, guarded for a zero denominator.
fn effective_rate(tax: Decimal, gross: Decimal) -> Decimal {
    if gross.is_zero() {
        Decimal::ZERO
    } else {
        (tax / gross).round_dp(4)
    }
}
