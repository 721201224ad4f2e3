use super::schedule::BandSchedule;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::Serialize;

/// The slice of an amount falling within one band, and the tax on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct TierContribution {
    pub from: Decimal,
    pub to: Option<Decimal>,
    pub rate: Decimal,
    pub amount: Decimal,
    pub tax: Decimal,
}

impl TierContribution {
    /// Copy with amount and tax rounded to the minor currency unit.
    /// Display only; the precise total is summed before any rounding.
    pub fn rounded(&self) -> TierContribution {
        let mut amount = self.amount.round_dp(2);
        amount.rescale(2);
        let mut tax = self.tax.round_dp(2);
        tax.rescale(2);
        TierContribution {
            amount,
            tax,
            ..self.clone()
        }
    }
}

/// Marginal-rate breakdown of one amount. `total` is the full-precision
/// sum of the contributions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TieredOutcome {
    pub total: Decimal,
    pub contributions: Vec<TierContribution>,
}

/// Apply a band schedule to an amount. Negative amounts clamp to zero
/// rather than erroring; the caller is expected to have validated
/// upstream. Tiers the amount does not reach are omitted from the
/// breakdown.
pub fn compute_tiered(amount: Decimal, schedule: &BandSchedule) -> TieredOutcome {
    let amount = amount.max(Decimal::ZERO);
    let mut total = Decimal::ZERO;
    let mut contributions = Vec::new();

    for tier in schedule.tiers() {
        if amount <= tier.from {
            break;
        }
        let upper = tier.to.map_or(amount, |to| to.min(amount));
        let slice = upper - tier.from;
        if slice <= Decimal::ZERO {
            // zero-width tier
            continue;
        }
        let tax = slice * tier.rate;
        total += tax;
        log::debug!(
            "tier {}..{}: {} @ {} = {}",
            tier.from,
            tier.to.map_or("∞".to_string(), |t| t.to_string()),
            slice,
            tier.rate,
            tax
        );
        contributions.push(TierContribution {
            from: tier.from,
            to: tier.to,
            rate: tier.rate,
            amount: slice,
            tax,
        });
    }

    TieredOutcome {
        total,
        contributions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schedule::Tier;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use rust_decimal_macros::dec;

    fn income_schedule() -> BandSchedule {
        BandSchedule::new(vec![
            Tier::bounded(dec!(0), dec!(37700), dec!(0.20)),
            Tier::bounded(dec!(37700), dec!(125140), dec!(0.40)),
            Tier::open(dec!(125140), dec!(0.45)),
        ])
        .unwrap()
    }

    #[test]
    fn zero_amount_empty_breakdown() {
        let outcome = compute_tiered(dec!(0), &income_schedule());
        assert_eq!(outcome.total, dec!(0));
        assert!(outcome.contributions.is_empty());
    }

    #[test]
    fn negative_amount_clamped_to_zero() {
        let outcome = compute_tiered(dec!(-500), &income_schedule());
        assert_eq!(outcome.total, dec!(0));
        assert!(outcome.contributions.is_empty());
    }

    #[test]
    fn amount_within_first_tier_is_linear() {
        let outcome = compute_tiered(dec!(10000), &income_schedule());
        assert_eq!(outcome.total, dec!(10000) * dec!(0.20));
        assert_eq!(outcome.contributions.len(), 1);
        assert_eq!(outcome.contributions[0].amount, dec!(10000));
    }

    #[test]
    fn amount_spanning_two_tiers() {
        // 37,700 @ 20% + 9,730 @ 40%
        let outcome = compute_tiered(dec!(47430), &income_schedule());
        assert_eq!(outcome.total, dec!(7540) + dec!(3892));
        assert_eq!(outcome.contributions.len(), 2);
        assert_eq!(outcome.contributions[1].amount, dec!(9730));
    }

    #[test]
    fn top_tier_absorbs_remainder() {
        let outcome = compute_tiered(dec!(1000000), &income_schedule());
        let expected =
            dec!(37700) * dec!(0.20) + (dec!(125140) - dec!(37700)) * dec!(0.40)
                + (dec!(1000000) - dec!(125140)) * dec!(0.45);
        assert_eq!(outcome.total, expected);
        assert_eq!(outcome.contributions.len(), 3);
        assert_eq!(outcome.contributions[2].to, None);
    }

    #[test]
    fn boundary_amount_does_not_enter_next_tier() {
        let outcome = compute_tiered(dec!(37700), &income_schedule());
        assert_eq!(outcome.contributions.len(), 1);
        assert_eq!(outcome.total, dec!(7540));
    }

    #[test]
    fn zero_width_tier_contributes_nothing() {
        let schedule = BandSchedule::new(vec![
            Tier::bounded(dec!(0), dec!(0), dec!(0.10)),
            Tier::open(dec!(0), dec!(0.20)),
        ])
        .unwrap();
        let outcome = compute_tiered(dec!(100), &schedule);
        assert_eq!(outcome.total, dec!(20));
        assert_eq!(outcome.contributions.len(), 1);
    }

    #[test]
    fn rounded_contribution_keeps_bounds() {
        let outcome = compute_tiered(dec!(100.555), &BandSchedule::flat(dec!(0.333)));
        let rounded = outcome.contributions[0].rounded();
        assert_eq!(rounded.tax, (dec!(100.555) * dec!(0.333)).round_dp(2));
        assert_eq!(rounded.from, dec!(0));
    }

    proptest! {
        #[test]
        fn prop_contributions_sum_to_total(amount in 0u64..10_000_000) {
            let outcome = compute_tiered(Decimal::from(amount), &income_schedule());
            let sum: Decimal = outcome.contributions.iter().map(|c| c.tax).sum();
            prop_assert_eq!(sum, outcome.total);
        }

        #[test]
        fn prop_total_non_decreasing(amount in 0u64..10_000_000, step in 1u64..50_000) {
            let schedule = income_schedule();
            let lo = compute_tiered(Decimal::from(amount), &schedule);
            let hi = compute_tiered(Decimal::from(amount + step), &schedule);
            prop_assert!(hi.total >= lo.total);
        }

        #[test]
        fn prop_marginal_step_bounded_by_top_rate(amount in 0u64..10_000_000, step in 1u64..50_000) {
            // Crossing a boundary never re-rates what sits below it.
            let schedule = income_schedule();
            let lo = compute_tiered(Decimal::from(amount), &schedule);
            let hi = compute_tiered(Decimal::from(amount + step), &schedule);
            prop_assert!(hi.total - lo.total <= Decimal::from(step) * schedule.top_rate());
        }

        #[test]
        fn prop_first_tier_exact(amount in 0u64..37_700) {
            let outcome = compute_tiered(Decimal::from(amount), &income_schedule());
            prop_assert_eq!(outcome.total, Decimal::from(amount) * dec!(0.20));
        }
    }
}
