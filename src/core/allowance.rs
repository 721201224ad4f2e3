use super::input::{ExemptionFlag, TaxInput};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// "£1 of allowance lost per `divisor` over `start_threshold`."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaperRule {
    pub start_threshold: Decimal,
    pub divisor: Decimal,
}

/// Which input amount a taper measures against. Tapers frequently
/// reference a different amount than the one the allowance is
/// subtracted from (e.g. the residence nil-rate band tapers on the
/// full estate value).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaperReference {
    Gross,
    OtherIncome,
}

impl TaperReference {
    pub fn amount(&self, input: &TaxInput) -> Decimal {
        match self {
            TaperReference::Gross => input.gross,
            TaperReference::OtherIncome => input.other_income,
        }
    }
}

/// One taper applied to an allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Taper {
    pub reference: TaperReference,
    pub rule: TaperRule,
}

/// Configured allowance. `requires` gates it on an input flag; tapers
/// listed here compose, each reducing the result of the previous one.
/// Independent allowances are separate rules, resolved and summed by
/// `resolve_allowance_set`.
#[derive(Debug, Clone)]
pub struct AllowanceRule {
    pub name: &'static str,
    pub base: Decimal,
    pub requires: Option<ExemptionFlag>,
    pub tapers: Vec<Taper>,
}

impl AllowanceRule {
    pub fn fixed(name: &'static str, base: Decimal) -> AllowanceRule {
        AllowanceRule {
            name,
            base,
            requires: None,
            tapers: Vec::new(),
        }
    }

    pub fn applies_to(&self, input: &TaxInput) -> bool {
        self.requires.map_or(true, |flag| input.has_flag(flag))
    }

    pub fn resolve(&self, input: &TaxInput) -> ResolvedAllowance {
        let amount = self.tapers.iter().fold(self.base, |remaining, taper| {
            resolve_allowance(remaining, taper.reference.amount(input), Some(&taper.rule))
        });
        ResolvedAllowance {
            name: self.name.to_string(),
            base: self.base,
            reduction: self.base - amount,
            amount,
        }
    }
}

/// Resolved amounts for one allowance in one computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ResolvedAllowance {
    pub name: String,
    pub base: Decimal,
    pub reduction: Decimal,
    pub amount: Decimal,
}

/// Core taper arithmetic: reduction is floored to whole currency units
/// and the resolved allowance never goes below zero.
pub fn resolve_allowance(
    base: Decimal,
    reference: Decimal,
    taper: Option<&TaperRule>,
) -> Decimal {
    let base = base.max(Decimal::ZERO);
    match taper {
        None => base,
        Some(rule) => {
            let reduction = if reference > rule.start_threshold {
                ((reference - rule.start_threshold) / rule.divisor).floor()
            } else {
                Decimal::ZERO
            };
            (base - reduction).max(Decimal::ZERO)
        }
    }
}

/// Resolve every applicable allowance independently and sum them.
pub fn resolve_allowance_set(
    rules: &[AllowanceRule],
    input: &TaxInput,
) -> (Decimal, Vec<ResolvedAllowance>) {
    let resolved: Vec<ResolvedAllowance> = rules
        .iter()
        .filter(|rule| rule.applies_to(input))
        .map(|rule| {
            let r = rule.resolve(input);
            log::debug!("allowance {}: {} of {}", r.name, r.amount, r.base);
            r
        })
        .collect();
    let total = resolved.iter().map(|r| r.amount).sum();
    (total, resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};
    use rust_decimal_macros::dec;

    fn pa_taper() -> TaperRule {
        TaperRule {
            start_threshold: dec!(100000),
            divisor: dec!(2),
        }
    }

    #[test]
    fn no_taper_returns_base() {
        assert_eq!(
            resolve_allowance(dec!(12570), dec!(1000000), None),
            dec!(12570)
        );
    }

    #[test]
    fn below_threshold_unreduced() {
        assert_eq!(
            resolve_allowance(dec!(12570), dec!(100000), Some(&pa_taper())),
            dec!(12570)
        );
    }

    #[test]
    fn one_pound_lost_per_two_over() {
        assert_eq!(
            resolve_allowance(dec!(12570), dec!(110000), Some(&pa_taper())),
            dec!(7570)
        );
    }

    #[test]
    fn reduction_floored_to_whole_units() {
        // £3 over the threshold reduces by floor(3/2) = £1
        assert_eq!(
            resolve_allowance(dec!(12570), dec!(100003), Some(&pa_taper())),
            dec!(12569)
        );
    }

    #[test]
    fn fully_tapered_to_zero() {
        assert_eq!(
            resolve_allowance(dec!(12570), dec!(125140), Some(&pa_taper())),
            dec!(0)
        );
        assert_eq!(
            resolve_allowance(dec!(12570), dec!(500000), Some(&pa_taper())),
            dec!(0)
        );
    }

    #[test]
    fn composed_tapers_apply_in_order() {
        let rule = AllowanceRule {
            name: "stacked",
            base: dec!(1000),
            requires: None,
            tapers: vec![
                Taper {
                    reference: TaperReference::Gross,
                    rule: TaperRule {
                        start_threshold: dec!(0),
                        divisor: dec!(1),
                    },
                },
                Taper {
                    reference: TaperReference::OtherIncome,
                    rule: TaperRule {
                        start_threshold: dec!(0),
                        divisor: dec!(1),
                    },
                },
            ],
        };
        let mut input = TaxInput::new(dec!(400));
        input.other_income = dec!(700);
        // 1000 - 400 = 600, then 600 - 700 floors at 0
        assert_eq!(rule.resolve(&input).amount, dec!(0));
    }

    #[test]
    fn gated_allowance_skipped_without_flag() {
        let rules = vec![
            AllowanceRule::fixed("nil-rate-band", dec!(325000)),
            AllowanceRule {
                requires: Some(ExemptionFlag::LeavingToDescendants),
                ..AllowanceRule::fixed("residence-nil-rate-band", dec!(175000))
            },
        ];
        let input = TaxInput::new(dec!(500000));
        let (total, resolved) = resolve_allowance_set(&rules, &input);
        assert_eq!(total, dec!(325000));
        assert_eq!(resolved.len(), 1);

        let flagged = input.with_flag(ExemptionFlag::LeavingToDescendants);
        let (total, resolved) = resolve_allowance_set(&rules, &flagged);
        assert_eq!(total, dec!(500000));
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn set_sums_independent_tapers() {
        let taper = Taper {
            reference: TaperReference::Gross,
            rule: TaperRule {
                start_threshold: dec!(2000000),
                divisor: dec!(2),
            },
        };
        let rules = vec![
            AllowanceRule::fixed("nil-rate-band", dec!(325000)),
            AllowanceRule {
                tapers: vec![taper],
                ..AllowanceRule::fixed("residence-nil-rate-band", dec!(175000))
            },
        ];
        // £2.1m estate: RNRB reduced by 50,000, NRB untouched
        let input = TaxInput::new(dec!(2100000));
        let (total, resolved) = resolve_allowance_set(&rules, &input);
        assert_eq!(resolved[1].amount, dec!(125000));
        assert_eq!(resolved[1].reduction, dec!(50000));
        assert_eq!(total, dec!(450000));
    }

    proptest! {
        #[test]
        fn prop_never_negative(base in 0u64..1_000_000, reference in 0u64..10_000_000) {
            let resolved = resolve_allowance(
                Decimal::from(base),
                Decimal::from(reference),
                Some(&pa_taper()),
            );
            prop_assert!(resolved >= Decimal::ZERO);
        }

        #[test]
        fn prop_monotone_non_increasing(reference in 0u64..10_000_000, step in 0u64..100_000) {
            let lo = resolve_allowance(dec!(12570), Decimal::from(reference), Some(&pa_taper()));
            let hi = resolve_allowance(dec!(12570), Decimal::from(reference + step), Some(&pa_taper()));
            prop_assert!(hi <= lo);
        }
    }
}
