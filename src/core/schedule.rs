use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One marginal rate band: the slice of an amount between `from` and `to`
/// is taxed at `rate`. `to == None` means unbounded, legal on the last
/// tier only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Tier {
    pub from: Decimal,
    pub to: Option<Decimal>,
    pub rate: Decimal,
}

impl Tier {
    pub fn bounded(from: Decimal, to: Decimal, rate: Decimal) -> Tier {
        Tier {
            from,
            to: Some(to),
            rate,
        }
    }

    /// Final tier of a schedule, absorbing everything above `from`.
    pub fn open(from: Decimal, rate: Decimal) -> Tier {
        Tier {
            from,
            to: None,
            rate,
        }
    }
}

/// Malformed schedule detected at construction time. Schedules are
/// authored in the registry, so this is a programming error and fails
/// at startup, never at request time.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("schedule has no tiers")]
    Empty,
    #[error("first tier must start at 0, starts at {from}")]
    FirstTierNonZero { from: Decimal },
    #[error("tier starting at {from} has upper bound {to} below its lower bound")]
    InvertedTier { from: Decimal, to: Decimal },
    #[error("tiers are not contiguous: tier ends at {expected}, next starts at {found}")]
    Gap { expected: Decimal, found: Decimal },
    #[error("unbounded tier starting at {from} is not the last tier")]
    OpenTierNotLast { from: Decimal },
    #[error("last tier (from {from}) must be unbounded")]
    BoundedLastTier { from: Decimal },
    #[error("tier starting at {from} has negative rate {rate}")]
    NegativeRate { from: Decimal, rate: Decimal },
}

/// Ordered, contiguous sequence of marginal rate tiers. Validated once
/// on construction and never mutated; the tiered calculator assumes a
/// well-formed schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct BandSchedule {
    tiers: Vec<Tier>,
}

impl BandSchedule {
    pub fn new(tiers: Vec<Tier>) -> Result<BandSchedule, ScheduleError> {
        let first = tiers.first().ok_or(ScheduleError::Empty)?;
        if !first.from.is_zero() {
            return Err(ScheduleError::FirstTierNonZero { from: first.from });
        }
        for (i, tier) in tiers.iter().enumerate() {
            if tier.rate < Decimal::ZERO {
                return Err(ScheduleError::NegativeRate {
                    from: tier.from,
                    rate: tier.rate,
                });
            }
            let last = i == tiers.len() - 1;
            match tier.to {
                Some(to) if to < tier.from => {
                    return Err(ScheduleError::InvertedTier { from: tier.from, to });
                }
                Some(_) if last => {
                    return Err(ScheduleError::BoundedLastTier { from: tier.from });
                }
                Some(to) => {
                    let next = tiers[i + 1].from;
                    if next != to {
                        return Err(ScheduleError::Gap {
                            expected: to,
                            found: next,
                        });
                    }
                }
                None if !last => return Err(ScheduleError::OpenTierNotLast { from: tier.from }),
                None => {}
            }
        }
        Ok(BandSchedule { tiers })
    }

    /// Flat-rate schedule: a single unbounded tier from 0.
    pub fn flat(rate: Decimal) -> BandSchedule {
        BandSchedule {
            tiers: vec![Tier::open(Decimal::ZERO, rate)],
        }
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn top_rate(&self) -> Decimal {
        self.tiers
            .iter()
            .map(|t| t.rate)
            .max()
            .unwrap_or(Decimal::ZERO)
    }

    /// Same boundaries with `points` added to every rate (e.g. the SDLT
    /// additional-property and non-resident surcharges). Points are
    /// validated non-negative at registry construction, so the result
    /// is still a well-formed schedule.
    pub fn with_surcharge(&self, points: Decimal) -> BandSchedule {
        BandSchedule {
            tiers: self
                .tiers
                .iter()
                .map(|t| Tier {
                    from: t.from,
                    to: t.to,
                    rate: t.rate + points,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn two_tier() -> BandSchedule {
        BandSchedule::new(vec![
            Tier::bounded(dec!(0), dec!(250000), dec!(0)),
            Tier::open(dec!(250000), dec!(0.05)),
        ])
        .unwrap()
    }

    #[test]
    fn valid_schedule_accepted() {
        let schedule = two_tier();
        assert_eq!(schedule.tiers().len(), 2);
        assert_eq!(schedule.top_rate(), dec!(0.05));
    }

    #[test]
    fn empty_schedule_rejected() {
        assert_eq!(BandSchedule::new(vec![]), Err(ScheduleError::Empty));
    }

    #[test]
    fn first_tier_must_start_at_zero() {
        let err = BandSchedule::new(vec![Tier::open(dec!(100), dec!(0.2))]);
        assert_eq!(
            err,
            Err(ScheduleError::FirstTierNonZero { from: dec!(100) })
        );
    }

    #[test]
    fn gap_between_tiers_rejected() {
        let err = BandSchedule::new(vec![
            Tier::bounded(dec!(0), dec!(100), dec!(0.1)),
            Tier::open(dec!(200), dec!(0.2)),
        ]);
        assert_eq!(
            err,
            Err(ScheduleError::Gap {
                expected: dec!(100),
                found: dec!(200),
            })
        );
    }

    #[test]
    fn bounded_last_tier_rejected() {
        let err = BandSchedule::new(vec![Tier::bounded(dec!(0), dec!(100), dec!(0.1))]);
        assert!(matches!(err, Err(ScheduleError::BoundedLastTier { .. })));
    }

    #[test]
    fn open_tier_must_be_last() {
        let err = BandSchedule::new(vec![
            Tier::open(dec!(0), dec!(0.1)),
            Tier::open(dec!(100), dec!(0.2)),
        ]);
        assert_eq!(err, Err(ScheduleError::OpenTierNotLast { from: dec!(0) }));
    }

    #[test]
    fn negative_rate_rejected() {
        let err = BandSchedule::new(vec![Tier::open(dec!(0), dec!(-0.1))]);
        assert!(matches!(err, Err(ScheduleError::NegativeRate { .. })));
    }

    #[test]
    fn inverted_tier_rejected() {
        let err = BandSchedule::new(vec![
            Tier::bounded(dec!(0), dec!(-50), dec!(0.1)),
            Tier::open(dec!(-50), dec!(0.2)),
        ]);
        assert!(matches!(err, Err(ScheduleError::InvertedTier { .. })));
    }

    #[test]
    fn zero_width_tier_allowed() {
        // Collapsed basic band, e.g. shared band fully consumed.
        let schedule = BandSchedule::new(vec![
            Tier::bounded(dec!(0), dec!(0), dec!(0.1)),
            Tier::open(dec!(0), dec!(0.2)),
        ]);
        assert!(schedule.is_ok());
    }

    #[test]
    fn rates_need_not_increase() {
        // NI employee rates step down above the upper earnings limit.
        let schedule = BandSchedule::new(vec![
            Tier::bounded(dec!(0), dec!(12570), dec!(0)),
            Tier::bounded(dec!(12570), dec!(50270), dec!(0.08)),
            Tier::open(dec!(50270), dec!(0.02)),
        ]);
        assert!(schedule.is_ok());
    }

    #[test]
    fn surcharge_adds_points_to_every_rate() {
        let surcharged = two_tier().with_surcharge(dec!(0.02));
        assert_eq!(surcharged.tiers()[0].rate, dec!(0.02));
        assert_eq!(surcharged.tiers()[1].rate, dec!(0.07));
    }

    #[test]
    fn flat_schedule_is_single_open_tier() {
        let schedule = BandSchedule::flat(dec!(0.4));
        assert_eq!(schedule.tiers().len(), 1);
        assert_eq!(schedule.tiers()[0].to, None);
    }
}
