pub mod uk;

pub use uk::TaxYear;

use crate::core::{AllowanceRule, BandSchedule, ExemptionFlag, ScheduleError, TaxInput};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Predicate over the raw input record, e.g. "purchase price within the
/// first-time-buyer relief cap".
pub type InputPredicate = fn(&TaxInput) -> bool;

/// Predicate over the input and the taxable base before scheme-specific
/// deductions, e.g. "charitable gift is at least 10% of the net estate".
pub type BasePredicate = fn(&TaxInput, Decimal) -> bool;

/// How an exemption alters a computation. Rules are evaluated in
/// configuration order; `FullRelief` rules short-circuit before any
/// allowance or tier work.
#[derive(Debug, Clone)]
pub enum ExemptionRule {
    /// Flag fixes the liability outright (commonly zero)
    FullRelief {
        flag: ExemptionFlag,
        liability: Decimal,
    },
    /// Flag swaps in an alternative schedule, optionally gated by a
    /// named predicate
    AlternativeSchedule {
        flag: ExemptionFlag,
        schedule: BandSchedule,
        qualifies: Option<InputPredicate>,
    },
    /// Flag adds percentage points to every rate of the selected
    /// schedule; multiple surcharges stack
    Surcharge {
        flag: ExemptionFlag,
        points: Decimal,
    },
    /// Named predicate swaps in a reduced-rate schedule (no flag; the
    /// test is a relation between derived values)
    ReducedRate {
        name: &'static str,
        schedule: BandSchedule,
        qualifies: BasePredicate,
    },
}

/// Single-rate selection for schemes that share a band with other
/// income (CGT): once other taxable income has consumed the shared
/// band, the higher schedule applies to the whole taxable amount.
#[derive(Debug, Clone)]
pub struct SharedBandRule {
    pub band_width: Decimal,
    /// Allowance offset applied to other income before it counts
    /// against the band (the personal allowance for CGT)
    pub income_offset: Decimal,
    pub higher_schedule: BandSchedule,
}

impl SharedBandRule {
    /// How much of the shared band other income has consumed.
    pub fn consumed(&self, input: &TaxInput) -> Decimal {
        (input.other_income - self.income_offset).max(Decimal::ZERO)
    }

    pub fn exhausted(&self, input: &TaxInput) -> bool {
        self.consumed(input) >= self.band_width
    }
}

/// One fiscal scheme for one tax year: schedule, allowances and
/// exemption rules. Constructed once at startup and read-only
/// thereafter; new years or schemes are new entries, not code paths.
#[derive(Debug, Clone)]
pub struct JurisdictionRuleSet {
    pub key: &'static str,
    pub name: &'static str,
    pub tax_year: TaxYear,
    pub schedule: BandSchedule,
    pub allowances: Vec<AllowanceRule>,
    pub exemptions: Vec<ExemptionRule>,
    pub shared_band: Option<SharedBandRule>,
    /// Whether `charitable_gift` is deducted from the taxable base
    pub gift_deductible: bool,
}

impl JurisdictionRuleSet {
    /// Configuration checks beyond what `BandSchedule::new` already
    /// enforces. Runs once at registry construction.
    fn validate(&self) -> Result<(), ConfigurationError> {
        for allowance in &self.allowances {
            if allowance.base < Decimal::ZERO {
                return Err(ConfigurationError::NegativeAllowanceBase {
                    scheme: self.key,
                    allowance: allowance.name,
                    base: allowance.base,
                });
            }
            for taper in &allowance.tapers {
                if taper.rule.divisor.is_zero() {
                    return Err(ConfigurationError::ZeroTaperDivisor {
                        scheme: self.key,
                        allowance: allowance.name,
                    });
                }
            }
        }
        for exemption in &self.exemptions {
            match exemption {
                ExemptionRule::Surcharge { flag, points } if *points < Decimal::ZERO => {
                    return Err(ConfigurationError::NegativeSurcharge {
                        scheme: self.key,
                        flag: flag.display(),
                        points: *points,
                    });
                }
                ExemptionRule::FullRelief { flag, liability }
                    if *liability < Decimal::ZERO =>
                {
                    return Err(ConfigurationError::NegativeFixedLiability {
                        scheme: self.key,
                        flag: flag.display(),
                        liability: *liability,
                    });
                }
                _ => {}
            }
        }
        if let Some(shared) = &self.shared_band {
            if shared.band_width < Decimal::ZERO {
                return Err(ConfigurationError::NegativeSharedBand {
                    scheme: self.key,
                    width: shared.band_width,
                });
            }
        }
        Ok(())
    }
}

/// Malformed registry configuration. Surfaces at startup (or in tests)
/// and is treated as a programming error, never a runtime condition a
/// caller handles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("scheme {scheme}: {source}")]
    Schedule {
        scheme: &'static str,
        source: ScheduleError,
    },
    #[error("scheme {scheme}: allowance {allowance} has zero taper divisor")]
    ZeroTaperDivisor {
        scheme: &'static str,
        allowance: &'static str,
    },
    #[error("scheme {scheme}: allowance {allowance} has negative base {base}")]
    NegativeAllowanceBase {
        scheme: &'static str,
        allowance: &'static str,
        base: Decimal,
    },
    #[error("scheme {scheme}: surcharge for {flag} has negative points {points}")]
    NegativeSurcharge {
        scheme: &'static str,
        flag: &'static str,
        points: Decimal,
    },
    #[error("scheme {scheme}: full relief for {flag} fixes a negative liability {liability}")]
    NegativeFixedLiability {
        scheme: &'static str,
        flag: &'static str,
        liability: Decimal,
    },
    #[error("scheme {scheme}: shared band has negative width {width}")]
    NegativeSharedBand {
        scheme: &'static str,
        width: Decimal,
    },
    #[error("duplicate scheme key `{key}`")]
    DuplicateScheme { key: &'static str },
}

impl ConfigurationError {
    pub(crate) fn schedule(scheme: &'static str) -> impl FnOnce(ScheduleError) -> Self {
        move |source| ConfigurationError::Schedule { scheme, source }
    }
}

/// Read-only scheme registry, built once at startup and shared freely
/// across threads afterwards.
#[derive(Debug, Clone)]
pub struct Registry {
    entries: BTreeMap<&'static str, JurisdictionRuleSet>,
}

impl Registry {
    /// All supported UK schemes for one tax year.
    pub fn uk(year: TaxYear) -> Result<Registry, ConfigurationError> {
        Registry::from_rulesets(uk::rulesets(year)?)
    }

    pub fn from_rulesets(
        rulesets: Vec<JurisdictionRuleSet>,
    ) -> Result<Registry, ConfigurationError> {
        let mut entries = BTreeMap::new();
        for ruleset in rulesets {
            ruleset.validate()?;
            let key = ruleset.key;
            if entries.insert(key, ruleset).is_some() {
                return Err(ConfigurationError::DuplicateScheme { key });
            }
        }
        Ok(Registry { entries })
    }

    pub fn get(&self, key: &str) -> Option<&JurisdictionRuleSet> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &JurisdictionRuleSet> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
