use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Relief/exemption selectors a caller can set on an input record.
/// Which flags a scheme honours is part of its ruleset configuration;
/// unrecognised flags are ignored.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum ExemptionFlag {
    /// Entire estate passes to a surviving spouse or civil partner
    SpouseExemption,
    /// Main residence passes to direct descendants
    LeavingToDescendants,
    /// Unused nil-rate band transferred from a deceased spouse
    TransferredNilRateBand,
    /// Unused residence nil-rate band transferred from a deceased spouse
    TransferredResidenceNilRateBand,
    /// First property purchase
    FirstTimeBuyer,
    /// Purchase of an additional residential property
    AdditionalProperty,
    /// Purchaser is not UK resident
    NonResident,
}

impl ExemptionFlag {
    pub fn display(&self) -> &'static str {
        match self {
            ExemptionFlag::SpouseExemption => "spouse-exemption",
            ExemptionFlag::LeavingToDescendants => "leaving-to-descendants",
            ExemptionFlag::TransferredNilRateBand => "transferred-nil-rate-band",
            ExemptionFlag::TransferredResidenceNilRateBand => {
                "transferred-residence-nil-rate-band"
            }
            ExemptionFlag::FirstTimeBuyer => "first-time-buyer",
            ExemptionFlag::AdditionalProperty => "additional-property",
            ExemptionFlag::NonResident => "non-resident",
        }
    }

    pub fn from_key(s: &str) -> Option<ExemptionFlag> {
        match s.to_lowercase().as_str() {
            "spouse-exemption" => Some(ExemptionFlag::SpouseExemption),
            "leaving-to-descendants" => Some(ExemptionFlag::LeavingToDescendants),
            "transferred-nil-rate-band" => Some(ExemptionFlag::TransferredNilRateBand),
            "transferred-residence-nil-rate-band" => {
                Some(ExemptionFlag::TransferredResidenceNilRateBand)
            }
            "first-time-buyer" => Some(ExemptionFlag::FirstTimeBuyer),
            "additional-property" => Some(ExemptionFlag::AdditionalProperty),
            "non-resident" => Some(ExemptionFlag::NonResident),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExemptionFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// Normalized input record for one computation. `gross` is whatever the
/// scheme taxes: income, estate value, purchase price, disposal gain or
/// Band D charge. Everything else defaults to empty so callers supply
/// only what their scheme uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TaxInput {
    pub gross: Decimal,
    /// Other taxable income, read by shared-band schemes and any
    /// income-referenced taper
    #[serde(default)]
    pub other_income: Decimal,
    /// Charitable gift, deducted from the taxable base where the scheme
    /// allows it
    #[serde(default)]
    pub charitable_gift: Decimal,
    #[serde(default)]
    pub flags: Vec<ExemptionFlag>,
}

impl TaxInput {
    pub fn new(gross: Decimal) -> TaxInput {
        TaxInput {
            gross,
            other_income: Decimal::ZERO,
            charitable_gift: Decimal::ZERO,
            flags: Vec::new(),
        }
    }

    pub fn with_flag(mut self, flag: ExemptionFlag) -> TaxInput {
        self.flags.push(flag);
        self
    }

    pub fn has_flag(&self, flag: ExemptionFlag) -> bool {
        self.flags.contains(&flag)
    }

    /// Per-request validation. Everything downstream assumes these
    /// hold, so a failure here stops the pipeline before any arithmetic.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("gross", self.gross),
            ("other_income", self.other_income),
            ("charitable_gift", self.charitable_gift),
        ] {
            if value < Decimal::ZERO {
                return Err(ValidationError::NegativeAmount { field, value });
            }
        }
        if self.charitable_gift > self.gross {
            return Err(ValidationError::GiftExceedsGross {
                gift: self.charitable_gift,
                gross: self.gross,
            });
        }
        Ok(())
    }
}

/// Malformed per-request input. Returned, never panicked, so callers
/// can render the offending field without a crash path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must not be negative: {value}")]
    NegativeAmount { field: &'static str, value: Decimal },
    #[error("charitable_gift ({gift}) exceeds gross ({gross})")]
    GiftExceedsGross { gift: Decimal, gross: Decimal },
    #[error("unknown scheme `{key}`")]
    UnknownScheme { key: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn valid_input_passes() {
        let input = TaxInput::new(dec!(60000));
        assert!(input.validate().is_ok());
    }

    #[test]
    fn negative_gross_rejected() {
        let input = TaxInput::new(dec!(-1));
        assert_eq!(
            input.validate(),
            Err(ValidationError::NegativeAmount {
                field: "gross",
                value: dec!(-1),
            })
        );
    }

    #[test]
    fn negative_other_income_rejected() {
        let mut input = TaxInput::new(dec!(100));
        input.other_income = dec!(-50);
        assert!(matches!(
            input.validate(),
            Err(ValidationError::NegativeAmount {
                field: "other_income",
                ..
            })
        ));
    }

    #[test]
    fn gift_exceeding_gross_rejected() {
        let mut input = TaxInput::new(dec!(100000));
        input.charitable_gift = dec!(100001);
        assert!(matches!(
            input.validate(),
            Err(ValidationError::GiftExceedsGross { .. })
        ));
    }

    #[test]
    fn gift_equal_to_gross_allowed() {
        let mut input = TaxInput::new(dec!(100000));
        input.charitable_gift = dec!(100000);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn flags_default_empty_in_json() {
        let input: TaxInput = serde_json::from_str(r#"{"gross":"500000"}"#).unwrap();
        assert_eq!(input.gross, dec!(500000));
        assert!(input.flags.is_empty());
        assert_eq!(input.other_income, dec!(0));
    }

    #[test]
    fn flags_round_trip_kebab_case() {
        let json = r#"{"gross":"1","flags":["spouse-exemption","first-time-buyer"]}"#;
        let input: TaxInput = serde_json::from_str(json).unwrap();
        assert!(input.has_flag(ExemptionFlag::SpouseExemption));
        assert!(input.has_flag(ExemptionFlag::FirstTimeBuyer));
        assert!(!input.has_flag(ExemptionFlag::NonResident));
    }

    #[test]
    fn flag_from_key() {
        assert_eq!(
            ExemptionFlag::from_key("Spouse-Exemption"),
            Some(ExemptionFlag::SpouseExemption)
        );
        assert_eq!(ExemptionFlag::from_key("unknown"), None);
    }
}
