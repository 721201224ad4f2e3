use super::{ExemptionRule, JurisdictionRuleSet, SharedBandRule};
use crate::core::{
    AllowanceRule, BandSchedule, ExemptionFlag, Taper, TaperReference, TaperRule, TaxInput, Tier,
};
use crate::rules::ConfigurationError;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// UK Tax Year (runs 6 April to 5 April)
/// The year value represents the end year (e.g., 2025 = 2024/25 tax year)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaxYear(pub i32);

impl TaxYear {
    /// Create a tax year from a date
    pub fn from_date(date: NaiveDate) -> Self {
        let year = date.year();
        // Tax year starts 6 April
        if date >= NaiveDate::from_ymd_opt(year, 4, 6).unwrap() {
            TaxYear(year + 1)
        } else {
            TaxYear(year)
        }
    }

    /// Start date of the tax year (6 April of previous year)
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0 - 1, 4, 6).unwrap()
    }

    /// End date of the tax year (5 April)
    pub fn end_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.0, 4, 5).unwrap()
    }

    /// Display as "2024/25" format
    pub fn display(&self) -> String {
        format!("{}/{}", self.0 - 1, self.0 % 100)
    }

    /// Income tax personal allowance (frozen since 2021/22)
    pub fn personal_allowance(&self) -> Decimal {
        dec!(12570)
    }

    /// Width of the basic rate band above the personal allowance
    pub fn basic_rate_limit(&self) -> Decimal {
        dec!(37700)
    }

    /// CGT annual exempt amount for this tax year
    pub fn cgt_exempt_amount(&self) -> Decimal {
        match self.0 {
            // 2024/25 onwards: £3,000
            2025.. => dec!(3000),
            // 2023/24: £6,000
            2024 => dec!(6000),
            // Earlier years: £12,300
            _ => dec!(12300),
        }
    }

    /// Class 1 employee NI main rate for this tax year
    pub fn ni_employee_main_rate(&self) -> Decimal {
        match self.0 {
            // 2024/25 onwards: 8%
            2025.. => dec!(0.08),
            // 2023/24 and earlier: 12% (ignoring the mid-year 10% cut)
            _ => dec!(0.12),
        }
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

/// First-time-buyer relief is withdrawn entirely above £625,000.
pub fn first_time_buyer_qualifies(input: &TaxInput) -> bool {
    input.gross <= dec!(625000)
}

/// Reduced 36% IHT rate applies when the charitable gift is at least
/// 10% of the net estate. The net estate here is the baseline computed
/// before the gift itself is deducted; changing that order changes
/// which estates qualify.
pub fn charity_rate_qualifies(input: &TaxInput, base_before_gift: Decimal) -> bool {
    !input.charitable_gift.is_zero() && input.charitable_gift * dec!(10) >= base_before_gift
}

/// Every supported UK scheme for one tax year.
pub fn rulesets(year: TaxYear) -> Result<Vec<JurisdictionRuleSet>, ConfigurationError> {
    let mut all = vec![
        england_income_tax(year)?,
        scotland_income_tax(year)?,
        ni_employee(year)?,
        ni_employer(year)?,
        inheritance_tax(year)?,
        sdlt_residential(year)?,
        cgt(year, CgtAssets::Other)?,
        cgt(year, CgtAssets::Property)?,
    ];
    all.extend(council_tax(year)?);
    Ok(all)
}

fn personal_allowance_rule(year: TaxYear) -> AllowanceRule {
    AllowanceRule {
        name: "personal-allowance",
        base: year.personal_allowance(),
        requires: None,
        // £1 lost per £2 of income over £100,000
        tapers: vec![Taper {
            reference: TaperReference::Gross,
            rule: TaperRule {
                start_threshold: dec!(100000),
                divisor: dec!(2),
            },
        }],
    }
}

fn england_income_tax(year: TaxYear) -> Result<JurisdictionRuleSet, ConfigurationError> {
    let key = "england-income-tax";
    let basic = year.basic_rate_limit();
    let schedule = BandSchedule::new(vec![
        Tier::bounded(dec!(0), basic, dec!(0.20)),
        Tier::bounded(basic, dec!(125140), dec!(0.40)),
        Tier::open(dec!(125140), dec!(0.45)),
    ])
    .map_err(ConfigurationError::schedule(key))?;
    Ok(JurisdictionRuleSet {
        key,
        name: "Income Tax (England, Wales & NI)",
        tax_year: year,
        schedule,
        allowances: vec![personal_allowance_rule(year)],
        exemptions: vec![],
        shared_band: None,
        gift_deductible: false,
    })
}

fn scotland_income_tax(year: TaxYear) -> Result<JurisdictionRuleSet, ConfigurationError> {
    let key = "scotland-income-tax";
    // Published thresholds are gross; these are net of the personal
    // allowance since the schedule applies to the taxable base
    let schedule = BandSchedule::new(vec![
        Tier::bounded(dec!(0), dec!(2306), dec!(0.19)),
        Tier::bounded(dec!(2306), dec!(13991), dec!(0.20)),
        Tier::bounded(dec!(13991), dec!(31092), dec!(0.21)),
        Tier::bounded(dec!(31092), dec!(62430), dec!(0.42)),
        Tier::bounded(dec!(62430), dec!(112570), dec!(0.45)),
        Tier::open(dec!(112570), dec!(0.48)),
    ])
    .map_err(ConfigurationError::schedule(key))?;
    Ok(JurisdictionRuleSet {
        key,
        name: "Income Tax (Scotland)",
        tax_year: year,
        schedule,
        allowances: vec![personal_allowance_rule(year)],
        exemptions: vec![],
        shared_band: None,
        gift_deductible: false,
    })
}

fn ni_employee(year: TaxYear) -> Result<JurisdictionRuleSet, ConfigurationError> {
    let key = "ni-class1-employee";
    let schedule = BandSchedule::new(vec![
        Tier::bounded(dec!(0), dec!(12570), dec!(0)),
        Tier::bounded(dec!(12570), dec!(50270), year.ni_employee_main_rate()),
        Tier::open(dec!(50270), dec!(0.02)),
    ])
    .map_err(ConfigurationError::schedule(key))?;
    Ok(JurisdictionRuleSet {
        key,
        name: "National Insurance (Class 1, employee)",
        tax_year: year,
        schedule,
        allowances: vec![],
        exemptions: vec![],
        shared_band: None,
        gift_deductible: false,
    })
}

fn ni_employer(year: TaxYear) -> Result<JurisdictionRuleSet, ConfigurationError> {
    let key = "ni-class1-employer";
    let schedule = BandSchedule::new(vec![
        Tier::bounded(dec!(0), dec!(9100), dec!(0)),
        Tier::open(dec!(9100), dec!(0.138)),
    ])
    .map_err(ConfigurationError::schedule(key))?;
    Ok(JurisdictionRuleSet {
        key,
        name: "National Insurance (Class 1, employer)",
        tax_year: year,
        schedule,
        allowances: vec![],
        exemptions: vec![],
        shared_band: None,
        gift_deductible: false,
    })
}

fn residence_taper() -> Taper {
    // £1 lost per £2 of estate value over £2m
    Taper {
        reference: TaperReference::Gross,
        rule: TaperRule {
            start_threshold: dec!(2000000),
            divisor: dec!(2),
        },
    }
}

fn inheritance_tax(year: TaxYear) -> Result<JurisdictionRuleSet, ConfigurationError> {
    let key = "inheritance-tax";
    let schedule = BandSchedule::flat(dec!(0.40));
    Ok(JurisdictionRuleSet {
        key,
        name: "Inheritance Tax",
        tax_year: year,
        schedule,
        allowances: vec![
            AllowanceRule::fixed("nil-rate-band", dec!(325000)),
            AllowanceRule {
                requires: Some(ExemptionFlag::TransferredNilRateBand),
                ..AllowanceRule::fixed("transferred-nil-rate-band", dec!(325000))
            },
            AllowanceRule {
                requires: Some(ExemptionFlag::LeavingToDescendants),
                tapers: vec![residence_taper()],
                ..AllowanceRule::fixed("residence-nil-rate-band", dec!(175000))
            },
            AllowanceRule {
                requires: Some(ExemptionFlag::TransferredResidenceNilRateBand),
                tapers: vec![residence_taper()],
                ..AllowanceRule::fixed("transferred-residence-nil-rate-band", dec!(175000))
            },
        ],
        exemptions: vec![
            ExemptionRule::FullRelief {
                flag: ExemptionFlag::SpouseExemption,
                liability: dec!(0),
            },
            ExemptionRule::ReducedRate {
                name: "charitable-rate-reduction",
                schedule: BandSchedule::flat(dec!(0.36)),
                qualifies: charity_rate_qualifies,
            },
        ],
        shared_band: None,
        gift_deductible: true,
    })
}

fn sdlt_residential(year: TaxYear) -> Result<JurisdictionRuleSet, ConfigurationError> {
    let key = "sdlt-residential";
    let schedule = BandSchedule::new(vec![
        Tier::bounded(dec!(0), dec!(250000), dec!(0)),
        Tier::bounded(dec!(250000), dec!(925000), dec!(0.05)),
        Tier::bounded(dec!(925000), dec!(1500000), dec!(0.10)),
        Tier::open(dec!(1500000), dec!(0.12)),
    ])
    .map_err(ConfigurationError::schedule(key))?;
    let first_time_buyer = BandSchedule::new(vec![
        Tier::bounded(dec!(0), dec!(425000), dec!(0)),
        Tier::open(dec!(425000), dec!(0.05)),
    ])
    .map_err(ConfigurationError::schedule(key))?;
    Ok(JurisdictionRuleSet {
        key,
        name: "Stamp Duty Land Tax (residential)",
        tax_year: year,
        schedule,
        allowances: vec![],
        exemptions: vec![
            ExemptionRule::AlternativeSchedule {
                flag: ExemptionFlag::FirstTimeBuyer,
                schedule: first_time_buyer,
                qualifies: Some(first_time_buyer_qualifies),
            },
            ExemptionRule::Surcharge {
                flag: ExemptionFlag::AdditionalProperty,
                points: dec!(0.03),
            },
            ExemptionRule::Surcharge {
                flag: ExemptionFlag::NonResident,
                points: dec!(0.02),
            },
        ],
        shared_band: None,
        gift_deductible: false,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CgtAssets {
    Other,
    Property,
}

fn cgt(year: TaxYear, assets: CgtAssets) -> Result<JurisdictionRuleSet, ConfigurationError> {
    let (key, name, basic_rate, higher_rate) = match assets {
        CgtAssets::Other => (
            "cgt-other",
            "Capital Gains Tax (other assets)",
            dec!(0.10),
            dec!(0.20),
        ),
        CgtAssets::Property => (
            "cgt-property",
            "Capital Gains Tax (residential property)",
            dec!(0.18),
            dec!(0.24),
        ),
    };
    Ok(JurisdictionRuleSet {
        key,
        name,
        tax_year: year,
        schedule: BandSchedule::flat(basic_rate),
        allowances: vec![AllowanceRule::fixed(
            "annual-exempt-amount",
            year.cgt_exempt_amount(),
        )],
        exemptions: vec![],
        shared_band: Some(SharedBandRule {
            band_width: year.basic_rate_limit(),
            income_offset: year.personal_allowance(),
            higher_schedule: BandSchedule::flat(higher_rate),
        }),
        gift_deductible: false,
    })
}

/// Council tax bands are multiples of the Band D charge in ninths.
const COUNCIL_BANDS: &[(&str, &str, u32)] = &[
    ("council-tax-a", "Council Tax (Band A)", 6),
    ("council-tax-b", "Council Tax (Band B)", 7),
    ("council-tax-c", "Council Tax (Band C)", 8),
    ("council-tax-d", "Council Tax (Band D)", 9),
    ("council-tax-e", "Council Tax (Band E)", 11),
    ("council-tax-f", "Council Tax (Band F)", 13),
    ("council-tax-g", "Council Tax (Band G)", 15),
    ("council-tax-h", "Council Tax (Band H)", 18),
];

fn council_tax(year: TaxYear) -> Result<Vec<JurisdictionRuleSet>, ConfigurationError> {
    COUNCIL_BANDS
        .iter()
        .map(|&(key, name, ninths)| {
            let multiplier = Decimal::from(ninths) / dec!(9);
            Ok(JurisdictionRuleSet {
                key,
                name,
                tax_year: year,
                schedule: BandSchedule::flat(multiplier),
                allowances: vec![],
                exemptions: vec![],
                shared_band: None,
                gift_deductible: false,
            })
        })
        .collect()
}
