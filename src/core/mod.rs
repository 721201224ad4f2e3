pub mod allowance;
pub mod input;
pub mod result;
pub mod schedule;
pub mod tiered;

// Flat public surface for domain types and functions.
pub use allowance::{
    resolve_allowance, resolve_allowance_set, AllowanceRule, ResolvedAllowance, Taper,
    TaperReference, TaperRule,
};
pub use input::{ExemptionFlag, TaxInput, ValidationError};
pub use result::TaxComputation;
pub use schedule::{BandSchedule, ScheduleError, Tier};
pub use tiered::{compute_tiered, TierContribution, TieredOutcome};
