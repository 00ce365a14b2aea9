pub mod aggregate;
pub mod cost;
pub mod period;
pub mod pricing;
pub mod types;

pub use aggregate::{
    bar_fill, budget_percentage, BudgetLevel, BudgetStatus, GroupTotal, UsageTotals,
};
pub use cost::compute_cost;
pub use period::Period;
pub use pricing::{PriceEntry, PriceTable};
pub use types::*;
