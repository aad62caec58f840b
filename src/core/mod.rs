mod engine;
mod schedule;
mod types;

pub use engine::{run_scenarios, simulate};
pub use schedule::crash_years;
pub use types::{
    AllocationProfile, AssetClass, ConfigError, CrashShock, MAX_HORIZON_YEARS, ReturnAssumptions,
    RiskTier, SimulationConfig, SimulationResult, Strategy,
};
