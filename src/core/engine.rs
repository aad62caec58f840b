use super::schedule::crash_years;
use super::types::{AllocationProfile, AssetClass, SimulationConfig, SimulationResult};

/// Years a panic seller stays out of the risk assets after liquidating.
const PANIC_COOLDOWN_YEARS: u32 = 2;

/// Cooldown burned per cooled-down year. Kept at 2 to match the documented
/// behaviour of the panic model: the cooldown set in the crash year is fully
/// consumed by that year's growth phase.
const COOLDOWN_STEP: u32 = 2;

const MONTHS_PER_YEAR: f64 = 12.0;

/// Fixed SIP split across Equity/Debt/Gold/Crypto, independent of the
/// allocation profile.
const SIP_SPLIT: [f64; AssetClass::COUNT] = [0.60, 0.25, 0.08, 0.07];

/// Current value per asset class, array-indexed by [`AssetClass`].
#[derive(Copy, Clone, Debug, PartialEq)]
struct PortfolioState {
    values: [f64; AssetClass::COUNT],
}

impl PortfolioState {
    fn split(corpus: f64, allocation: &AllocationProfile) -> Self {
        let mut values = [0.0; AssetClass::COUNT];
        for asset in AssetClass::ALL {
            values[asset.index()] = corpus * allocation.fraction(asset);
        }
        Self { values }
    }

    fn value(&self, asset: AssetClass) -> f64 {
        self.values[asset.index()]
    }

    fn value_mut(&mut self, asset: AssetClass) -> &mut f64 {
        &mut self.values[asset.index()]
    }

    fn total(&self) -> f64 {
        self.values.iter().sum()
    }
}

#[derive(Copy, Clone, Debug)]
struct YearOutcome {
    state: PortfolioState,
    cooldown: u32,
    /// Total portfolio value aggregated after the contribution phase,
    /// before any rebalancing. This is what the trajectory records.
    total: f64,
}

/// Advances the portfolio through one simulated year.
///
/// Phase order is fixed: shock (with optional panic liquidation), growth,
/// contribution, aggregate, rebalance. Pure: the caller appends the
/// aggregated total to the trajectory and tracks recovery.
fn advance_year(
    config: &SimulationConfig,
    schedule: &[u32],
    panic: bool,
    year: u32,
    mut state: PortfolioState,
    mut cooldown: u32,
) -> YearOutcome {
    let crash_year = schedule.binary_search(&year).is_ok();

    if crash_year {
        *state.value_mut(AssetClass::Equity) *= 1.0 + config.shock.equity;
        *state.value_mut(AssetClass::Crypto) *= 1.0 + config.shock.crypto;

        if panic {
            // Sell the battered risk assets into debt at post-shock prices.
            let liquidated = state.value(AssetClass::Equity) + state.value(AssetClass::Crypto);
            *state.value_mut(AssetClass::Debt) += liquidated;
            *state.value_mut(AssetClass::Equity) = 0.0;
            *state.value_mut(AssetClass::Crypto) = 0.0;
            cooldown = PANIC_COOLDOWN_YEARS;
        }
    }

    if cooldown == 0 {
        *state.value_mut(AssetClass::Equity) *= 1.0 + config.returns.equity;
        *state.value_mut(AssetClass::Crypto) *= 1.0 + config.returns.crypto;
    } else {
        // Sitting out the market: the risk assets miss the rebound.
        cooldown = cooldown.saturating_sub(COOLDOWN_STEP);
    }
    *state.value_mut(AssetClass::Debt) *= 1.0 + config.returns.debt;
    *state.value_mut(AssetClass::Gold) *= 1.0 + config.returns.gold;

    if config.sip_during_crash || !crash_year {
        let annual_sip = config.monthly_sip * MONTHS_PER_YEAR;
        for asset in AssetClass::ALL {
            let risk_asset = matches!(asset, AssetClass::Equity | AssetClass::Crypto);
            if risk_asset && cooldown != 0 {
                continue;
            }
            *state.value_mut(asset) += annual_sip * SIP_SPLIT[asset.index()];
        }
    }

    let total = state.total();

    // total <= 0 means there is nothing meaningful to redistribute.
    if config.rebalance && cooldown == 0 && total > 0.0 {
        for asset in AssetClass::ALL {
            *state.value_mut(asset) = total * config.allocation.fraction(asset);
        }
    }

    YearOutcome {
        state,
        cooldown,
        total,
    }
}

/// Runs one scenario over a validated config. Total: never fails, performs
/// no I/O, and two calls with identical inputs produce identical output.
pub fn simulate(config: &SimulationConfig, panic: bool) -> SimulationResult {
    let schedule = crash_years(config.horizon_years, config.crash_count);
    let mut state = PortfolioState::split(config.initial_corpus, &config.allocation);
    let initial_total = state.total();
    let mut cooldown = 0;

    let mut yearly_totals = Vec::with_capacity(config.horizon_years as usize);
    let mut recovery_year = None;

    for year in 1..=config.horizon_years {
        let outcome = advance_year(config, &schedule, panic, year, state, cooldown);
        state = outcome.state;
        cooldown = outcome.cooldown;

        yearly_totals.push(outcome.total);
        if recovery_year.is_none() && outcome.total >= initial_total {
            recovery_year = Some(year);
        }
    }

    SimulationResult {
        yearly_totals,
        recovery_year,
    }
}

/// Runs the calm and panic scenarios over one config. The two runs share no
/// state; each starts from a fresh portfolio split.
pub fn run_scenarios(config: &SimulationConfig) -> (SimulationResult, SimulationResult) {
    (simulate(config, false), simulate(config, true))
}
