use serde::Serialize;
use thiserror::Error;

/// Longest horizon the engine will simulate, in years.
pub const MAX_HORIZON_YEARS: u32 = 25;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AssetClass {
    Equity,
    Debt,
    Gold,
    Crypto,
}

impl AssetClass {
    pub const ALL: [AssetClass; 4] = [
        AssetClass::Equity,
        AssetClass::Debt,
        AssetClass::Gold,
        AssetClass::Crypto,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn index(self) -> usize {
        match self {
            AssetClass::Equity => 0,
            AssetClass::Debt => 1,
            AssetClass::Gold => 2,
            AssetClass::Crypto => 3,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Strategy {
    Balanced,
    AllEquity,
    AllCrypto,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("allocation weights must sum to 100, got {0}")]
    WeightsMustSumToHundred(u32),
    #[error("horizon must be between 1 and {MAX_HORIZON_YEARS} years, got {0}")]
    HorizonOutOfRange(u32),
    #[error("initial corpus must be finite and >= 0")]
    InvalidCorpus,
    #[error("monthly contribution must be finite and >= 0")]
    InvalidContribution,
    #[error("shock rates must be finite and > -100%")]
    InvalidShock,
}

/// Target portfolio weights in integer percent, indexed by [`AssetClass`].
/// Always sums to exactly 100.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct AllocationProfile {
    weights: [u32; AssetClass::COUNT],
}

impl AllocationProfile {
    pub fn risk_tier(tier: RiskTier) -> Self {
        let weights = match tier {
            RiskTier::Low => [45, 45, 7, 3],
            RiskTier::Moderate => [60, 25, 8, 7],
            RiskTier::High => [70, 15, 5, 10],
        };
        Self { weights }
    }

    pub fn strategy(strategy: Strategy) -> Self {
        let weights = match strategy {
            Strategy::Balanced => [60, 25, 8, 7],
            Strategy::AllEquity => [100, 0, 0, 0],
            Strategy::AllCrypto => [0, 0, 0, 100],
        };
        Self { weights }
    }

    /// Custom weights in Equity/Debt/Gold/Crypto order.
    pub fn custom(weights: [u32; AssetClass::COUNT]) -> Result<Self, ConfigError> {
        let sum: u32 = weights.iter().sum();
        if sum != 100 {
            return Err(ConfigError::WeightsMustSumToHundred(sum));
        }
        Ok(Self { weights })
    }

    pub fn weight(&self, asset: AssetClass) -> u32 {
        self.weights[asset.index()]
    }

    pub fn fraction(&self, asset: AssetClass) -> f64 {
        self.weight(asset) as f64 / 100.0
    }
}

/// Annual nominal growth per asset class, as signed fractions.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ReturnAssumptions {
    pub equity: f64,
    pub debt: f64,
    pub gold: f64,
    pub crypto: f64,
}

impl ReturnAssumptions {
    pub fn rate(&self, asset: AssetClass) -> f64 {
        match asset {
            AssetClass::Equity => self.equity,
            AssetClass::Debt => self.debt,
            AssetClass::Gold => self.gold,
            AssetClass::Crypto => self.crypto,
        }
    }
}

impl Default for ReturnAssumptions {
    fn default() -> Self {
        Self {
            equity: 0.12,
            debt: 0.06,
            gold: 0.07,
            crypto: 0.15,
        }
    }
}

/// One-year return override for the risk assets during a crash year.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CrashShock {
    pub equity: f64,
    pub crypto: f64,
}

impl Default for CrashShock {
    fn default() -> Self {
        Self {
            equity: -0.30,
            crypto: -0.50,
        }
    }
}

/// Immutable inputs for one simulation run. Validate once at the boundary;
/// the engine itself never fails on a validated config.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub initial_corpus: f64,
    pub monthly_sip: f64,
    pub horizon_years: u32,
    pub allocation: AllocationProfile,
    pub returns: ReturnAssumptions,
    pub rebalance: bool,
    pub sip_during_crash: bool,
    pub crash_count: u32,
    pub shock: CrashShock,
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_HORIZON_YEARS).contains(&self.horizon_years) {
            return Err(ConfigError::HorizonOutOfRange(self.horizon_years));
        }
        if !self.initial_corpus.is_finite() || self.initial_corpus < 0.0 {
            return Err(ConfigError::InvalidCorpus);
        }
        if !self.monthly_sip.is_finite() || self.monthly_sip < 0.0 {
            return Err(ConfigError::InvalidContribution);
        }
        if !self.shock.equity.is_finite()
            || !self.shock.crypto.is_finite()
            || self.shock.equity <= -1.0
            || self.shock.crypto <= -1.0
        {
            return Err(ConfigError::InvalidShock);
        }
        Ok(())
    }
}

/// One scenario's trajectory: total portfolio value per simulated year, plus
/// the first year the total climbed back to the starting corpus, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub yearly_totals: Vec<f64>,
    pub recovery_year: Option<u32>,
}

impl SimulationResult {
    pub fn final_total(&self) -> f64 {
        self.yearly_totals.last().copied().unwrap_or(0.0)
    }
}
