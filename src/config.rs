use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Debug,
    fs,
    ops::{RangeBounds, RangeInclusive},
    path::Path,
};

/// Lower and upper bounds of a uniform draw.
pub type Bounds = (f64, f64);

/// Simulation configuration parameters.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    pub disease: DiseaseConfig,
    pub population: PopulationConfig,
    pub simulation: SimulationConfig,
}

/// Disease parameters shared by every agent.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DiseaseConfig {
    /// Base per-encounter transmission probability.
    pub infectious_probability: f64,
    /// Bounds of the incubation period draw (days, floored).
    pub incubation_range: Bounds,
    /// Bounds of the infectious period draw (days, floored).
    pub infectious_period_range: Bounds,
}

/// Population synthesis parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Number of agents.
    pub n_students: usize,

    /// Bounds of the social distance factor draw.
    pub social_distance_range: Bounds,

    /// Probability that an agent wears a mask.
    pub mask_adoption_prob: f64,
    /// Bounds of the mask factor draw for mask wearers.
    pub mask_factor_range: Bounds,

    /// Probability that an agent belongs to the low handwashing group.
    pub handwash_low_prob: f64,

    /// Probability that an agent receives a first dose.
    pub vaccination_prob: f64,
    /// Probability that a vaccinated agent receives a second dose.
    pub second_dose_prob: f64,
    /// Bounds of the protection added by each dose.
    pub vaccination_factor_range: Bounds,
}

/// Episode and horizon parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of simulated days per episode.
    pub n_days: usize,
    /// Number of independent episodes.
    pub n_episodes: usize,
    /// Skip contact on weekend days.
    pub weekend_enabled: bool,
    /// Base random seed (drawn from the OS if absent).
    pub seed: Option<u64>,
    /// Days added to the peak day when computing epidemic duration.
    pub duration_offset: usize,
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        let config: Config = toml::from_str(&contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let dis = &self.disease;
        check_num(dis.infectious_probability, 0.0..=1.0)
            .context("invalid infectious probability")?;
        check_range(dis.incubation_range, 0.0..=365.0).context("invalid incubation range")?;
        check_range(dis.infectious_period_range, 0.0..=365.0)
            .context("invalid infectious period range")?;

        let pop = &self.population;
        check_num(pop.n_students, 1..100_000).context("invalid number of students")?;
        check_range(pop.social_distance_range, 0.0..=100.0)
            .context("invalid social distance range")?;
        check_num(pop.mask_adoption_prob, 0.0..=1.0).context("invalid mask adoption probability")?;
        check_range(pop.mask_factor_range, 0.0..=100.0).context("invalid mask factor range")?;
        check_num(pop.handwash_low_prob, 0.0..=1.0)
            .context("invalid low handwashing probability")?;
        check_num(pop.vaccination_prob, 0.0..=1.0).context("invalid vaccination probability")?;
        check_num(pop.second_dose_prob, 0.0..=1.0).context("invalid second dose probability")?;
        check_range(pop.vaccination_factor_range, 0.0..=100.0)
            .context("invalid vaccination factor range")?;

        let sim = &self.simulation;
        check_num(sim.n_days, 1..10_000).context("invalid number of days")?;
        check_num(sim.n_episodes, 1..10_000_000).context("invalid number of episodes")?;
        check_num(sim.duration_offset, 0..10_000).context("invalid duration offset")?;

        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

fn check_range(bounds: Bounds, range: RangeInclusive<f64>) -> Result<()> {
    let (low, high) = bounds;
    check_num(low, range.clone()).context("invalid lower bound")?;
    check_num(high, range).context("invalid upper bound")?;
    if low > high {
        bail!("lower bound {low} must not exceed upper bound {high}");
    }
    Ok(())
}
