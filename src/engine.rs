use crate::config::Config;
use crate::model::Agent;
use crate::population::build_population;
use crate::schedule::run_day;
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_chacha::ChaCha12Rng;
use rayon::prelude::*;
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
    sync::atomic::{AtomicUsize, Ordering},
};

/// Cumulative infection counts of every episode.
///
/// Row `i_ep` holds, for each day, the number of agents ever infected by the
/// end of that day in episode `i_ep`.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct EpisodeMatrix {
    /// Base seed the episodes were generated from.
    pub seed: u64,
    pub n_days: usize,
    pub rows: Vec<Vec<usize>>,
}

impl EpisodeMatrix {
    pub fn n_episodes(&self) -> usize {
        self.rows.len()
    }

    /// Save the matrix to a MessagePack file.
    pub fn save<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, &self).context("failed to serialize episode matrix")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Load a previously saved matrix.
    pub fn load<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);
        let matrix = decode::from_read(&mut reader).context("failed to deserialize episode matrix")?;
        Ok(matrix)
    }
}

/// Simulation engine.
///
/// Holds the configuration and the base seed from which every episode
/// derives its own random stream.
pub struct Engine {
    cfg: Config,
    seed: u64,
}

impl Engine {
    /// Create a new `Engine`, drawing a base seed from the OS if the
    /// configuration does not fix one.
    pub fn new(cfg: Config) -> Result<Self> {
        let seed = match cfg.simulation.seed {
            Some(seed) => seed,
            None => ChaCha12Rng::try_from_os_rng()
                .context("failed to seed from OS")?
                .next_u64(),
        };
        Ok(Self { cfg, seed })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run episode `i_ep` on its own random stream.
    pub fn run_episode(&self, i_ep: usize) -> Result<Vec<usize>> {
        let mut rng = ChaCha12Rng::seed_from_u64(self.seed);
        rng.set_stream(i_ep as u64);
        run_episode(&self.cfg, &mut rng).with_context(|| format!("failed to run episode {i_ep}"))
    }

    /// Run all episodes in parallel and collect their series by index.
    pub fn run_all(&self) -> Result<EpisodeMatrix> {
        let n_episodes = self.cfg.simulation.n_episodes;
        let n_done = AtomicUsize::new(0);

        let rows = (0..n_episodes)
            .into_par_iter()
            .map(|i_ep| -> Result<Vec<usize>> {
                let row = self.run_episode(i_ep)?;

                let n_done = n_done.fetch_add(1, Ordering::Relaxed) + 1;
                let progress = 100.0 * n_done as f64 / n_episodes as f64;
                log::info!("completed {progress:06.2}%");

                Ok(row)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(EpisodeMatrix {
            seed: self.seed,
            n_days: self.cfg.simulation.n_days,
            rows,
        })
    }
}

/// Run one episode on a freshly built population.
///
/// Returns the cumulative number of infected agents at the end of each day.
pub fn run_episode<R: Rng + ?Sized>(cfg: &Config, rng: &mut R) -> Result<Vec<usize>> {
    let mut agt_vec = build_population(cfg, rng).context("failed to build population")?;
    let sim = &cfg.simulation;
    Ok(simulate(&mut agt_vec, sim.n_days, sim.weekend_enabled, rng))
}

/// Step `agt_vec` through `n_days` days.
pub fn simulate<R: Rng + ?Sized>(
    agt_vec: &mut [Agent],
    n_days: usize,
    weekend_enabled: bool,
    rng: &mut R,
) -> Vec<usize> {
    let mut n_infected = agt_vec.iter().filter(|agt| agt.is_infected()).count();
    let mut series = Vec::with_capacity(n_days);
    for day in 0..n_days {
        n_infected += run_day(agt_vec, day, weekend_enabled, rng);
        series.push(n_infected);
    }
    log::debug!("episode ended with {n_infected} infected agents");
    series
}
