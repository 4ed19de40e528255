use crate::config::Config;
use crate::engine::{Engine, EpisodeMatrix};
use crate::stats::Summary;
use anyhow::{Context, Result};
use glob::glob;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub struct Manager {
    sim_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(sim_dir: P) -> Result<Self> {
        let sim_dir = sim_dir.as_ref().to_path_buf();

        let cfg = Config::from_file(sim_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { sim_dir, cfg })
    }

    pub fn run_simulation(&self) -> Result<()> {
        let run_idx = self.count_run_dirs().context("failed to count run dirs")?;

        let run_dir = self.run_dir(run_idx);
        fs::create_dir_all(&run_dir).with_context(|| format!("failed to create {run_dir:?}"))?;
        log::info!("created {run_dir:?}");

        let engine = Engine::new(self.cfg.clone()).context("failed to construct engine")?;
        log::info!("using seed {}", engine.seed());

        let matrix = engine.run_all().context("failed to run episodes")?;

        let episodes_file = self.episodes_file(run_idx);
        matrix
            .save(&episodes_file)
            .with_context(|| format!("failed to save {episodes_file:?}"))?;
        log::info!("saved {episodes_file:?}");

        Ok(())
    }

    pub fn run_analysis(&self) -> Result<()> {
        let n_runs = self.count_run_dirs().context("failed to count run dirs")?;
        for run_idx in 0..n_runs {
            let episodes_file = self.episodes_file(run_idx);
            let matrix = EpisodeMatrix::load(&episodes_file)
                .with_context(|| format!("failed to load {episodes_file:?}"))?;

            let summary = Summary::from_matrix(&matrix, self.cfg.simulation.duration_offset);
            log::info!(
                "run {run_idx}: mean duration {:.2}, median duration {:.1}",
                summary.duration.mean,
                summary.duration.median
            );
            log::info!(
                "run {run_idx}: mean infections {:.2}, median infections {:.1}",
                summary.final_count.mean,
                summary.final_count.median
            );

            let summary_file = self.summary_file(run_idx);
            let contents = toml::to_string(&summary).context("failed to serialize summary")?;
            fs::write(&summary_file, contents)
                .with_context(|| format!("failed to write {summary_file:?}"))?;
            log::info!("saved {summary_file:?}");
        }

        Ok(())
    }

    pub fn clean_sim(&self) -> Result<()> {
        let pattern = self.sim_dir.join("run-*").join("summary.toml");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        for file in glob(pattern).context("failed to glob summary files")? {
            let file = file.context("failed to read glob entry")?;
            fs::remove_file(&file).with_context(|| format!("failed to remove {file:?}"))?;
            log::info!("removed {file:?}");
        }
        Ok(())
    }

    fn count_run_dirs(&self) -> Result<usize> {
        let pattern = self.sim_dir.join("run-*");
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let count = glob(pattern)
            .context("failed to glob run dirs")?
            .filter_map(Result::ok)
            .filter(|p| p.is_dir())
            .count();
        Ok(count)
    }

    fn run_dir(&self, run_idx: usize) -> PathBuf {
        self.sim_dir.join(format!("run-{run_idx:04}"))
    }

    fn episodes_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("episodes.msgpack")
    }

    fn summary_file(&self, run_idx: usize) -> PathBuf {
        self.run_dir(run_idx).join("summary.toml")
    }
}
