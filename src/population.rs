use crate::config::Config;
use crate::model::{Agent, AgentDists};
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_distr::{Bernoulli, Uniform};

// Handwashing odds ratios by weekly frequency group (0-3 and 4-9 times).
const HANDWASH_LOW_OR: f64 = 0.26;
const HANDWASH_HIGH_OR: f64 = 0.029;
const HANDWASH_HIGH_BASE: f64 = 0.78;

/// Distributions of the protection inputs synthesized for every agent.
struct ProtectionDists {
    mask_adoption: Bernoulli,
    mask_factor: Uniform<f64>,
    handwash_low: Bernoulli,
    handwash_low_cat: Uniform<f64>,
    handwash_high_cat: Uniform<f64>,
}

impl ProtectionDists {
    fn new(cfg: &Config) -> Result<Self> {
        let pop = &cfg.population;
        let (mask_low, mask_high) = pop.mask_factor_range;
        Ok(Self {
            mask_adoption: Bernoulli::new(pop.mask_adoption_prob)?,
            mask_factor: Uniform::new_inclusive(mask_low, mask_high)?,
            handwash_low: Bernoulli::new(pop.handwash_low_prob)?,
            handwash_low_cat: Uniform::new(0.0, 0.3)?,
            handwash_high_cat: Uniform::new(0.4, 0.9)?,
        })
    }

    fn sample_mask_factor<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.mask_adoption.sample(rng) {
            self.mask_factor.sample(rng)
        } else {
            0.0
        }
    }

    fn sample_handwash_factor<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        // Both categories are drawn so the stream does not depend on the group.
        let cat_low = (self.handwash_low_cat.sample(rng) * 10.0).ceil();
        let cat_high = (self.handwash_high_cat.sample(rng) * 10.0).ceil();
        if self.handwash_low.sample(rng) {
            cat_low * HANDWASH_LOW_OR
        } else {
            HANDWASH_HIGH_BASE + (cat_high - 3.0) * HANDWASH_HIGH_OR
        }
    }
}

/// Build a fresh population of `n_students` agents.
///
/// Agents other than patient zero may receive one or two vaccine doses on
/// day 0. Agent 0 is infected before returning.
pub fn build_population<R: Rng + ?Sized>(cfg: &Config, rng: &mut R) -> Result<Vec<Agent>> {
    let pop = &cfg.population;

    let agt_dists = AgentDists::new(cfg).context("failed to construct agent distributions")?;
    let prot_dists =
        ProtectionDists::new(cfg).context("failed to construct protection distributions")?;
    let first_dose = Bernoulli::new(pop.vaccination_prob)
        .context("failed to construct first dose distribution")?;
    let second_dose = Bernoulli::new(pop.second_dose_prob)
        .context("failed to construct second dose distribution")?;

    let mut agt_vec = Vec::with_capacity(pop.n_students);
    for id in 0..pop.n_students {
        let handwash_factor = prot_dists.sample_handwash_factor(rng);
        let mask_factor = prot_dists.sample_mask_factor(rng);

        let mut agt = Agent::new(
            id,
            cfg.disease.infectious_probability,
            mask_factor,
            handwash_factor,
            &agt_dists,
            rng,
        );

        if id != 0 && first_dose.sample(rng) {
            agt.vaccinate(0, &agt_dists, rng);
            if second_dose.sample(rng) {
                agt.vaccinate(0, &agt_dists, rng);
            }
        }

        agt_vec.push(agt);
    }

    // Validation guarantees at least one agent.
    if let Some(agt) = agt_vec.first_mut() {
        agt.patient_zero(None);
    }

    Ok(agt_vec)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::test_config;
    use crate::model::Status;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn builds_requested_population() {
        let cfg = test_config();
        let mut rng = ChaCha12Rng::seed_from_u64(11);
        let agt_vec = build_population(&cfg, &mut rng).unwrap();

        assert_eq!(agt_vec.len(), cfg.population.n_students);
        for (i_agt, agt) in agt_vec.iter().enumerate() {
            assert_eq!(agt.id(), i_agt);
        }
        assert_eq!(agt_vec.iter().filter(|agt| agt.is_infected()).count(), 1);
    }

    #[test]
    fn seeds_patient_zero() {
        let cfg = test_config();
        let mut rng = ChaCha12Rng::seed_from_u64(12);
        let agt_vec = build_population(&cfg, &mut rng).unwrap();

        let zero = &agt_vec[0];
        let inf = zero.infection().unwrap();
        assert_eq!(inf.infected_by, 0);
        assert_eq!(inf.infected_on, 0);
        assert_eq!(inf.window.start, zero.incubation_period());
        assert!(zero.vaccinated_on().is_empty());
        assert_ne!(zero.status(0), Status::Susceptible);
    }

    #[test]
    fn draws_protection_inputs() {
        let mut cfg = test_config();
        cfg.population.n_students = 500;
        let mut rng = ChaCha12Rng::seed_from_u64(13);
        let agt_vec = build_population(&cfg, &mut rng).unwrap();

        let low_group = [0.0, 0.26, 0.52, 0.78];
        for agt in &agt_vec {
            let hw = agt.handwash_factor();
            let in_low = low_group.iter().any(|val| (hw - val).abs() < 1e-9);
            let in_high = (0.78 + 1.0 * 0.029 - 1e-9..=0.78 + 6.0 * 0.029 + 1e-9).contains(&hw);
            assert!(in_low || in_high, "handwash factor {hw}");

            let mask = agt.mask_factor();
            assert!(mask == 0.0 || (0.6..=0.8).contains(&mask), "mask factor {mask}");
            assert!(agt.vaccinated_on().len() <= 2);
        }
        assert!(agt_vec.iter().any(|agt| agt.mask_factor() == 0.0));
        assert!(agt_vec.iter().any(|agt| agt.mask_factor() > 0.0));
        assert!(agt_vec.iter().any(|agt| agt.vaccinated_on().len() == 2));
    }

    #[test]
    fn skips_vaccination_when_disabled() {
        let mut cfg = test_config();
        cfg.population.vaccination_prob = 0.0;
        let mut rng = ChaCha12Rng::seed_from_u64(14);
        let agt_vec = build_population(&cfg, &mut rng).unwrap();
        assert!(agt_vec.iter().all(|agt| agt.vaccinated_on().is_empty()));
    }

    #[test]
    fn reports_invalid_dose_probability() {
        let mut cfg = test_config();
        cfg.population.second_dose_prob = 1.5;
        let mut rng = ChaCha12Rng::seed_from_u64(16);
        let err = build_population(&cfg, &mut rng).unwrap_err();
        assert!(format!("{err:#}").contains("failed to construct second dose distribution"));
    }

    #[test]
    fn single_student_is_patient_zero() {
        let mut cfg = test_config();
        cfg.population.n_students = 1;
        let mut rng = ChaCha12Rng::seed_from_u64(15);
        let agt_vec = build_population(&cfg, &mut rng).unwrap();
        assert_eq!(agt_vec.len(), 1);
        assert!(agt_vec[0].is_infected());
    }
}
