//! Simulation data types.

use crate::config::Config;
use anyhow::{Context, Result};
use rand::prelude::*;
use rand_distr::Uniform;

/// Stable agent identity, also its index in the population.
pub type AgentId = usize;

/// Zero-based simulation day.
pub type Day = usize;

/// Closed interval of days during which an agent can transmit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: Day,
    pub end: Day,
}

impl Window {
    pub fn contains(&self, day: Day) -> bool {
        self.start <= day && day <= self.end
    }
}

/// Record of how and when an agent was infected.
///
/// Set at most once per agent; there is no reinfection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Infection {
    /// Transmitting agent (patient zero records itself).
    pub infected_by: AgentId,
    /// Day of infection.
    pub infected_on: Day,
    /// Infectious window derived from the incubation and infectious periods.
    pub window: Window,
}

/// Disease status of an agent on a given day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Susceptible,
    Exposed,
    Infectious,
    Recovered,
}

/// Distributions sampled once per agent at construction and once per dose.
pub struct AgentDists {
    social_distance: Uniform<f64>,
    incubation: Uniform<f64>,
    infectious: Uniform<f64>,
    vaccination: Uniform<f64>,
}

impl AgentDists {
    pub fn new(cfg: &Config) -> Result<Self> {
        let uniform = |(low, high): (f64, f64)| Uniform::new_inclusive(low, high);
        Ok(Self {
            social_distance: uniform(cfg.population.social_distance_range)
                .context("failed to construct social distance distribution")?,
            incubation: uniform(cfg.disease.incubation_range)
                .context("failed to construct incubation distribution")?,
            infectious: uniform(cfg.disease.infectious_period_range)
                .context("failed to construct infectious period distribution")?,
            vaccination: uniform(cfg.population.vaccination_factor_range)
                .context("failed to construct vaccination distribution")?,
        })
    }
}

/// Agent of the simulation.
///
/// Protection attributes and disease periods are drawn once at construction
/// and never change. Only vaccination and infection state evolve.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    infectious_probability: f64,

    mask_factor: f64,
    handwash_factor: f64,
    social_distance_factor: f64,
    protection_factor: f64,

    incubation_period: Day,
    infectious_period: Day,

    vaccination_protection_factor: f64,
    vaccinated_on: Vec<Day>,

    infection: Option<Infection>,
}

impl Agent {
    /// Create a new susceptible agent, drawing its social distance factor
    /// and disease periods from `dists`.
    pub fn new<R: Rng + ?Sized>(
        id: AgentId,
        infectious_probability: f64,
        mask_factor: f64,
        handwash_factor: f64,
        dists: &AgentDists,
        rng: &mut R,
    ) -> Self {
        let social_distance_factor = dists.social_distance.sample(rng);
        let protection_factor = mask_factor * social_distance_factor * handwash_factor;

        let incubation_period = dists.incubation.sample(rng).floor() as Day;
        let infectious_period = dists.infectious.sample(rng).floor() as Day;

        Self {
            id,
            infectious_probability,
            mask_factor,
            handwash_factor,
            social_distance_factor,
            protection_factor,
            incubation_period,
            infectious_period,
            vaccination_protection_factor: 0.0,
            vaccinated_on: Vec::new(),
            infection: None,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn mask_factor(&self) -> f64 {
        self.mask_factor
    }

    pub fn handwash_factor(&self) -> f64 {
        self.handwash_factor
    }

    pub fn social_distance_factor(&self) -> f64 {
        self.social_distance_factor
    }

    pub fn protection_factor(&self) -> f64 {
        self.protection_factor
    }

    pub fn incubation_period(&self) -> Day {
        self.incubation_period
    }

    pub fn infectious_period(&self) -> Day {
        self.infectious_period
    }

    pub fn vaccinated_on(&self) -> &[Day] {
        &self.vaccinated_on
    }

    pub fn infection(&self) -> Option<&Infection> {
        self.infection.as_ref()
    }

    pub fn is_infected(&self) -> bool {
        self.infection.is_some()
    }

    /// Disease status on `day`.
    pub fn status(&self, day: Day) -> Status {
        match self.infection {
            None => Status::Susceptible,
            Some(inf) if day < inf.window.start => Status::Exposed,
            Some(inf) if day <= inf.window.end => Status::Infectious,
            Some(_) => Status::Recovered,
        }
    }

    /// Give one dose on `day`, stacking its protection onto earlier doses.
    pub fn vaccinate<R: Rng + ?Sized>(&mut self, day: Day, dists: &AgentDists, rng: &mut R) {
        self.vaccination_protection_factor += dists.vaccination.sample(rng);
        self.vaccinated_on.push(day);
    }

    /// Vaccination multiplier applied at encounter time.
    ///
    /// Stacked doses exceeding 1 are folded back by subtracting 1.
    pub fn vaccination_protection_factor(&self) -> f64 {
        let factor = self.vaccination_protection_factor;
        if factor > 1.0 { factor - 1.0 } else { factor }
    }

    /// Probability that a single exposure infects this agent.
    pub fn infection_probability(&self) -> f64 {
        self.infectious_probability * self.protection_factor * self.vaccination_protection_factor()
    }

    /// Expose this agent to `peer` on `day`.
    ///
    /// Returns 1 if the encounter infected this agent and 0 otherwise.
    /// A random number is drawn only when the peer is infectious on `day`
    /// and this agent is still susceptible.
    pub fn encounter<R: Rng + ?Sized>(&mut self, peer: &Agent, day: Day, rng: &mut R) -> usize {
        if self.id == peer.id {
            return 0;
        }
        let Some(peer_inf) = peer.infection else {
            return 0;
        };
        if !peer_inf.window.contains(day) {
            return 0;
        }
        if self.is_infected() {
            return 0;
        }

        let rand: f64 = rng.random();
        if rand <= self.infection_probability() {
            self.infect(peer.id, day, day + self.incubation_period);
            1
        } else {
            0
        }
    }

    /// Infect this agent on day 0, bypassing the transmission draw.
    ///
    /// The infectious window starts after the incubation period unless
    /// `infectious_start` overrides it.
    pub fn patient_zero(&mut self, infectious_start: Option<Day>) {
        let start = infectious_start.unwrap_or(self.incubation_period);
        self.infect(self.id, 0, start);
    }

    fn infect(&mut self, infected_by: AgentId, infected_on: Day, start: Day) {
        debug_assert!(self.infection.is_none(), "agent {} infected twice", self.id);
        self.infection = Some(Infection {
            infected_by,
            infected_on,
            window: Window {
                start,
                end: start + self.infectious_period,
            },
        });
    }
}
