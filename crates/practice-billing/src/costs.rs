//! Price and payout resolution
//!
//! Client price per hour: client override > rate table > fallback.
//! Therapist cost per hour: per-client override > per-service override > fallback.

use serde::Serialize;
use std::collections::HashMap;

use crate::config::BillingConfig;
use crate::model::{Client, Service, Therapist};
use crate::time_math::{finite_or_zero, round2};

/// Default hourly price per therapy type
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateTable {
    rates: HashMap<String, f64>,
}

impl RateTable {
    pub fn new(rates: HashMap<String, f64>) -> Self {
        Self { rates }
    }

    /// Build the table from the active services' base prices
    pub fn from_services(services: &[Service]) -> Self {
        let rates = services
            .iter()
            .filter(|s| s.active)
            .map(|s| (s.name.clone(), s.base_price))
            .collect();
        Self { rates }
    }

    pub fn get(&self, therapy_type: &str) -> Option<f64> {
        self.rates.get(therapy_type).copied()
    }
}

/// Where the client's hourly price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RateSource {
    ClientOverride,
    RateTable,
    Fallback,
}

/// Where the therapist's hourly cost came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CostSource {
    ClientOverride,
    ServiceOverride,
    Fallback,
}

/// Prices and payouts for one session
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResolvedCosts {
    pub client_rate: f64,
    pub client_total: f64,
    pub rate_source: RateSource,
    pub therapist_rate: f64,
    pub therapist_total: f64,
    pub cost_source: CostSource,
}

/// Resolves effective prices against a rate table and the configured fallbacks
#[derive(Debug, Clone, Copy)]
pub struct CostResolver<'a> {
    rates: &'a RateTable,
    config: &'a BillingConfig,
}

impl<'a> CostResolver<'a> {
    pub fn new(rates: &'a RateTable, config: &'a BillingConfig) -> Self {
        Self { rates, config }
    }

    /// Hourly price charged to a client for a therapy type
    pub fn client_rate(&self, client: &Client, therapy_type: &str) -> (f64, RateSource) {
        if let Some(rate) = client.custom_rates.get(therapy_type).copied().flatten() {
            return (finite_or_zero(rate), RateSource::ClientOverride);
        }
        if let Some(rate) = self.rates.get(therapy_type) {
            return (finite_or_zero(rate), RateSource::RateTable);
        }
        (self.config.fallback_client_rate, RateSource::Fallback)
    }

    /// Hourly payout owed to a therapist for a session with a client
    pub fn therapist_rate(&self, therapist: &Therapist, client: &Client, therapy_type: &str) -> (f64, CostSource) {
        if let Some(cost) = therapist.costs_by_client.get(&client.id) {
            return (finite_or_zero(*cost), CostSource::ClientOverride);
        }
        if let Some(cost) = therapist.costs_by_service.get(therapy_type) {
            return (finite_or_zero(*cost), CostSource::ServiceOverride);
        }
        (self.config.fallback_therapist_cost, CostSource::Fallback)
    }

    /// Resolve both sides of a session lasting `duration_hours`
    pub fn resolve(
        &self,
        client: &Client,
        therapist: &Therapist,
        therapy_type: &str,
        duration_hours: f64,
    ) -> ResolvedCosts {
        let hours = finite_or_zero(duration_hours);
        let (client_rate, rate_source) = self.client_rate(client, therapy_type);
        let (therapist_rate, cost_source) = self.therapist_rate(therapist, client, therapy_type);

        ResolvedCosts {
            client_rate,
            client_total: round2(finite_or_zero(client_rate * hours)),
            rate_source,
            therapist_rate,
            therapist_total: round2(finite_or_zero(therapist_rate * hours)),
            cost_source,
        }
    }
}
