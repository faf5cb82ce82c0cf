//! Location Resolver
//!
//! Geocodes a location query, looks up facilities around the match and turns
//! the outcome into reply text. Lookups run in sequence and are never retried;
//! an unresolved place stops before the facility lookup.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use vetchat_config::FacilitiesConfig;
use vetchat_core::{Facility, LocationQuery, Result};

use crate::integrations::{
    FacilityDirectory, Geocoder, IntegrationError, FACILITIES_SERVICE, GEOCODER_SERVICE,
};

/// Resolves location queries into facility listings
pub struct LocationResolver {
    geocoder: Arc<dyn Geocoder>,
    directory: Arc<dyn FacilityDirectory>,
    radius_miles: u32,
    max_results: usize,
    fallback_url: String,
}

impl LocationResolver {
    pub fn new(
        geocoder: Arc<dyn Geocoder>,
        directory: Arc<dyn FacilityDirectory>,
        config: &FacilitiesConfig,
    ) -> Self {
        Self {
            geocoder,
            directory,
            radius_miles: config.radius_miles,
            max_results: config.max_results,
            fallback_url: config.fallback_url.clone(),
        }
    }

    /// Resolve a query into reply text
    pub async fn resolve(&self, query: &LocationQuery) -> Result<String> {
        let geo = observe(GEOCODER_SERVICE, self.geocoder.geocode(query.as_str())).await?;

        let Some(geo) = geo else {
            tracing::info!(query = %query, kind = ?query.kind, "Location not found");
            return Ok(not_found_reply(query));
        };

        let mut facilities = observe(
            FACILITIES_SERVICE,
            self.directory.nearby(&geo, self.radius_miles, self.max_results),
        )
        .await?;
        facilities.truncate(self.max_results);

        tracing::info!(
            query = %query,
            display_name = %geo.display_name,
            facilities = facilities.len(),
            "Resolved location"
        );

        if facilities.is_empty() {
            return Ok(no_facilities_reply(
                &geo.display_name,
                self.radius_miles,
                &self.fallback_url,
            ));
        }

        Ok(facilities_reply(&geo.display_name, &facilities, &self.fallback_url))
    }
}

/// Time an external call and attribute its failure to `service`
async fn observe<T>(
    service: &'static str,
    call: impl Future<Output = std::result::Result<T, IntegrationError>>,
) -> Result<T> {
    let start = Instant::now();
    let result = call.await;
    metrics::histogram!("vetchat_external_call_seconds", "service" => service)
        .record(start.elapsed().as_secs_f64());

    result.map_err(|e| {
        metrics::counter!("vetchat_external_errors_total", "service" => service).increment(1);
        tracing::warn!(service, error = %e, "External lookup failed");
        e.into_external(service)
    })
}

/// Header with the resolved place, then one block per facility
pub fn facilities_reply(display_name: &str, facilities: &[Facility], fallback_url: &str) -> String {
    let blocks: Vec<String> = facilities
        .iter()
        .map(|f| facility_block(f, fallback_url))
        .collect();

    format!(
        "📍 Nearest VA resources to {}:\n\n{}",
        display_name,
        blocks.join("\n\n")
    )
}

fn facility_block(facility: &Facility, fallback_url: &str) -> String {
    format!(
        "**{}**\n📞 {}\n🔗 {}",
        facility.name,
        facility.phone_or_default(),
        facility.url_or(fallback_url)
    )
}

pub fn not_found_reply(query: &LocationQuery) -> String {
    format!(
        "Sorry, I couldn't locate \"{}\". Try a 5-digit ZIP code or a city name, \
         like \"VA clinics in Dallas, TX\".",
        query
    )
}

pub fn no_facilities_reply(display_name: &str, radius_miles: u32, fallback_url: &str) -> String {
    format!(
        "I found {}, but there are no VA centers within {} miles. \
         You can search every VA location at {}",
        display_name, radius_miles, fallback_url
    )
}
