//! Location lookups for VetChat
//!
//! The location resolver and the external services behind it:
//! - **Geocoding**: OpenStreetMap Nominatim
//! - **Facility directory**: VA Lighthouse Facilities API
//!
//! Both services sit behind traits ([`Geocoder`], [`FacilityDirectory`]) with
//! stub implementations for development and tests.

pub mod facilities;
pub mod geocoding;
pub mod integrations;
pub mod locator;

pub use facilities::VaFacilitiesDirectory;
pub use geocoding::NominatimGeocoder;
pub use integrations::{
    FacilityDirectory, Geocoder, IntegrationError, StubFacilityDirectory, StubGeocoder,
    FACILITIES_SERVICE, GEOCODER_SERVICE,
};
pub use locator::LocationResolver;
