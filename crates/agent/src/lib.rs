//! VetChat reply agent
//!
//! Routes each message to one of four reply sources:
//! - Crisis resources (always first unless `routing.crisis_first` is off)
//! - Nearby VA facilities for a postal code or "in <place>" phrase
//! - Canned support-topic replies
//! - A generative fallback model

pub mod composer;
pub mod traits;

pub use composer::ReplyComposer;
pub use traits::Agent;
