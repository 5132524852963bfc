//! URL handling: normalization, fingerprinting, and domain matching
//!
//! Dedup is keyed on a fingerprint of the normalized URL, so everything the
//! crawler considers "the same page" is decided here.

mod domain;
mod normalize;

pub use domain::{domain_allowed, extract_domain};
pub use normalize::{fingerprint, normalize_url};
