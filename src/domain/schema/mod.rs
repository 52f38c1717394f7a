//! Response schema descriptors and their fingerprints
//!
//! A response schema describes the shape a structured completion must take.
//! Its fingerprint partitions cached answers so that a query asking for one
//! shape never receives an answer stored for another.

mod descriptor;
mod fingerprint;

pub use descriptor::ResponseSchema;
pub use fingerprint::{canonical_json, fingerprint, FINGERPRINT_HEX_LEN, FINGERPRINT_PREFIX};
