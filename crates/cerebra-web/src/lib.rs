//! cerebra-web — HTTP surface for the Cerebra retrieval service.
//! JSON endpoints wrapped in the standard envelope, multipart PDF upload,
//! and the XLSX evaluation round-trip.

pub mod error;
pub mod handlers;
pub mod router;
pub mod state;
