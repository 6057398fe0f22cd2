//! Entity structs for Warden domain objects.
//!
//! Each entity maps to a table in the libSQL database (see `warden-db`
//! migrations). All structs derive `Serialize`, `Deserialize`, and `JsonSchema`
//! for JSON roundtrip and schema validation.

mod audit;

pub use audit::Audit;
