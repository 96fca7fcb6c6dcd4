//! Hard-sphere contact discovery, impulse response, and positional correction.

pub mod contact;
pub mod depenetration;
pub mod response;

pub use contact::{find_contacts, find_contacts_into, ContactGeometry};
pub use depenetration::Depenetrator;
pub use response::{interact, reflect_off_wall, resolve_particle, InteractionOutcome};
