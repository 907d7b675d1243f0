//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità che rappresentano le righe persistite nello store esterno.
//! Ogni entity corrisponde a una tabella del database.

pub mod enums;
pub mod group_member;
pub mod invite;
pub mod message;
pub mod profile;
pub mod session;

// Re-exports per facilitare l'import
pub use enums::InviteStatus;
pub use group_member::GroupMember;
pub use invite::Invite;
pub use message::GroupMessage;
pub use profile::Profile;
pub use session::Session;
