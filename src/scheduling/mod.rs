//! Scheduling module - Regole di calendario delle sessioni
//!
//! - `conflict`: rilevamento del doppio booking (stesso istante di inizio)
//! - `fanout`: inviti e avvisi di conflitto generati dalla creazione di una sessione

pub mod conflict;
pub mod fanout;

pub use conflict::ConflictDetector;
pub use fanout::{InviteFanout, conflict_alert, invitation};
