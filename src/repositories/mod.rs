//! Repositories module - Coordinatore per tutti i repository del progetto
//!
//! Questo modulo organizza lo store adapter in sotto-moduli separati.
//! I trait in `traits` definiscono le operazioni; `SessionRepository`, `MembershipRepository`,
//! `ProfileRepository` e `MessageRepository` le implementano su PostgreSQL,
//! `MemoryStore` le implementa in memoria.
//!
//! Le query sono scritte con `sqlx::query_as::<_, T>()` e verificate a runtime:
//! il crate compila senza un database raggiungibile.

// Dichiarazione dei sotto-moduli
pub mod membership;
pub mod memory;
pub mod message;
pub mod profile;
pub mod session;
pub mod traits;

// Re-esportazione dei trait per facilitare l'import
pub use traits::{MembershipStore, MessageStore, ProfileStore, SessionStore, StoreError};

// Re-esportazione delle struct dei repository per facilitare l'import
pub use membership::MembershipRepository;
pub use memory::MemoryStore;
pub use message::MessageRepository;
pub use profile::ProfileRepository;
pub use session::SessionRepository;
