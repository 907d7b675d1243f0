//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server e verso lo store.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod invite;
pub mod message;
pub mod query;
pub mod session;

// Re-exports per facilitare l'import
pub use invite::{InviteDTO, InviteListResponse, RespondRequestDTO};
pub use message::{
    CreateGroupMessageDTO, CreateGroupMessageRequestDTO, GroupMessageDTO,
    GroupMessageListResponse, GroupMessageResponse,
};
pub use query::MessagesQuery;
pub use session::{
    CreateSessionDTO, CreateSessionRequestDTO, MessageResponse, SessionDTO, SessionListResponse,
    SessionResponse, StartAtError, parse_start_at,
};
