//! Profile entity - Dati anagrafici usati per le notifiche

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Profile {
    pub id: Uuid, // coincide con l'id dell'utente nel servizio di autenticazione
    pub full_name: Option<String>,
    pub email: Option<String>,
}

impl Profile {
    /// Nome da mostrare nelle email: full_name, altrimenti l'email, altrimenti un placeholder
    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .filter(|name| !name.trim().is_empty())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| "A group member".to_string())
    }
}
