use axum_test::TestServer;
use axum_test::http::{HeaderName, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use studygroup_server::core::{AppState, JwtVerifier};
use studygroup_server::entities::Profile;
use studygroup_server::notifications::RecordingNotifier;
use studygroup_server::repositories::MemoryStore;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "ilmiobellissimosegretochevaassolutamentecambiato";
pub const TEST_BASE_URL: &str = "http://localhost:3000";

/// Istante sicuramente futuro usato dalla maggior parte dei test
pub const FUTURE_START: &str = "2099-12-25T10:00:00Z";

/// Crea un AppState per i test sopra un MemoryStore, senza attese tra le email
///
/// # Arguments
/// * `store` - Store in memoria condiviso con il test
/// * `notifier` - Notifier che registra le email invece di inviarle
pub fn create_test_state(store: Arc<MemoryStore>, notifier: Arc<RecordingNotifier>) -> Arc<AppState> {
    Arc::new(AppState::from_memory(
        store,
        Arc::new(JwtVerifier::new(TEST_JWT_SECRET)),
        notifier,
        Duration::ZERO,
        TEST_BASE_URL,
    ))
}

/// Crea un TestServer per i test
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = studygroup_server::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Genera un JWT token per testing, valido per 24 ore
///
/// # Arguments
/// * `user_id` - ID dell'utente (claim `sub`)
/// * `email` - Email dell'utente
/// * `jwt_secret` - Secret key per firmare il token
pub fn create_test_jwt(user_id: Uuid, email: &str, jwt_secret: &str) -> String {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{EncodingKey, Header, encode};
    use studygroup_server::auth::{AUTHENTICATED_AUDIENCE, Claims};

    let now = Utc::now();
    let claims = Claims {
        sub: user_id,
        email: Some(email.to_string()),
        aud: AUTHENTICATED_AUDIENCE.to_string(),
        exp: (now + Duration::hours(24)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("Failed to create JWT token")
}

/// Header Authorization con bearer token
pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        HeaderName::from_static("authorization"),
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("valid header value"),
    )
}

/// Utente di test con profilo e token
#[derive(Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub token: String,
}

/// Server, store e notifier di un singolo test
pub struct TestContext {
    pub server: TestServer,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let server = create_test_server(create_test_state(store.clone(), notifier.clone()));
        Self {
            server,
            store,
            notifier,
        }
    }

    /// Crea un utente con profilo, senza iscriverlo ad alcun gruppo
    pub async fn user(&self, name: &str) -> TestUser {
        let id = Uuid::new_v4();
        let email = format!("{}@example.com", name.to_lowercase());
        self.store
            .add_profile(Profile {
                id,
                full_name: Some(name.to_string()),
                email: Some(email.clone()),
            })
            .await;
        TestUser {
            id,
            name: name.to_string(),
            token: create_test_jwt(id, &email, TEST_JWT_SECRET),
            email,
        }
    }

    /// Crea un utente e lo iscrive al gruppo
    pub async fn member(&self, group_id: i64, name: &str) -> TestUser {
        let user = self.user(name).await;
        self.store.add_member(group_id, user.id).await;
        user
    }

    /// Crea una sessione tramite API e ne restituisce l'id
    pub async fn create_session(&self, group_id: i64, creator: &TestUser, start_at: &str) -> i64 {
        let (name, value) = bearer(&creator.token);
        let response = self
            .server
            .post(&format!("/api/groups/{}/sessions", group_id))
            .add_header(name, value)
            .json(&serde_json::json!({ "start_at": start_at, "topic": "Graph algorithms" }))
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["session"]["id"].as_i64().expect("session id")
    }

    /// Risponde a una sessione tramite l'endpoint autenticato
    pub async fn respond(
        &self,
        group_id: i64,
        session_id: i64,
        user: &TestUser,
        status: &str,
    ) -> axum_test::TestResponse {
        let (name, value) = bearer(&user.token);
        self.server
            .post(&format!(
                "/api/groups/{}/sessions/{}/respond",
                group_id, session_id
            ))
            .add_header(name, value)
            .json(&serde_json::json!({ "status": status }))
            .await
    }
}
