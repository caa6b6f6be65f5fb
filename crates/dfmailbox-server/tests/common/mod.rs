//! Shared helpers: mock federation instances and a wired mailbox

#![allow(dead_code)]

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use dfmailbox_bridge::{
    handlers::{JwtHandler, PlotCredentialHandler},
    IdentityBridgeBuilder, StaticOwnerResolver,
};
use dfmailbox_core::{Challenge, IdentityProof, SigningIdentity};
use dfmailbox_server::{AppState, HttpOwnershipVerifier, MemoryStore};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const MAILBOX_ADDRESS: &str = "localhost:8080";
pub const MAILBOX_KEY: &str = "TESTING0KEYTESTING0KEYTESTING0KEYTESTING000=";
pub const JWT_SECRET: &[u8] = b"integration-secret";

pub const NOTCH: &str = "069a79f4-44e9-4726-a5be-fca90e38aaf5";
pub const JEB: &str = "853c80ef-3c37-49fd-aa49-938b674adae6";
pub const DINNERBONE: &str = "61699b2e-d327-4a01-9f1e-0ea8c3f06bc6";

// =============================================================================
// Mock Instance
// =============================================================================

/// How a mock instance answers challenges
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Sign and report its own address
    Honest,
    /// Sign and report another address
    ClaimAddress(String),
    /// Send back a previously captured proof
    Replay(IdentityProof),
    /// Answer with something that is not a proof
    Garbage,
}

#[derive(Clone)]
struct MockState {
    address: String,
    identity: Arc<SigningIdentity>,
    hits: Arc<AtomicUsize>,
    behavior: Arc<Mutex<Behavior>>,
    last_proof: Arc<Mutex<Option<IdentityProof>>>,
    last_challenge: Arc<Mutex<Option<Challenge>>>,
}

async fn answer(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    let Some(challenge) = query.get("challenge").and_then(|c| Challenge::parse(c).ok()) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    *state.last_challenge.lock() = Some(challenge);

    let behavior = state.behavior.lock().clone();
    let proof = match behavior {
        Behavior::Honest => IdentityProof::answer(&state.identity, &state.address, &challenge),
        Behavior::ClaimAddress(address) => {
            IdentityProof::answer(&state.identity, &address, &challenge)
        }
        Behavior::Replay(proof) => proof,
        Behavior::Garbage => return "definitely not a proof".into_response(),
    };

    *state.last_proof.lock() = Some(proof.clone());
    Json(proof).into_response()
}

/// A federation instance served on an ephemeral local port
pub struct MockInstance {
    pub address: String,
    pub identity: Arc<SigningIdentity>,
    state: MockState,
}

impl MockInstance {
    pub async fn spawn(identity: Arc<SigningIdentity>) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();

        let state = MockState {
            address: address.clone(),
            identity: identity.clone(),
            hits: Arc::new(AtomicUsize::new(0)),
            behavior: Arc::new(Mutex::new(Behavior::Honest)),
            last_proof: Arc::new(Mutex::new(None)),
            last_challenge: Arc::new(Mutex::new(None)),
        };
        let app = Router::new()
            .route("/v0/federation/instance", get(answer))
            .with_state(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            address,
            identity,
            state,
        }
    }

    pub async fn spawn_fresh() -> Self {
        Self::spawn(Arc::new(SigningIdentity::generate())).await
    }

    /// Base64url public key, as a client would send it
    pub fn public_key(&self) -> String {
        self.identity.public_key().to_base64url()
    }

    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    pub fn set_behavior(&self, behavior: Behavior) {
        *self.state.behavior.lock() = behavior;
    }

    pub fn last_proof(&self) -> Option<IdentityProof> {
        self.state.last_proof.lock().clone()
    }

    /// The most recent challenge this instance was asked to sign
    pub fn last_challenge(&self) -> Option<Challenge> {
        *self.state.last_challenge.lock()
    }
}

/// An address nothing listens on
pub async fn dead_address() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);
    address
}

// =============================================================================
// Mailbox
// =============================================================================

/// A mailbox with in-memory storage, trusting plot credentials for the
/// usual test owners and accepting bearer tokens signed with `JWT_SECRET`
pub fn mailbox() -> Arc<AppState> {
    let resolver = StaticOwnerResolver::from_pairs(&format!(
        "Notch={},jeb_={},dinnerbone={}",
        NOTCH, JEB, DINNERBONE
    ))
    .unwrap();

    let bridge = IdentityBridgeBuilder::new()
        .with_handler(JwtHandler::new(JWT_SECRET))
        .with_handler(PlotCredentialHandler::new(Arc::new(resolver)))
        .build();

    let verifier = HttpOwnershipVerifier::new(Duration::from_secs(2)).unwrap();

    Arc::new(AppState::new(
        SigningIdentity::from_base64(MAILBOX_KEY).unwrap(),
        MAILBOX_ADDRESS,
        Arc::new(MemoryStore::new()),
        Arc::new(verifier),
        bridge,
    ))
}
