//! # Offer Sessions
//!
//! Offer boards kept between the offers request and checkout, keyed by a
//! random session id. A session is stored as soon as aggregation starts and
//! [`follow_feed`] fills its board in as providers answer. Sessions expire
//! after [`SESSION_TTL`].

use lib_core::AppError;
use lib_exchange::error::GENERIC_OFFER_ERROR;
use lib_exchange::OfferRequest;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::services::checkout::CheckoutState;
use crate::services::offers::{OfferBoard, OfferFeed};

pub const SESSION_TTL: Duration = Duration::from_secs(30 * 60);

/// One user's offers and their checkout progress.
#[derive(Debug)]
pub struct OfferSession {
    pub request: OfferRequest,
    pub board: OfferBoard,
    pub checkout: CheckoutState,
    created_at: Instant,
}

impl OfferSession {
    pub fn new(request: OfferRequest, board: OfferBoard) -> Self {
        Self {
            request,
            board,
            checkout: CheckoutState::Idle,
            created_at: Instant::now(),
        }
    }
}

pub type SharedSession = Arc<Mutex<OfferSession>>;

pub struct OfferSessions {
    ttl: Duration,
    sessions: RwLock<HashMap<Uuid, (Instant, SharedSession)>>,
}

impl Default for OfferSessions {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

impl OfferSessions {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Store a session and prune expired ones.
    pub async fn insert(&self, session: OfferSession) -> Uuid {
        let id = Uuid::new_v4();
        let created_at = session.created_at;
        let mut sessions = self.sessions.write().await;

        let before = sessions.len();
        sessions.retain(|_, (created, _)| created.elapsed() < self.ttl);
        if sessions.len() < before {
            debug!(pruned = before - sessions.len(), "Pruned expired offer sessions");
        }

        sessions.insert(id, (created_at, Arc::new(Mutex::new(session))));
        id
    }

    pub async fn get(&self, id: Uuid) -> Result<SharedSession, AppError> {
        let sessions = self.sessions.read().await;
        match sessions.get(&id) {
            Some((created, session)) if created.elapsed() < self.ttl => Ok(Arc::clone(session)),
            _ => Err(AppError::NotFound(format!("Offer session {} not found or expired", id))),
        }
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Apply each provider outcome to the session's board as it arrives.
pub async fn follow_feed(mut feed: OfferFeed, session: SharedSession) {
    while let Some(update) = feed.next_update().await {
        let provider = update.provider;
        session.lock().await.board.apply(update);
        debug!(provider = %provider, "Offer settled");
    }

    let mut session = session.lock().await;
    if !session.board.is_settled() {
        session.board.fail_unsettled(GENERIC_OFFER_ERROR);
    }
}
