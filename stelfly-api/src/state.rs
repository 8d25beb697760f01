use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use stelfly_assist::{ChatAssistant, CompletionClient, SessionState};
use stelfly_core::resource::ResourceCatalog;
use stelfly_sched::coordinator::LinkedBookings;
use stelfly_sched::ledger::BookingLedger;

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<BookingLedger>,
    pub catalog: Arc<ResourceCatalog>,
    pub linked: Arc<LinkedBookings>,
    pub assistant: Arc<ChatAssistant>,
    /// Conversation state per chat session id. Each session is locked for
    /// the duration of its turn so markers apply in order.
    pub sessions: Arc<DashMap<String, Arc<Mutex<SessionState>>>>,
}

impl AppState {
    pub fn new(catalog: ResourceCatalog, client: Arc<dyn CompletionClient>) -> Self {
        let ledger = Arc::new(BookingLedger::new());
        let catalog = Arc::new(catalog);
        let linked = Arc::new(LinkedBookings::new(ledger.clone(), catalog.clone()));
        let assistant = Arc::new(ChatAssistant::new(client, ledger.clone(), catalog.clone()));
        Self {
            ledger,
            catalog,
            linked,
            assistant,
            sessions: Arc::new(DashMap::new()),
        }
    }

    /// Returns the session's state handle, creating it on first use. The
    /// handle is cloned out so the map guard is not held across an await.
    pub fn session(&self, session_id: &str) -> Arc<Mutex<SessionState>> {
        self.sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(SessionState::default())))
            .clone()
    }
}
