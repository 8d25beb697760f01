pub mod assistant;
pub mod client;
pub mod context;
pub mod intent;
pub mod session;

pub use assistant::{AssistantError, ChatAssistant, ChatReply};
pub use client::{ChatMessage, CompletionClient, CompletionError, HttpCompletionClient};
pub use intent::{BookingIntent, ExtractedReply, IntentError, ValidatedIntent};
pub use session::{AgentError, IntentOutcome, PendingBooking, SchedulingAgent, SessionState};
