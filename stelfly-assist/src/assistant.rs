//! Ties the completion client, intent extraction, and the scheduling agent
//! into one conversational turn handler.

use std::sync::Arc;

use chrono::NaiveDate;
use stelfly_core::resource::ResourceCatalog;
use stelfly_sched::coordinator::CoordinatorError;
use stelfly_sched::ledger::{BookingLedger, LedgerError};

use crate::client::{ChatMessage, CompletionClient, CompletionError};
use crate::context;
use crate::intent::{self, IntentError};
use crate::session::{AgentError, IntentOutcome, SchedulingAgent, SessionState};

/// Only a failed completion call is an error to the caller; every booking
/// failure becomes assistant text so the conversation can recover.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    #[error(transparent)]
    Completion(#[from] CompletionError),
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Assistant text with all protocol markers stripped.
    pub message: String,
    /// What the turn did to the schedule, when it did anything.
    pub outcome: Option<IntentOutcome>,
}

pub struct ChatAssistant {
    client: Arc<dyn CompletionClient>,
    ledger: Arc<BookingLedger>,
    catalog: Arc<ResourceCatalog>,
    agent: SchedulingAgent,
}

impl ChatAssistant {
    pub fn new(
        client: Arc<dyn CompletionClient>,
        ledger: Arc<BookingLedger>,
        catalog: Arc<ResourceCatalog>,
    ) -> Self {
        let agent = SchedulingAgent::new(ledger.clone(), catalog.clone());
        Self {
            client,
            ledger,
            catalog,
            agent,
        }
    }

    /// Runs one conversational turn: render context, complete, extract and
    /// apply any structured intent, and report back in plain language.
    pub async fn handle_turn(
        &self,
        session: &mut SessionState,
        messages: &[ChatMessage],
        today: NaiveDate,
    ) -> Result<ChatReply, AssistantError> {
        let schedule = context::schedule_context(&self.ledger, &self.catalog, today);
        let prompt =
            context::system_prompt(&self.catalog, &schedule, session.pending.as_ref(), today);

        let raw = self.client.complete(&prompt, messages).await?;
        let extracted = intent::extract_reply(&raw);

        // An intent wins over a clear marker when a reply carries both.
        if let Some(ref booking_intent) = extracted.intent {
            let result =
                self.agent
                    .apply_intent(session, booking_intent, extracted.needs_more_info);
            return Ok(match result {
                Ok(outcome) => ChatReply {
                    message: outcome_message(&extracted.message, &outcome),
                    outcome: Some(outcome),
                },
                Err(err) => {
                    tracing::warn!(error = %err, "booking intent rejected");
                    ChatReply {
                        message: failure_message(&err),
                        outcome: None,
                    }
                }
            });
        }

        if extracted.clear_pending {
            let outcome = self.agent.clear_pending(session);
            return Ok(ChatReply {
                message: if extracted.message.is_empty() {
                    "No problem, I've set that booking aside. Anything else?".to_string()
                } else {
                    extracted.message
                },
                outcome: Some(outcome),
            });
        }

        Ok(ChatReply {
            message: extracted.message,
            outcome: None,
        })
    }
}

fn outcome_message(model_text: &str, outcome: &IntentOutcome) -> String {
    let status = match outcome {
        IntentOutcome::Booked { booking_id, .. } => {
            format!("Booking confirmed (ref {booking_id}).")
        }
        IntentOutcome::DraftCreated { missing, .. } | IntentOutcome::DraftUpdated { missing, .. } => {
            format!("I've pencilled that in. Still need: {}.", missing.join(", "))
        }
        IntentOutcome::DraftCompleted { booking_id, .. } => {
            format!("All set, booking confirmed (ref {booking_id}).")
        }
        IntentOutcome::Modified { booking_id } => {
            format!("Booking {booking_id} updated.")
        }
        IntentOutcome::PendingCleared => "Pending booking cleared.".to_string(),
    };
    if model_text.is_empty() {
        status
    } else {
        format!("{model_text}\n\n{status}")
    }
}

/// Maps an internal failure to something the member can act on.
fn failure_message(err: &AgentError) -> String {
    match err {
        AgentError::Intent(IntentError::UnknownAircraft(name)) => {
            format!("I don't recognize the aircraft \"{name}\". Could you pick one from the fleet?")
        }
        AgentError::Intent(IntentError::UnknownInstructor(name)) => {
            format!("I couldn't find an instructor named \"{name}\". Who should I book?")
        }
        AgentError::Intent(IntentError::Slot(e)) => {
            format!("That time won't work: {e}. We operate 07:00 to 18:00.")
        }
        AgentError::Intent(e) => {
            format!("I couldn't complete that booking: {e}.")
        }
        AgentError::Maintenance(e) => {
            format!("That aircraft can't take the flight: {e}.")
        }
        AgentError::Coordinator(CoordinatorError::Ledger(LedgerError::SlotOccupied {
            time, ..
        })) => {
            format!("The {time} slot is already taken. Would a different time work?")
        }
        AgentError::Coordinator(CoordinatorError::UnknownBooking(id)) => {
            format!("I couldn't find a booking with reference {id} to change.")
        }
        AgentError::Coordinator(CoordinatorError::PartialLinkFailure {
            aircraft_booking_id,
            ..
        }) => {
            format!(
                "The aircraft was booked (ref {aircraft_booking_id}) but the instructor's slot \
                 couldn't be reserved. Please have the office check the instructor's schedule."
            )
        }
        AgentError::Coordinator(e) => {
            format!("I couldn't complete that booking: {e}.")
        }
    }
}
