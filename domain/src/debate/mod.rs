//! Debate lifecycle: the aggregate, its state machine and round bookkeeping

pub mod config;
pub mod entities;
pub mod participant;
pub mod round;
pub mod state;
pub mod termination;
pub mod turn_order;

pub use config::DebateConfig;
pub use entities::{Debate, RoundAdvance, RoundClosure, SubmitOutcome, TurnTicket};
pub use participant::{NewParticipant, Participant, ParticipantType, Position};
pub use round::{Response, ResponseDraft, Round, RoundStatus, TurnSlot, TurnState};
pub use state::{DebateEvent, DebateStatus, transition};
pub use termination::{RunToMaxRounds, StopWhenSilent, TerminationDecision, TerminationPolicy};
pub use turn_order::TurnOrder;
