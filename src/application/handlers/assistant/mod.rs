//! Assistant handlers: turn submission, form completion, idle sweep.

pub mod complete_form;
pub mod submit_message;
pub mod sweep_idle;

pub use complete_form::{CompleteFormError, CompleteFormHandler};
pub use submit_message::{
    SubmitMessageCommand, SubmitMessageError, SubmitMessageHandler, TurnOutcome, APOLOGY_MESSAGE,
    WELCOME_MESSAGE,
};
pub use sweep_idle::SweepIdleHandler;
