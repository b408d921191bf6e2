//! # Switchyard Runtime
//!
//! The turn execution loop — the heart of Switchyard.
//!
//! A turn follows a **stream → parse → dispatch** cycle:
//!
//! 1. **Receive** a text chunk from the upstream model stream
//! 2. **Re-parse** the whole accumulated buffer through the strategy ladder
//! 3. **Dispatch** each newly completed command, strictly in array order
//! 4. **Announce** progress of the still-open trailing command
//! 5. **Repeat** until the stream ends, the turn is finished cooperatively,
//!    or the buffer proves terminally unparseable
//!
//! Each dispatched command is echoed into the transcript before it runs and
//! its result is recorded after, so the conversation log always reflects
//! exactly what was executed. A turn that executes nothing does not error:
//! it writes feedback for the model into the transcript and reports itself
//! as failed.

pub mod delta;
pub mod report;
pub mod runner;

pub use delta::PartialTracker;
pub use report::{TurnOutcome, TurnReport};
pub use runner::TurnRunner;
