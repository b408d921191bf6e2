//! # Switchyard Core
//!
//! Domain types, traits, and error definitions for Switchyard: a runtime that
//! turns a model's streamed text into reliably executed commands. This crate
//! defines the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The parser, registry, and pipeline crates all depend inward on the types
//! here and never on each other's internals. This enables:
//! - Swapping provider implementations via configuration
//! - Easy testing with mock/stub implementations
//! - A clean dependency graph (all crates depend inward on core)

pub mod command;
pub mod context;
pub mod error;
pub mod event;
pub mod provider;
pub mod transcript;

// Re-export key types at crate root for ergonomics
pub use command::{Command, CommandArgs, ParsedBatch};
pub use context::TurnContext;
pub use error::{CommandError, Error, ParseError, RegistryError, Result};
pub use provider::Provider;
pub use event::{ChannelObserver, NullObserver, PartialDelta, PipelineEvent, TurnObserver};
pub use transcript::{AppendOutcome, Checkpoint, Role, Transcript, TranscriptMessage};
