//! Built-in command implementations for Switchyard.
//!
//! Commands give the model its vocabulary: speak to the user, think out
//! loud, end the turn. The delegate exchange is internal plumbing and goes
//! into a services registry instead of the model-facing one.

pub mod delegate;
pub mod finish;
pub mod reasoning;
pub mod say;

use std::sync::Arc;

use switchyard_core::error::Result;
use switchyard_registry::{
    NoPreferences, PreferenceStore, ProviderRegistry, RegistryBuilder, RegistryKind,
};
use tokio::sync::mpsc;

pub use delegate::{DEFAULT_EXCHANGE_TIMEOUT_SECS, DelegateProvider, ExchangeRequest};
pub use finish::FinishCommand;
pub use reasoning::ReasoningCommand;
pub use say::SayCommand;

/// The model-facing registry with every built-in command registered.
pub fn default_commands() -> Result<ProviderRegistry> {
    commands_with_preferences(Arc::new(NoPreferences))
}

/// Same as [`default_commands`], resolving against a persisted preference
/// table.
pub fn commands_with_preferences(
    preferences: Arc<dyn PreferenceStore>,
) -> Result<ProviderRegistry> {
    let mut builder =
        RegistryBuilder::new(RegistryKind::Commands).with_preference_store(preferences);
    builder.register(Arc::new(SayCommand))?;
    builder.register(Arc::new(ReasoningCommand))?;
    builder.register(Arc::new(FinishCommand))?;
    Ok(builder.finish())
}

/// The internal services registry, wired to a sub-agent exchange endpoint.
pub fn default_services(
    requests: mpsc::Sender<ExchangeRequest>,
    exchange_timeout_secs: u64,
) -> Result<ProviderRegistry> {
    let mut builder = RegistryBuilder::new(RegistryKind::Services);
    builder.register(Arc::new(
        DelegateProvider::new(requests).with_timeout_secs(exchange_timeout_secs),
    ))?;
    Ok(builder.finish())
}
