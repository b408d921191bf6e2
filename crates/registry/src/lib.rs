//! # Switchyard Registry
//!
//! The name-to-implementation table behind command dispatch. Plugins register
//! competing providers for the same logical operation during startup; the
//! sealed registry then resolves one implementation per call using the
//! caller's preference flags.
//!
//! Registration and execution are separate phases enforced by the type
//! system: a `RegistryBuilder` accepts registrations and `finish()` turns it
//! into an immutable `ProviderRegistry` that only executes.

pub mod preference;

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use switchyard_core::command::CommandArgs;
use switchyard_core::context::TurnContext;
use switchyard_core::error::{RegistryError, Result};
use switchyard_core::provider::Provider;

pub use preference::{InMemoryPreferences, NoPreferences, PreferenceStore};

/// Which table this registry is: commands are model-invocable and must carry
/// documentation, services are internal plumbing and need not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    Commands,
    Services,
}

/// One registered implementation, with its metadata captured at
/// registration time.
pub struct ProviderEntry {
    pub operation: String,
    pub provider_id: String,
    pub docstring: String,
    pub capabilities: Vec<String>,
    implementation: Arc<dyn Provider>,
}

impl std::fmt::Debug for ProviderEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderEntry")
            .field("operation", &self.operation)
            .field("provider_id", &self.provider_id)
            .field("docstring", &self.docstring)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Accumulates registrations during the startup phase.
pub struct RegistryBuilder {
    kind: RegistryKind,
    entries: Vec<ProviderEntry>,
    preferences: Arc<dyn PreferenceStore>,
}

impl RegistryBuilder {
    pub fn new(kind: RegistryKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            preferences: Arc::new(NoPreferences),
        }
    }

    /// Attach the persisted preference table consulted during resolution.
    pub fn with_preference_store(mut self, store: Arc<dyn PreferenceStore>) -> Self {
        self.preferences = store;
        self
    }

    /// Register a provider under its operation name.
    ///
    /// A second registration for the same `(operation, provider_id)` pair is
    /// an idempotent no-op: the first wins and a warning is logged. Command
    /// registries reject providers without a docstring.
    pub fn register(&mut self, provider: Arc<dyn Provider>) -> Result<()> {
        let operation = provider.operation().to_string();
        let provider_id = provider.provider_id().to_string();
        let docstring = provider.docstring().to_string();

        if self.kind == RegistryKind::Commands && docstring.trim().is_empty() {
            return Err(RegistryError::MissingDocstring {
                operation,
                provider_id,
            }
            .into());
        }

        if self
            .entries
            .iter()
            .any(|e| e.operation == operation && e.provider_id == provider_id)
        {
            warn!(
                operation,
                provider_id, "duplicate provider registration ignored"
            );
            return Ok(());
        }

        debug!(operation, provider_id, "provider registered");
        self.entries.push(ProviderEntry {
            operation,
            provider_id,
            docstring,
            capabilities: provider.capabilities(),
            implementation: provider,
        });
        Ok(())
    }

    /// Seal the builder. No further registration is possible on the result.
    pub fn finish(self) -> ProviderRegistry {
        let mut by_operation: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, entry) in self.entries.iter().enumerate() {
            by_operation
                .entry(entry.operation.clone())
                .or_default()
                .push(index);
        }
        ProviderRegistry {
            kind: self.kind,
            entries: self.entries,
            by_operation,
            preferences: self.preferences,
        }
    }
}

/// The sealed, immutable provider table.
pub struct ProviderRegistry {
    kind: RegistryKind,
    entries: Vec<ProviderEntry>,
    by_operation: HashMap<String, Vec<usize>>,
    preferences: Arc<dyn PreferenceStore>,
}

impl ProviderRegistry {
    pub fn kind(&self) -> RegistryKind {
        self.kind
    }

    /// Pick the implementation for `operation` given the caller's ordered
    /// preference flags.
    ///
    /// Resolution order:
    /// 1. the first flag with a persisted `(operation, flag)` preference
    ///    entry naming a registered provider (stale entries are skipped
    ///    with a warning),
    /// 2. the first flag matching any provider's capability flags, ties
    ///    broken by registration order,
    /// 3. a sole registrant.
    pub fn resolve(&self, operation: &str, flags: &[String]) -> Result<&ProviderEntry> {
        let candidates: Vec<&ProviderEntry> = self
            .by_operation
            .get(operation)
            .map(|indexes| indexes.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default();

        if candidates.is_empty() {
            return Err(RegistryError::UnknownOperation {
                operation: operation.to_string(),
            }
            .into());
        }

        for flag in flags {
            if let Some(wanted) = self.preferences.lookup(operation, flag) {
                match candidates.iter().find(|e| e.provider_id == wanted) {
                    Some(entry) => {
                        debug!(operation, flag, provider = %entry.provider_id, "resolved via preference table");
                        return Ok(entry);
                    }
                    None => {
                        warn!(
                            operation,
                            flag,
                            provider = %wanted,
                            "preference table names an unregistered provider, skipping"
                        );
                    }
                }
            }
        }

        for flag in flags {
            if let Some(entry) = candidates.iter().find(|e| e.capabilities.contains(flag)) {
                debug!(operation, flag, provider = %entry.provider_id, "resolved via capability flag");
                return Ok(entry);
            }
        }

        if let [only] = candidates.as_slice() {
            return Ok(only);
        }

        Err(RegistryError::Ambiguous {
            operation: operation.to_string(),
            candidates: candidates.len(),
            flags: flags.to_vec(),
        }
        .into())
    }

    /// Resolve and invoke in one step.
    ///
    /// Both resolution failures and handler failures surface as `Err`; the
    /// pipeline folds either into an error-shaped result for the model.
    pub async fn execute(
        &self,
        operation: &str,
        args: CommandArgs,
        ctx: &TurnContext,
    ) -> Result<Value> {
        let entry = self.resolve(operation, &ctx.preference_flags)?;
        debug!(operation, provider = %entry.provider_id, "dispatching");
        let result = entry.implementation.invoke(args, ctx).await?;
        Ok(result)
    }

    /// Docstrings for the allow-listed operations, in registration order.
    /// The first registrant's docstring represents an operation.
    pub fn documentation(&self, allowed: &dyn Fn(&str) -> bool) -> Vec<(String, String)> {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for entry in &self.entries {
            if !allowed(&entry.operation) || seen.contains(&&entry.operation) {
                continue;
            }
            seen.push(&entry.operation);
            out.push((entry.operation.clone(), entry.docstring.clone()));
        }
        out
    }

    /// Distinct operation names in registration order.
    pub fn operations(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for entry in &self.entries {
            if !seen.contains(&entry.operation.as_str()) {
                seen.push(entry.operation.as_str());
            }
        }
        seen
    }

    /// Provider ids registered for one operation, in registration order.
    pub fn providers_for(&self, operation: &str) -> Vec<&str> {
        self.by_operation
            .get(operation)
            .map(|indexes| {
                indexes
                    .iter()
                    .map(|&i| self.entries[i].provider_id.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use switchyard_core::error::{CommandError, Error};

    struct FakeProvider {
        operation: &'static str,
        provider_id: &'static str,
        docstring: &'static str,
        capabilities: Vec<String>,
    }

    impl FakeProvider {
        fn new(operation: &'static str, provider_id: &'static str) -> Self {
            Self {
                operation,
                provider_id,
                docstring: "does the thing",
                capabilities: Vec::new(),
            }
        }

        fn with_capability(mut self, flag: &str) -> Self {
            self.capabilities.push(flag.to_string());
            self
        }

        fn undocumented(mut self) -> Self {
            self.docstring = "";
            self
        }
    }

    #[async_trait]
    impl Provider for FakeProvider {
        fn operation(&self) -> &str {
            self.operation
        }
        fn provider_id(&self) -> &str {
            self.provider_id
        }
        fn docstring(&self) -> &str {
            self.docstring
        }
        fn capabilities(&self) -> Vec<String> {
            self.capabilities.clone()
        }
        async fn invoke(
            &self,
            _args: CommandArgs,
            _ctx: &TurnContext,
        ) -> std::result::Result<Value, CommandError> {
            Ok(json!({"provider": self.provider_id}))
        }
    }

    fn ctx_with_flags(flags: &[&str]) -> TurnContext {
        TurnContext::new(
            ["render".to_string()],
            flags.iter().map(|f| f.to_string()).collect(),
        )
    }

    #[test]
    fn register_and_resolve_sole_provider() {
        let mut builder = RegistryBuilder::new(RegistryKind::Commands);
        builder
            .register(Arc::new(FakeProvider::new("render", "builtin")))
            .unwrap();
        let registry = builder.finish();

        let entry = registry.resolve("render", &[]).unwrap();
        assert_eq!(entry.provider_id, "builtin");
    }

    #[test]
    fn unknown_operation_is_an_error() {
        let registry = RegistryBuilder::new(RegistryKind::Commands).finish();
        let err = registry.resolve("render", &[]).unwrap_err();
        assert!(matches!(
            err,
            Error::Registry(RegistryError::UnknownOperation { .. })
        ));
    }

    #[test]
    fn duplicate_registration_keeps_first() {
        let mut builder = RegistryBuilder::new(RegistryKind::Services);
        builder
            .register(Arc::new(
                FakeProvider::new("render", "builtin").with_capability("fast"),
            ))
            .unwrap();
        builder
            .register(Arc::new(FakeProvider::new("render", "builtin")))
            .unwrap();
        let registry = builder.finish();

        assert_eq!(registry.len(), 1);
        let entry = registry.resolve("render", &[]).unwrap();
        assert_eq!(entry.capabilities, vec!["fast".to_string()]);
    }

    #[test]
    fn command_registry_requires_docstring() {
        let mut builder = RegistryBuilder::new(RegistryKind::Commands);
        let err = builder
            .register(Arc::new(FakeProvider::new("render", "builtin").undocumented()))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Registry(RegistryError::MissingDocstring { .. })
        ));
    }

    #[test]
    fn service_registry_accepts_missing_docstring() {
        let mut builder = RegistryBuilder::new(RegistryKind::Services);
        builder
            .register(Arc::new(FakeProvider::new("render", "builtin").undocumented()))
            .unwrap();
        assert_eq!(builder.finish().len(), 1);
    }

    #[test]
    fn capability_flag_beats_registration_order() {
        let mut builder = RegistryBuilder::new(RegistryKind::Commands);
        builder
            .register(Arc::new(FakeProvider::new("render", "first")))
            .unwrap();
        builder
            .register(Arc::new(
                FakeProvider::new("render", "local_render").with_capability("local"),
            ))
            .unwrap();
        let registry = builder.finish();

        let entry = registry
            .resolve("render", &["local".to_string()])
            .unwrap();
        assert_eq!(entry.provider_id, "local_render");
    }

    #[test]
    fn preference_table_beats_capability_match() {
        let mut store = InMemoryPreferences::new();
        store.insert("render", "local", "pinned");

        let mut builder = RegistryBuilder::new(RegistryKind::Commands)
            .with_preference_store(Arc::new(store));
        builder
            .register(Arc::new(
                FakeProvider::new("render", "capable").with_capability("local"),
            ))
            .unwrap();
        builder
            .register(Arc::new(FakeProvider::new("render", "pinned")))
            .unwrap();
        let registry = builder.finish();

        let entry = registry
            .resolve("render", &["local".to_string()])
            .unwrap();
        assert_eq!(entry.provider_id, "pinned");
    }

    #[test]
    fn stale_preference_entry_is_skipped() {
        let mut store = InMemoryPreferences::new();
        store.insert("render", "local", "uninstalled_plugin");

        let mut builder = RegistryBuilder::new(RegistryKind::Commands)
            .with_preference_store(Arc::new(store));
        builder
            .register(Arc::new(
                FakeProvider::new("render", "capable").with_capability("local"),
            ))
            .unwrap();
        let registry = builder.finish();

        let entry = registry
            .resolve("render", &["local".to_string()])
            .unwrap();
        assert_eq!(entry.provider_id, "capable");
    }

    #[test]
    fn flag_priority_order_wins_over_entry_order() {
        let mut builder = RegistryBuilder::new(RegistryKind::Commands);
        builder
            .register(Arc::new(
                FakeProvider::new("render", "cheap").with_capability("cheap"),
            ))
            .unwrap();
        builder
            .register(Arc::new(
                FakeProvider::new("render", "fast").with_capability("fast"),
            ))
            .unwrap();
        let registry = builder.finish();

        let entry = registry
            .resolve("render", &["fast".to_string(), "cheap".to_string()])
            .unwrap();
        assert_eq!(entry.provider_id, "fast");
    }

    #[test]
    fn multiple_candidates_without_flags_is_ambiguous() {
        let mut builder = RegistryBuilder::new(RegistryKind::Commands);
        builder
            .register(Arc::new(FakeProvider::new("render", "a")))
            .unwrap();
        builder
            .register(Arc::new(FakeProvider::new("render", "b")))
            .unwrap();
        let registry = builder.finish();

        let err = registry.resolve("render", &["gpu".to_string()]).unwrap_err();
        match err {
            Error::Registry(RegistryError::Ambiguous {
                operation,
                candidates,
                flags,
            }) => {
                assert_eq!(operation, "render");
                assert_eq!(candidates, 2);
                assert_eq!(flags, vec!["gpu".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn documentation_respects_allowlist_and_first_registrant() {
        let mut builder = RegistryBuilder::new(RegistryKind::Commands);
        builder
            .register(Arc::new(FakeProvider::new("render", "first")))
            .unwrap();
        builder
            .register(Arc::new(FakeProvider::new("render", "second")))
            .unwrap();
        builder
            .register(Arc::new(FakeProvider::new("secret_op", "x")))
            .unwrap();
        let registry = builder.finish();

        let docs = registry.documentation(&|name| name == "render");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].0, "render");
        assert_eq!(docs[0].1, "does the thing");
    }

    #[tokio::test]
    async fn execute_routes_to_resolved_provider() {
        let mut builder = RegistryBuilder::new(RegistryKind::Commands);
        builder
            .register(Arc::new(
                FakeProvider::new("render", "local_render").with_capability("local"),
            ))
            .unwrap();
        builder
            .register(Arc::new(FakeProvider::new("render", "other")))
            .unwrap();
        let registry = builder.finish();

        let ctx = ctx_with_flags(&["local"]);
        let result = registry
            .execute("render", CommandArgs::Single(Value::Null), &ctx)
            .await
            .unwrap();
        assert_eq!(result, json!({"provider": "local_render"}));
    }

    #[tokio::test]
    async fn execute_surfaces_resolution_failure() {
        let registry = RegistryBuilder::new(RegistryKind::Commands).finish();
        let ctx = ctx_with_flags(&[]);
        let err = registry
            .execute("missing", CommandArgs::Single(Value::Null), &ctx)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
