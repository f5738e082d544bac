//! Main runtime orchestration with capability-based transport system.
//!
//! The runtime starts adapters with an [`AdapterContext`] holding the
//! transport capabilities enabled at build time and the runtime's
//! [`HostBus`]. Everything adapters report (lifecycle signals, bus events,
//! inbound and sent sessions) is fanned out to subscribers of
//! [`BronzeRuntime::subscribe`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use bronze_runtime::BronzeRuntime;
//!
//! // Auto-loads config from the current directory
//! let runtime = BronzeRuntime::new();
//!
//! // Custom configuration path
//! let runtime = BronzeRuntime::builder()
//!     .config_file("config/bronze.yaml")
//!     .build()?;
//! ```

use std::future::Future;
use std::sync::Arc;

use bronze_core::{
    AdapterContext, BoxedAdapter, ConfigurableAdapter, HostBus, HostEvent, TransportContext,
};
use tokio::signal;
use tokio::sync::{Mutex, RwLock, broadcast};
use tracing::{debug, error, info, warn};

use crate::config::{BronzeConfig, ConfigLoader, ConfigResult};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// A registered adapter and the context it runs in.
struct AdapterEntry {
    name: String,
    adapter: BoxedAdapter,
    ctx: AdapterContext,
}

/// The Bronze runtime: owns adapters, transports and the host bus.
///
/// ```rust,ignore
/// let runtime = BronzeRuntime::new();
/// runtime.register_adapter::<DiscordAdapter>().await?;
///
/// let mut events = runtime.subscribe();
/// tokio::spawn(async move {
///     while let Ok(event) = events.recv().await {
///         println!("{event:?}");
///     }
/// });
///
/// runtime.run().await?;
/// ```
pub struct BronzeRuntime {
    /// The configuration.
    config: BronzeConfig,
    /// Registered adapters, in registration order.
    adapters: Mutex<Vec<AdapterEntry>>,
    /// Transport context handed to adapters.
    transport_context: TransportContext,
    /// Host receiving adapter output.
    host: HostBus,
    /// Whether the runtime is running.
    running: RwLock<bool>,
}

impl BronzeRuntime {
    /// Creates a new runtime with automatic configuration loading.
    ///
    /// If no configuration can be loaded, default settings are used.
    pub fn new() -> Self {
        let config = ConfigLoader::new()
            .with_current_dir()
            .load()
            .unwrap_or_else(|e| {
                eprintln!("Warning: Failed to load config ({e}), using defaults");
                BronzeConfig::default()
            });

        Self::from_config(&config)
    }

    /// Creates a runtime builder for custom configuration.
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Creates a new runtime from configuration.
    ///
    /// Initializes logging and a transport context with all enabled
    /// capabilities.
    pub fn from_config(config: &BronzeConfig) -> Self {
        logging::init_from_config(&config.logging);

        let transport_context = Self::create_default_transport_context();

        info!(
            log_level = %config.logging.level,
            log_format = ?config.logging.format,
            "Runtime initialized from configuration"
        );

        Self {
            config: config.clone(),
            adapters: Mutex::new(Vec::new()),
            transport_context,
            host: HostBus::default(),
            running: RwLock::new(false),
        }
    }

    /// Returns a reference to the configuration.
    pub fn config(&self) -> &BronzeConfig {
        &self.config
    }

    /// Replaces the transport context handed to adapters started afterwards.
    pub fn with_transport_context(mut self, ctx: TransportContext) -> Self {
        self.transport_context = ctx;
        self
    }

    /// Subscribes to everything adapters report.
    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.host.subscribe()
    }

    /// Returns the host bus.
    pub fn host(&self) -> &HostBus {
        &self.host
    }

    #[allow(unused_mut)]
    fn create_default_transport_context() -> TransportContext {
        let mut ctx = TransportContext::new();

        #[cfg(feature = "ws-client")]
        {
            use bronze_transport::WsClientCapabilityImpl;
            ctx = ctx.with_ws_client(Arc::new(WsClientCapabilityImpl::new()));
            debug!("Registered WsClient capability");
        }

        #[cfg(feature = "http-client")]
        {
            use bronze_transport::HttpClientCapabilityImpl;
            match HttpClientCapabilityImpl::new() {
                Ok(client) => {
                    ctx = ctx.with_http_client(Arc::new(client));
                    debug!("Registered HttpClient capability");
                }
                Err(e) => error!(error = %e, "Failed to create HTTP client"),
            }
        }

        ctx
    }

    /// Registers an adapter with the runtime.
    ///
    /// The adapter's config is read from `adapters.<name>`, falling back to
    /// the config type's default when the section is absent.
    pub async fn register_adapter<A>(&self) -> RuntimeResult<()>
    where
        A: ConfigurableAdapter + 'static,
    {
        let adapter_name = A::name();

        let config: A::Config = if let Some(value) = self.config.adapters.get(adapter_name) {
            value.deserialize().map_err(|e| {
                RuntimeError::AdapterConfigDeserialize(format!(
                    "Failed to deserialize config for adapter '{adapter_name}': {e}"
                ))
            })?
        } else {
            warn!(
                adapter = adapter_name,
                "No configuration found for adapter, using default"
            );
            Default::default()
        };

        let adapter: BoxedAdapter = A::from_config(config)?;
        self.insert_adapter(adapter_name, adapter).await?;
        info!(adapter = adapter_name, "Registered adapter");
        Ok(())
    }

    /// Registers an already constructed adapter under `name`.
    pub async fn insert_adapter(&self, name: &str, adapter: BoxedAdapter) -> RuntimeResult<()> {
        let mut adapters = self.adapters.lock().await;
        if adapters.iter().any(|entry| entry.name == name) {
            return Err(RuntimeError::AdapterExists(name.to_string()));
        }
        adapters.push(AdapterEntry {
            name: name.to_string(),
            adapter,
            ctx: AdapterContext::new(self.transport_context.clone(), Arc::new(self.host.clone())),
        });
        debug!(adapter = %name, "Adapter context created");
        Ok(())
    }

    /// Returns the number of registered adapters.
    pub async fn adapter_count(&self) -> usize {
        self.adapters.lock().await.len()
    }

    /// Returns whether the runtime is currently running.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Starts every registered adapter.
    ///
    /// An adapter that fails to start is logged and skipped.
    pub async fn start(&self) -> RuntimeResult<()> {
        {
            let mut running = self.running.write().await;
            if *running {
                warn!("Runtime is already running");
                return Ok(());
            }
            *running = true;
        }

        info!("Starting Bronze runtime");

        let mut adapters = self.adapters.lock().await;
        for entry in adapters.iter_mut() {
            if let Err(e) = entry.adapter.on_start(&mut entry.ctx).await {
                error!(adapter = %entry.name, error = %e, "Failed to start adapter");
                continue;
            }
            info!(adapter = %entry.name, "Adapter started");
        }

        info!("Runtime started");
        Ok(())
    }

    /// Stops the runtime and all adapters.
    pub async fn stop(&self) -> RuntimeResult<()> {
        {
            let mut running = self.running.write().await;
            if !*running {
                warn!("Runtime is not running");
                return Ok(());
            }
            *running = false;
        }

        info!("Stopping Bronze runtime");

        let mut adapters = self.adapters.lock().await;
        for entry in adapters.iter_mut() {
            if let Err(e) = entry.adapter.on_shutdown(&mut entry.ctx).await {
                error!(adapter = %entry.name, error = %e, "Error during adapter shutdown");
            }
            entry.ctx.shutdown_connections();
        }

        info!("Runtime stopped");
        Ok(())
    }

    /// Runs the runtime until a shutdown signal is received.
    pub async fn run(&self) -> RuntimeResult<()> {
        self.start().await?;

        info!("Bronze runtime is now running. Press Ctrl+C to stop.");
        wait_for_shutdown().await;

        self.stop().await
    }

    /// Runs the runtime with a custom shutdown future.
    pub async fn run_until<F>(&self, shutdown: F) -> RuntimeResult<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await?;
        shutdown.await;
        self.stop().await
    }
}

impl Default for BronzeRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Waits for Ctrl+C, or SIGTERM on unix.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = signal::ctrl_c() => info!("Received Ctrl+C, shutting down"),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
                }
                return;
            }
            Err(e) => warn!(error = %e, "Failed to register SIGTERM handler"),
        }
    }

    match signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C, shutting down"),
        Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, shutting down"),
    }
}

// =============================================================================
// RuntimeBuilder
// =============================================================================

/// Builder for creating a [`BronzeRuntime`] with custom configuration.
pub struct RuntimeBuilder {
    config_loader: ConfigLoader,
}

impl RuntimeBuilder {
    /// Creates a new runtime builder.
    pub fn new() -> Self {
        Self {
            config_loader: ConfigLoader::new().with_current_dir(),
        }
    }

    /// Sets a specific configuration file to load.
    pub fn config_file<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.file(path);
        self
    }

    /// Sets the configuration profile (e.g., "development", "production").
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.config_loader = self.config_loader.profile(profile);
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<std::path::Path>>(mut self, path: P) -> Self {
        self.config_loader = self.config_loader.search_path(path);
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.config_loader = self.config_loader.without_env();
        self
    }

    /// Merges additional configuration programmatically.
    pub fn merge(mut self, config: BronzeConfig) -> Self {
        self.config_loader = self.config_loader.merge(config);
        self
    }

    /// Builds the runtime.
    pub fn build(self) -> ConfigResult<BronzeRuntime> {
        let config = self.config_loader.load()?;
        Ok(BronzeRuntime::from_config(&config))
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bronze_core::{Adapter, AdapterResult};
    use figment::value::Value;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    #[serde(default)]
    struct EchoConfig {
        bot_id: String,
    }

    struct EchoAdapter {
        bot_id: String,
    }

    #[async_trait]
    impl Adapter for EchoAdapter {
        fn name() -> &'static str {
            "echo"
        }

        async fn on_start(&self, ctx: &mut AdapterContext) -> AdapterResult<()> {
            ctx.host().online(&self.bot_id);
            Ok(())
        }

        async fn on_shutdown(&self, ctx: &mut AdapterContext) -> AdapterResult<()> {
            ctx.host().offline(&self.bot_id);
            Ok(())
        }
    }

    impl ConfigurableAdapter for EchoAdapter {
        type Config = EchoConfig;

        fn from_config(config: Self::Config) -> AdapterResult<Arc<Self>> {
            Ok(Arc::new(Self {
                bot_id: config.bot_id,
            }))
        }
    }

    fn runtime_with(adapters: &[(&str, serde_json::Value)]) -> BronzeRuntime {
        let mut config = BronzeConfig::default();
        for (name, value) in adapters {
            config
                .adapters
                .insert(name.to_string(), Value::serialize(value).unwrap());
        }
        BronzeRuntime::from_config(&config).with_transport_context(TransportContext::new())
    }

    #[tokio::test]
    async fn test_adapter_lifecycle() {
        let runtime = runtime_with(&[("echo", serde_json::json!({"bot_id": "b1"}))]);
        runtime.register_adapter::<EchoAdapter>().await.unwrap();
        let mut events = runtime.subscribe();

        runtime.run_until(async {}).await.unwrap();

        assert_eq!(
            events.recv().await.unwrap(),
            HostEvent::Online {
                bot_id: "b1".into()
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            HostEvent::Offline {
                bot_id: "b1".into()
            }
        );
        assert!(!runtime.is_running().await);
    }

    #[tokio::test]
    async fn test_missing_section_uses_default() {
        let runtime = runtime_with(&[]);
        runtime.register_adapter::<EchoAdapter>().await.unwrap();
        assert_eq!(runtime.adapter_count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_registration() {
        let runtime = runtime_with(&[]);
        runtime.register_adapter::<EchoAdapter>().await.unwrap();
        assert!(matches!(
            runtime.register_adapter::<EchoAdapter>().await,
            Err(RuntimeError::AdapterExists(name)) if name == "echo"
        ));
    }

    #[tokio::test]
    async fn test_bad_section() {
        let runtime = runtime_with(&[("echo", serde_json::json!({"bot_id": [1, 2]}))]);
        assert!(matches!(
            runtime.register_adapter::<EchoAdapter>().await,
            Err(RuntimeError::AdapterConfigDeserialize(_))
        ));
    }
}
