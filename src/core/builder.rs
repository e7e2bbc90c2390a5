use std::sync::Arc;

use super::{
    signals::{OsSignals, TriggerSource},
    supervisor::Supervisor,
};
use crate::{
    config::SupervisorConfig,
    identity::Identity,
    services::ServiceRef,
    subscribers::{LogWriter, Subscribe},
};

/// Builder for constructing a [`Supervisor`].
///
/// Every option is optional:
///
/// | Option | Default |
/// |---|---|
/// | [`with_identifier`](Self::with_identifier) | empty identity (id `""`) |
/// | [`with_config`](Self::with_config) | [`SupervisorConfig::default`] (10s shutdown timeout) |
/// | [`with_services`](Self::with_services) | no services |
/// | [`with_logger`](Self::with_logger) | [`LogWriter`] |
/// | [`with_trigger_source`](Self::with_trigger_source) | [`OsSignals`] |
pub struct SupervisorBuilder {
    identity: Identity,
    cfg: SupervisorConfig,
    services: Vec<ServiceRef>,
    logger: Arc<dyn Subscribe>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    source: Arc<dyn TriggerSource>,
}

impl Default for SupervisorBuilder {
    fn default() -> Self {
        Self {
            identity: Identity::default(),
            cfg: SupervisorConfig::default(),
            services: Vec::new(),
            logger: Arc::new(LogWriter::new()),
            subscribers: Vec::new(),
            source: Arc::new(OsSignals),
        }
    }
}

impl SupervisorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the application name and version; the composite id becomes `"{name}/{version}"`.
    pub fn with_identifier(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.identity = Identity::new(name, version);
        self
    }

    pub fn with_config(mut self, cfg: SupervisorConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets the fixed, ordered service set (replacing any previously added services).
    ///
    /// Launch and shutdown both follow this order.
    pub fn with_services(mut self, services: impl IntoIterator<Item = ServiceRef>) -> Self {
        self.services = services.into_iter().collect();
        self
    }

    /// Appends one service to the set.
    pub fn with_service(mut self, service: ServiceRef) -> Self {
        self.services.push(service);
        self
    }

    /// Replaces the structured-logging subscriber (default: [`LogWriter`]).
    pub fn with_logger(mut self, logger: Arc<dyn Subscribe>) -> Self {
        self.logger = logger;
        self
    }

    /// Sets additional event subscribers, delivered alongside the logger.
    ///
    /// Subscribers receive runtime events through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the source of external termination requests (default: [`OsSignals`]).
    pub fn with_trigger_source(mut self, source: Arc<dyn TriggerSource>) -> Self {
        self.source = source;
        self
    }

    /// Builds the supervisor. Nothing is started until [`Supervisor::run`].
    pub fn build(self) -> Arc<Supervisor> {
        let mut subscribers = Vec::with_capacity(self.subscribers.len() + 1);
        subscribers.push(self.logger);
        subscribers.extend(self.subscribers);

        Arc::new(Supervisor::new_internal(
            self.identity,
            self.cfg,
            self.services,
            subscribers,
            self.source,
        ))
    }
}
