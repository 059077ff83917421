use eyre::{Result, WrapErr};
use std::sync::Arc;

use crate::{
    config::AppConfig,
    request::{RequestLifecycleManager, Transport},
    reqwest_transport::ReqwestTransport,
    scheduler::{DriveSummary, TaskScheduler},
};

/// Process-lifetime context bundling the scheduler and the lifecycle manager
pub struct AppContext {
    pub config: AppConfig,
    pub scheduler: Arc<TaskScheduler>,
    pub manager: RequestLifecycleManager,
}

impl AppContext {
    /// One driver tick: report progress, then run a drive cycle
    pub fn tick(&self) -> DriveSummary {
        self.manager.tick();
        self.scheduler.drive()
    }

    /// Nothing left to drive
    pub fn is_idle(&self) -> bool {
        self.manager.is_idle() && self.scheduler.running_count() == 0
    }

    /// Tick on the configured interval until every request has finished.
    /// Ctrl-C aborts whatever is still outstanding.
    pub async fn run_until_idle(&self) -> Result<()> {
        let mut interval = tokio::time::interval(self.config.tick_interval());
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.tick();
                    if self.is_idle() {
                        break;
                    }
                }
                result = &mut shutdown => {
                    result.wrap_err("Failed to listen for ctrl-c")?;
                    let aborted = self.manager.abort_all();
                    tracing::info!(
                        aborted = aborted,
                        "SIGINT received; outstanding requests aborted"
                    );
                    // Let stopped routines unwind.
                    self.tick();
                    break;
                }
            }
        }

        let stats = self.manager.get_stats();
        tracing::info!(
            sent = stats.total_sent,
            succeeded = stats.succeeded,
            http_errors = stats.http_errors,
            network_errors = stats.network_errors,
            aborted = stats.aborted,
            "Driver idle"
        );
        Ok(())
    }
}

/// Builder pattern for fluent AppContext configuration
#[derive(Default)]
pub struct AppBuilder {
    config: Option<AppConfig>,
    transport: Option<Arc<dyn Transport>>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application configuration
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Replace the default reqwest transport
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Build the AppContext with validation
    pub fn build(self) -> Result<AppContext> {
        let config = self
            .config
            .ok_or_else(|| eyre::eyre!("AppConfig is required"))?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                ReqwestTransport::current().wrap_err("Default transport needs a tokio runtime")?,
            ),
        };

        let scheduler = Arc::new(TaskScheduler::with_config(config.scheduler.clone()));
        let manager = RequestLifecycleManager::with_config(
            scheduler.clone(),
            transport,
            config.request.clone(),
        );
        for (key, value) in &config.super_headers {
            manager
                .set_super_header(key.clone(), value.clone())
                .wrap_err_with(|| format!("Invalid super header '{key}'"))?;
        }

        Ok(AppContext {
            config,
            scheduler,
            manager,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Completion, Operation, OperationPoll, TransportError, TransportRequest};

    /// Completes every request immediately with 200
    struct InstantTransport;

    struct InstantOperation(Option<Completion>);

    impl Transport for InstantTransport {
        fn start(&self, request: &TransportRequest) -> Result<Box<dyn Operation>, TransportError> {
            Ok(Box::new(InstantOperation(Some(Completion {
                url: request.uri.clone(),
                status_code: Some(200),
                ..Default::default()
            }))))
        }
    }

    impl Operation for InstantOperation {
        fn poll(&mut self) -> OperationPoll {
            OperationPoll {
                upload_progress: 1.0,
                download_progress: 1.0,
                done: true,
            }
        }

        fn take_completion(&mut self) -> Option<Completion> {
            self.0.take()
        }

        fn cancel(&mut self) {}
    }

    #[test]
    fn test_app_builder_missing_config() {
        let builder = AppBuilder::new();
        let result = builder.build();
        assert!(result.is_err());
        let error_msg = result.err().unwrap().to_string();
        assert!(error_msg.contains("AppConfig is required"));
    }

    #[test]
    fn test_app_builder_applies_super_headers() {
        let mut config = AppConfig::default();
        config
            .super_headers
            .insert("User-Agent".to_string(), "frame-request".to_string());

        let context = AppBuilder::new()
            .with_config(config)
            .with_transport(Arc::new(InstantTransport))
            .build()
            .unwrap();
        assert_eq!(
            context.manager.super_headers().get("User-Agent").as_deref(),
            Some("frame-request")
        );
    }

    #[test]
    fn test_app_builder_rejects_empty_header_value() {
        let mut config = AppConfig::default();
        config.super_headers.insert("X-Empty".to_string(), String::new());

        let result = AppBuilder::new()
            .with_config(config)
            .with_transport(Arc::new(InstantTransport))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_tick_completes_requests() {
        let context = AppBuilder::new()
            .with_config(AppConfig::default())
            .with_transport(Arc::new(InstantTransport))
            .build()
            .unwrap();

        let sent = context.manager.get("http://example.test").send().unwrap();
        assert!(!context.is_idle());

        assert_eq!(context.tick().started, 1);
        let summary = context.tick();
        assert_eq!(summary.completed, 1);
        assert!(sent.is_finished());
        assert!(context.is_idle());
    }

    #[tokio::test]
    async fn test_run_until_idle() {
        let config = AppConfig {
            tick_interval_ms: 1,
            ..Default::default()
        };
        let context = AppBuilder::new()
            .with_config(config)
            .with_transport(Arc::new(InstantTransport))
            .build()
            .unwrap();

        let sent: Vec<_> = (0..3)
            .map(|i| {
                context
                    .manager
                    .get(format!("http://example.test/{i}"))
                    .send()
                    .unwrap()
            })
            .collect();

        tokio::time::timeout(std::time::Duration::from_secs(5), context.run_until_idle())
            .await
            .unwrap()
            .unwrap();

        assert!(sent.iter().all(|s| s.is_finished()));
        assert_eq!(context.manager.get_stats().succeeded, 3);
    }
}
