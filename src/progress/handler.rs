//! Progress handler trait and events

use crate::pipeline::DeploymentStatus;
use std::time::Duration;
use uuid::Uuid;

/// Events emitted while a deployment runs
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Background execution picked the deployment up
    Started {
        deployment_id: Uuid,
        project_name: String,
    },

    StageStarted {
        deployment_id: Uuid,
        stage: DeploymentStatus,
    },

    StageComplete {
        deployment_id: Uuid,
        stage: DeploymentStatus,
        duration: Duration,
    },

    /// Stage disabled by the request options
    StageSkipped {
        deployment_id: Uuid,
        stage: DeploymentStatus,
    },

    /// Deployment reached `success`
    Completed {
        deployment_id: Uuid,
        total_time: Duration,
    },

    /// Deployment reached `failed`
    Failed { deployment_id: Uuid, error: String },
}

impl ProgressEvent {
    pub fn deployment_id(&self) -> Uuid {
        match self {
            ProgressEvent::Started { deployment_id, .. }
            | ProgressEvent::StageStarted { deployment_id, .. }
            | ProgressEvent::StageComplete { deployment_id, .. }
            | ProgressEvent::StageSkipped { deployment_id, .. }
            | ProgressEvent::Completed { deployment_id, .. }
            | ProgressEvent::Failed { deployment_id, .. } => *deployment_id,
        }
    }
}

/// Trait for handling progress events during a deployment
pub trait ProgressHandler: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// No-op handler that ignores all events
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpHandler;

impl ProgressHandler for NoOpHandler {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHandler {
        count: Arc<AtomicUsize>,
    }

    impl ProgressHandler for CountingHandler {
        fn on_progress(&self, _event: &ProgressEvent) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_noop_handler() {
        NoOpHandler.on_progress(&ProgressEvent::Started {
            deployment_id: Uuid::new_v4(),
            project_name: "demo".to_string(),
        });
    }

    #[test]
    fn test_progress_events() {
        let count = Arc::new(AtomicUsize::new(0));
        let handler = CountingHandler {
            count: count.clone(),
        };
        let id = Uuid::new_v4();

        handler.on_progress(&ProgressEvent::StageStarted {
            deployment_id: id,
            stage: DeploymentStatus::Detecting,
        });
        handler.on_progress(&ProgressEvent::StageComplete {
            deployment_id: id,
            stage: DeploymentStatus::Detecting,
            duration: Duration::from_millis(50),
        });
        handler.on_progress(&ProgressEvent::Completed {
            deployment_id: id,
            total_time: Duration::from_secs(5),
        });

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_event_carries_deployment_id() {
        let id = Uuid::new_v4();
        let event = ProgressEvent::Failed {
            deployment_id: id,
            error: "boom".to_string(),
        };
        assert_eq!(event.deployment_id(), id);
        assert!(format!("{:?}", event).contains("Failed"));
    }
}
