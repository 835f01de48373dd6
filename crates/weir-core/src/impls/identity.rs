//! Identity worker: the default work mapper.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::ports::Worker;
use crate::queue::Completion;

/// Succeeds immediately with a copy of the task params.
///
/// This is the queue's default worker; override it per queue, per batch, or
/// per buffered task.
pub struct IdentityWorker;

#[async_trait]
impl Worker for IdentityWorker {
    async fn run(&self, params: Arc<Value>, done: Completion, _meta: Option<Arc<Value>>) {
        done.complete((*params).clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::Queue;
    use serde_json::json;

    #[tokio::test]
    async fn passes_params_through() {
        let queue = Queue::new();
        let (tx, rx) = tokio::sync::oneshot::channel();
        queue.buffer(json!({"echo": 42}), move |outcome| {
            let _ = tx.send(outcome);
        });

        let outcome = rx.await.unwrap();
        assert_eq!(outcome.unwrap(), json!({"echo": 42}));
    }
}
