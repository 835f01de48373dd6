use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

use weir_core::{Batch, ChannelEventSink, Completion, Queue, QueueEvent, Worker};

#[derive(Debug, Deserialize)]
struct RollPayload {
    a: u64,
    b: u64,
}

/// Sums a pair of dice, tagging the result with the batch label when one was
/// supplied through the meta channel.
struct DiceWorker;

#[async_trait]
impl Worker for DiceWorker {
    async fn run(&self, params: Arc<Value>, done: Completion, meta: Option<Arc<Value>>) {
        let roll: RollPayload = match serde_json::from_value((*params).clone()) {
            Ok(roll) => roll,
            Err(e) => return done.fail(format!("json decode: {e}")),
        };

        let label = meta
            .as_deref()
            .and_then(|m| m["label"].as_str())
            .unwrap_or("ad-hoc")
            .to_string();
        done.complete(json!({ "sum": roll.a + roll.b, "label": label }));
    }
}

fn rolls(n: usize) -> Vec<Value> {
    let mut rng = rand::thread_rng();
    (0..n)
        .map(|_| json!({ "a": rng.gen_range(1..=6), "b": rng.gen_range(1..=6) }))
        .collect()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // (A) Queue with a dice worker and a channel sink for the event stream.
    let (sink, mut events) = ChannelEventSink::unbounded();
    let queue = Queue::builder()
        .concurrency(4)
        .flood(16)
        .drain(5)
        .worker(Arc::new(DiceWorker))
        .event_sink(Arc::new(sink))
        .build()?;

    let watcher = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                QueueEvent::Flooded => println!("[event] flooded"),
                QueueEvent::Drained => println!("[event] drained"),
                QueueEvent::Flushed(results) => println!("[event] flushed {} results", results.len()),
            }
        }
    });

    // (B) Batch mode: results aggregate and surface through Flushed.
    let below_flood = queue.push(Batch::new(rolls(24)).with_meta(json!({ "label": "batch" })));
    println!("pushed 24 rolls, below flood: {below_flood}");

    // (C) Group mode: one callback once every member lands.
    let (tx, group_done) = oneshot::channel();
    let group = queue.push_group(
        Batch::new(rolls(8)).with_meta(json!({ "label": "group" })),
        move |results| {
            let _ = tx.send(results);
        },
    );
    println!("group {} of {} submitted", group.id(), group.len());

    let results = group_done.await?;
    let total: u64 = results
        .iter()
        .filter_map(|r| r.result.as_ref())
        .filter_map(|v| v["sum"].as_u64())
        .sum();
    println!("group complete: {} members, total {total}", results.len());

    // (D) Buffer mode: one task, task-local callback.
    let (tx, buffered) = oneshot::channel();
    queue.buffer(json!({ "a": 3, "b": 4 }), move |outcome| {
        let _ = tx.send(outcome);
    });
    match buffered.await? {
        Ok(result) => println!("buffered roll: {result}"),
        Err(error) => println!("buffered roll failed: {error}"),
    }

    // (E) Wait for the queue to go idle, then probe it.
    loop {
        let counts = queue.counts();
        if counts.queued == 0 && counts.running == 0 {
            break;
        }
        sleep(Duration::from_millis(20)).await;
    }
    queue.flush();

    drop(queue);
    watcher.await?;
    Ok(())
}
