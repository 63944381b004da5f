// Use case: worker_loop.

use crate::application::context::AppContext;
use crate::application::usecases::process_batch::ProcessBatchUseCase;
use std::sync::Arc;
use std::time::Duration;

/// Optional in-process poller; runs a batch every interval until shutdown.
pub struct WorkerLoopUseCase;

impl WorkerLoopUseCase {
    pub async fn run(
        ctx: Arc<AppContext>,
        poll_interval: Duration,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) {
        // Step 1: Loop until the shutdown signal is triggered.
        loop {
            if *shutdown.borrow() {
                break;
            }

            // Step 2: Process one batch.
            let summary =
                ProcessBatchUseCase::execute(Arc::clone(&ctx), ctx.worker.batch_size).await;
            if summary.claimed > 0 {
                tracing::debug!(claimed = summary.claimed, "poller batch done");
            }

            // Step 3: Sleep until the next poll or shutdown.
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped sender can never signal again; treat it as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(poll_interval) => {}
            }
        }

        // Step 4: Exit cleanly once shutdown is signaled.
        tracing::info!("worker loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::WorkerLoopUseCase;
    use crate::application::context::test_support::test_context;
    use std::time::Duration;

    #[tokio::test]
    async fn given_shutdown_signal_when_run_should_exit_cleanly() {
        let (ctx, _) = test_context();
        let (_tx, rx) = tokio::sync::watch::channel(true);

        tokio::time::timeout(
            Duration::from_secs(1),
            WorkerLoopUseCase::run(ctx, Duration::from_millis(100), rx),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn given_running_loop_when_shutdown_sent_should_stop() {
        let (ctx, _) = test_context();
        let (tx, rx) = tokio::sync::watch::channel(false);
        let handle = tokio::spawn(WorkerLoopUseCase::run(ctx, Duration::from_secs(60), rx));

        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn given_dropped_shutdown_sender_when_running_should_stop() {
        let (ctx, _) = test_context();
        let (tx, rx) = tokio::sync::watch::channel(false);
        let handle = tokio::spawn(WorkerLoopUseCase::run(ctx, Duration::from_secs(60), rx));

        drop(tx);

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
