//! Bounded channels between the corpus enumerator and the hasher.

use tokio::sync::mpsc;

use crate::config::PipelineConfig;

/// Create a bounded channel pair with the configured buffer size.
///
/// When the buffer is full, the sender waits, so a fast enumerator never
/// runs more than `buffer_size` paths ahead of the hasher.
pub fn bounded_channel<T>(config: &PipelineConfig) -> (mpsc::Sender<T>, mpsc::Receiver<T>) {
    mpsc::channel(config.buffer_size.max(1))
}

/// A pipeline stage that maps each input item to one output item.
///
/// Items are processed one at a time in arrival order, so the output order
/// equals the input order.
pub struct PipelineStage<I, O> {
    input: mpsc::Receiver<I>,
    output: mpsc::Sender<O>,
}

impl<I, O> PipelineStage<I, O> {
    /// Create a new pipeline stage.
    pub fn new(input: mpsc::Receiver<I>, output: mpsc::Sender<O>) -> Self {
        Self { input, output }
    }

    /// Run the stage until the input closes or the output is dropped.
    ///
    /// Returns the number of items forwarded.
    pub async fn run<F, Fut>(mut self, f: F) -> usize
    where
        F: Fn(I) -> Fut,
        Fut: std::future::Future<Output = O>,
    {
        let mut forwarded = 0;
        while let Some(item) = self.input.recv().await {
            let result = f(item).await;
            if self.output.send(result).await.is_err() {
                tracing::debug!("Downstream closed after {} item(s)", forwarded);
                break;
            }
            forwarded += 1;
        }
        forwarded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_channel() {
        let config = PipelineConfig {
            buffer_size: 10,
            retry_attempts: 3,
            retry_delay_ms: 1000,
        };

        let (tx, mut rx) = bounded_channel::<i32>(&config);

        tx.send(42).await.unwrap();
        let received = rx.recv().await;

        assert_eq!(received, Some(42));
    }

    #[tokio::test]
    async fn test_pipeline_stage_preserves_order() {
        let (input_tx, input_rx) = mpsc::channel::<i32>(2);
        let (output_tx, mut output_rx) = mpsc::channel::<i32>(2);

        let stage = PipelineStage::new(input_rx, output_tx);
        let handle = tokio::spawn(async move { stage.run(|x| async move { x * 2 }).await });

        tokio::spawn(async move {
            for i in 0..20 {
                input_tx.send(i).await.unwrap();
            }
        });

        let mut received = Vec::new();
        while let Some(v) = output_rx.recv().await {
            received.push(v);
        }

        assert_eq!(received, (0..20).map(|i| i * 2).collect::<Vec<_>>());
        assert_eq!(handle.await.unwrap(), 20);
    }
}
