//! Payment gateway driven from a terminal.

use async_trait::async_trait;
use backend::GatewayResponse;
use checkout::{GatewayError, GatewayOptions, GatewayOutcome, PaymentGateway};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;

/// Prints the order for the operator, who pays out of band and pastes the
/// gateway's JSON response back. An empty line closes the widget.
pub struct ConsoleGateway<R, W> {
    io: Mutex<(R, W)>,
}

impl ConsoleGateway<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> ConsoleGateway<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            io: Mutex::new((reader, writer)),
        }
    }

    pub fn into_inner(self) -> (R, W) {
        self.io.into_inner()
    }
}

#[async_trait]
impl<R, W> PaymentGateway for ConsoleGateway<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn open(&self, options: &GatewayOptions) -> Result<GatewayOutcome, GatewayError> {
        let mut io = self.io.lock().await;
        let (reader, writer) = &mut *io;

        let order = serde_json::to_string_pretty(options)?;
        writer.write_all(order.as_bytes()).await?;
        writer
            .write_all(b"\nPaste the gateway response JSON (empty line to cancel):\n")
            .await?;
        writer.flush().await?;

        let mut line = String::new();
        reader.read_line(&mut line).await?;
        let line = line.trim();
        if line.is_empty() {
            tracing::info!(order_id = %options.order_id, "console gateway dismissed");
            return Ok(GatewayOutcome::Dismissed);
        }
        let value: serde_json::Value = serde_json::from_str(line)?;
        Ok(GatewayOutcome::Completed(GatewayResponse::new(value)))
    }
}
