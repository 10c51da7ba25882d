use std::{pin::Pin, sync::Arc};

use serde::Serialize;
use tokio::{
    io::{AsyncWrite, AsyncWriteExt},
    sync::Mutex,
};

/// Shared newline-delimited JSON sink. Each value is written and flushed as
/// one whole line.
#[derive(Clone)]
pub struct LineWriter {
    inner: Arc<Mutex<Pin<Box<dyn AsyncWrite + Send>>>>,
}

impl LineWriter {
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Box::pin(writer))),
        }
    }

    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }

    pub async fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> anyhow::Result<()> {
        let mut line = serde_json::to_vec(value)?;
        line.push(b'\n');

        let mut writer = self.inner.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, BufReader};

    use super::*;

    #[tokio::test]
    async fn test_values_are_written_one_per_line() {
        let (writer, reader) = tokio::io::duplex(1024);
        let output = LineWriter::new(writer);

        output.write_json(&json!({"ok": true})).await.unwrap();
        output.write_json(&json!([1, 2])).await.unwrap();
        drop(output);

        let mut lines = BufReader::new(reader).lines();
        assert_eq!(lines.next_line().await.unwrap().unwrap(), r#"{"ok":true}"#);
        assert_eq!(lines.next_line().await.unwrap().unwrap(), "[1,2]");
        assert_eq!(lines.next_line().await.unwrap(), None);
    }
}
