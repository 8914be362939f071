//! Byte-at-a-time line reassembly for the supervised pipeline's piped
//! stdout/stderr.
//!
//! Reading one byte at a time is a deliberate suspension point: it forces
//! a yield on every byte rather than buffering whole lines blind to
//! backpressure.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::Sender;

/// Read `reader` until EOF, sending each completed line (newline stripped,
/// lossily decoded) to `tx`. Returns when the stream ends or the channel's
/// receiver is dropped.
pub async fn forward_lines<R: AsyncRead + Unpin>(mut reader: R, tx: Sender<String>) {
    let mut buf = Vec::new();
    let mut byte = [0u8; 1];
    loop {
        match reader.read(&mut byte).await {
            Ok(0) => {
                if !buf.is_empty() {
                    let _ = tx.send(String::from_utf8_lossy(&buf).to_string()).await;
                }
                return;
            }
            Ok(_) => {
                if byte[0] == b'\n' {
                    let line = String::from_utf8_lossy(&buf).to_string();
                    buf.clear();
                    if tx.send(line).await.is_err() {
                        return;
                    }
                } else {
                    buf.push(byte[0]);
                }
            }
            Err(_) => return,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::channel;

    #[tokio::test]
    async fn splits_on_newlines() {
        let input = "first\nsecond\nthird".as_bytes();
        let (tx, mut rx) = channel(8);
        forward_lines(input, tx).await;

        let mut lines = Vec::new();
        while let Some(line) = rx.recv().await {
            lines.push(line);
        }
        assert_eq!(lines, vec!["first", "second", "third"]);
    }
}
