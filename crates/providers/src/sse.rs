//! Server-sent event pump.
//!
//! Reads a response byte stream, splits it into lines at the byte level,
//! runs each line through a [`StreamDecoder`] and forwards the resulting
//! events over a bounded channel.

use futures::{Stream, StreamExt};
use pocketclaw_core::error::ProviderError;
use pocketclaw_core::provider::StreamEvent;
use tokio::sync::mpsc;
use tracing::debug;

use crate::StreamDecoder;

type EventSender = mpsc::Sender<Result<StreamEvent, ProviderError>>;

/// Drive `stream` to completion (or until the receiver goes away).
///
/// Splitting on raw bytes keeps multi-byte characters intact when a network
/// chunk boundary falls inside one. A transport error is forwarded as
/// `StreamInterrupted` and ends the stream without a `Done` event.
pub async fn pump<S, B, E>(stream: S, mut decoder: Box<dyn StreamDecoder>, tx: EventSender)
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let mut stream = std::pin::pin!(stream);
    let mut buffer = LineBuffer::default();

    'read: loop {
        let chunk = tokio::select! {
            biased;
            _ = tx.closed() => {
                debug!("Stream consumer went away, dropping connection");
                return;
            }
            chunk = stream.next() => chunk,
        };

        let bytes = match chunk {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => {
                let _ = tx
                    .send(Err(ProviderError::StreamInterrupted(e.to_string())))
                    .await;
                return;
            }
            None => break,
        };

        buffer.extend(bytes.as_ref());

        while let Some(line) = buffer.next_line() {
            if !dispatch(line, decoder.as_mut(), &tx).await {
                return;
            }
            if decoder.is_finished() {
                break 'read;
            }
        }
    }

    // A final record without a trailing newline.
    let rest = buffer.remainder();
    if !decoder.is_finished() && !rest.is_empty() && !dispatch(rest, decoder.as_mut(), &tx).await {
        return;
    }

    for event in decoder.finish() {
        if tx.send(Ok(event)).await.is_err() {
            return;
        }
    }
}

/// Byte buffer that hands out complete lines. Bytes already searched for a
/// newline are never searched again.
#[derive(Debug, Default)]
struct LineBuffer {
    bytes: Vec<u8>,
    /// Start of the first line not yet handed out
    start: usize,
    /// Everything before this offset is known to hold no newline
    scanned: usize,
}

impl LineBuffer {
    fn extend(&mut self, chunk: &[u8]) {
        if self.start > 0 {
            self.bytes.drain(..self.start);
            self.scanned -= self.start;
            self.start = 0;
        }
        self.bytes.extend_from_slice(chunk);
    }

    /// The next complete line, including its `\n`.
    fn next_line(&mut self) -> Option<&[u8]> {
        match self.bytes[self.scanned..].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                let begin = self.start;
                let end = self.scanned + offset + 1;
                self.start = end;
                self.scanned = end;
                Some(&self.bytes[begin..end])
            }
            None => {
                self.scanned = self.bytes.len();
                None
            }
        }
    }

    /// Bytes after the last complete line.
    fn remainder(&self) -> &[u8] {
        &self.bytes[self.start..]
    }
}

/// Decode one raw line and forward its events. Returns false when pumping
/// must stop (decoder error or closed receiver).
async fn dispatch(line: &[u8], decoder: &mut dyn StreamDecoder, tx: &EventSender) -> bool {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\n', '\r']);
    if line.is_empty() {
        return true;
    }

    match decoder.decode_line(line) {
        Ok(events) => {
            for event in events {
                if tx.send(Ok(event)).await.is_err() {
                    debug!("Stream consumer went away, dropping connection");
                    return false;
                }
            }
            true
        }
        Err(e) => {
            let _ = tx.send(Err(e)).await;
            false
        }
    }
}
