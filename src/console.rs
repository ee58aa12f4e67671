//! Line-oriented input for join workers and answer collectors
//!
//! Input arrives as whole lines on a channel. A [`LineSource`] wraps the
//! receiving end in a lock so that only one worker reads it at a time.
//! [`Inputs`] decides which seat reads from which source: every seat can
//! share the console, or each seat can have its own source.

use std::{io::BufRead, sync::Arc};

use tokio::sync::{
    Mutex, MutexGuard,
    mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
};

/// An exclusive, shareable source of input lines
///
/// Cloning yields another handle to the same source; the lock ensures one
/// reader at a time across all handles.
#[derive(Debug, Clone)]
pub struct LineSource {
    lines: Arc<Mutex<UnboundedReceiver<String>>>,
}

impl LineSource {
    /// Wraps a channel receiver
    pub fn new(lines: UnboundedReceiver<String>) -> Self {
        Self {
            lines: Arc::new(Mutex::new(lines)),
        }
    }

    /// Creates a source together with the sender feeding it
    pub fn channel() -> (UnboundedSender<String>, Self) {
        let (tx, rx) = unbounded_channel();
        (tx, Self::new(rx))
    }

    /// Creates a source fed by the lines of standard input
    ///
    /// A background thread reads standard input and forwards each line until
    /// the input ends or the source is dropped.
    pub fn stdin() -> Self {
        let (tx, source) = Self::channel();
        std::thread::spawn(move || {
            forward_lines(std::io::stdin().lock(), &tx);
            log::debug!("standard input closed");
        });
        source
    }

    /// Waits for exclusive access to the source
    ///
    /// Waiters are served in the order they asked.
    pub async fn lock(&self) -> MutexGuard<'_, UnboundedReceiver<String>> {
        self.lines.lock().await
    }

    /// Reads one line, waiting for exclusive access first
    ///
    /// # Returns
    ///
    /// The next line, or `None` once the source is closed and drained
    pub async fn read_line(&self) -> Option<String> {
        self.lock().await.recv().await
    }
}

/// Forwards every line of a reader until it ends or nobody listens
///
/// Lines that are not valid UTF-8 are forwarded with the invalid bytes
/// replaced, so the reader of the line can reject it and ask again.
fn forward_lines<R: BufRead>(mut reader: R, tx: &UnboundedSender<String>) {
    let mut raw = Vec::new();
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw) {
            Ok(0) => break,
            Ok(_) => {
                if tx.send(decode_line(&raw)).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => {
                log::warn!("failed to read input: {e}");
                break;
            }
        }
    }
}

/// Decodes one raw line, dropping its `\n` or `\r\n` terminator
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// How seats are mapped to input sources
#[derive(Debug, Clone)]
pub enum Inputs {
    /// Every seat reads from the same source, one at a time
    Shared(LineSource),
    /// Seat `n` reads from the `n - 1`th source
    PerSeat(Vec<LineSource>),
}

impl Inputs {
    /// Every seat shares standard input
    pub fn console() -> Self {
        Self::Shared(LineSource::stdin())
    }

    /// Returns the source a seat reads from
    ///
    /// # Arguments
    ///
    /// * `seat` - The 1-based seat number
    pub fn for_seat(&self, seat: usize) -> Option<LineSource> {
        match self {
            Self::Shared(source) => Some(source.clone()),
            Self::PerSeat(sources) => seat
                .checked_sub(1)
                .and_then(|i| sources.get(i))
                .cloned(),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_line_in_order() {
        let (tx, source) = LineSource::channel();
        tx.send("first".to_string()).unwrap();
        tx.send("second".to_string()).unwrap();

        assert_eq!(source.read_line().await, Some("first".to_string()));
        assert_eq!(source.clone().read_line().await, Some("second".to_string()));
    }

    #[tokio::test]
    async fn test_read_line_closed() {
        let (tx, source) = LineSource::channel();
        tx.send("last".to_string()).unwrap();
        drop(tx);

        assert_eq!(source.read_line().await, Some("last".to_string()));
        assert_eq!(source.read_line().await, None);
    }

    #[test]
    fn test_decode_line() {
        assert_eq!(decode_line(b"yes\n"), "yes");
        assert_eq!(decode_line(b"yes\r\n"), "yes");
        assert_eq!(decode_line(b"last"), "last");
        assert_eq!(decode_line(b"\xe9\n"), "\u{FFFD}");
    }

    #[tokio::test]
    async fn test_forward_lines_survives_invalid_utf8() {
        let (tx, source) = LineSource::channel();
        let input: &[u8] = b"Ann\n\xe9\na\r\nb";

        forward_lines(std::io::Cursor::new(input), &tx);
        drop(tx);

        assert_eq!(source.read_line().await, Some("Ann".to_string()));
        assert_eq!(source.read_line().await, Some("\u{FFFD}".to_string()));
        assert_eq!(source.read_line().await, Some("a".to_string()));
        assert_eq!(source.read_line().await, Some("b".to_string()));
        assert_eq!(source.read_line().await, None);
    }

    #[tokio::test]
    async fn test_shared_routing() {
        let (tx, source) = LineSource::channel();
        let inputs = Inputs::Shared(source);
        tx.send("hello".to_string()).unwrap();

        let seat_3 = inputs.for_seat(3).unwrap();
        assert_eq!(seat_3.read_line().await, Some("hello".to_string()));
        assert!(inputs.for_seat(1).is_some());
    }

    #[tokio::test]
    async fn test_per_seat_routing() {
        let (tx1, source1) = LineSource::channel();
        let (tx2, source2) = LineSource::channel();
        let inputs = Inputs::PerSeat(vec![source1, source2]);
        tx1.send("one".to_string()).unwrap();
        tx2.send("two".to_string()).unwrap();

        assert_eq!(
            inputs.for_seat(2).unwrap().read_line().await,
            Some("two".to_string())
        );
        assert_eq!(
            inputs.for_seat(1).unwrap().read_line().await,
            Some("one".to_string())
        );
        assert!(inputs.for_seat(0).is_none());
        assert!(inputs.for_seat(3).is_none());
    }
}
