pub mod builders;
pub mod recording;

use std::io::{self, Write};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use jobguard::output::SharedWriter;
use tracing_subscriber::{EnvFilter, fmt};

pub use builders::JobConfigBuilder;
pub use recording::{HandlerCall, RecordingBackend};

static INIT: Once = Once::new();

/// Install a subscriber writing through the test harness, once per binary.
///
/// Level comes from `RUST_LOG`, else `jobguard=debug`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("jobguard=debug"));
        let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

/// Await `fut`, failing the test if it is still pending after `limit`.
pub async fn with_timeout<F: Future>(limit: Duration, fut: F) -> F::Output {
    match tokio::time::timeout(limit, fut).await {
        Ok(out) => out,
        Err(_) => panic!("did not finish within {limit:?}"),
    }
}

/// In-memory console double.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A `SharedWriter` that appends to this buffer.
    pub fn writer(&self) -> SharedWriter {
        SharedWriter::new(self.clone())
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
