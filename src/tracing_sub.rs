use std::io::{self, Write};

use tracing::Level;

pub struct DelegatingWriter {
    inner: DelegatingInner,
}

enum DelegatingInner {
    #[cfg(target_arch = "wasm32")]
    Console(Vec<u8>),
    #[cfg(not(target_arch = "wasm32"))]
    Stderr(io::Stderr),
}

impl DelegatingWriter {
    fn new() -> Self {
        #[cfg(target_arch = "wasm32")]
        {
            DelegatingWriter {
                inner: DelegatingInner::Console(Vec::new()),
            }
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            DelegatingWriter {
                inner: DelegatingInner::Stderr(io::stderr()),
            }
        }
    }
}

impl Write for DelegatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.inner {
            #[cfg(target_arch = "wasm32")]
            DelegatingInner::Console(pending) => {
                pending.extend_from_slice(buf);
                Ok(buf.len())
            }
            #[cfg(not(target_arch = "wasm32"))]
            DelegatingInner::Stderr(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.inner {
            #[cfg(target_arch = "wasm32")]
            DelegatingInner::Console(pending) => {
                let text = String::from_utf8_lossy(pending);
                let line = text.trim_end();
                if !line.is_empty() {
                    web_sys::console::log_1(&line.into());
                }
                pending.clear();
                Ok(())
            }
            #[cfg(not(target_arch = "wasm32"))]
            DelegatingInner::Stderr(s) => s.flush(),
        }
    }
}

impl Drop for DelegatingWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SubscriberMakeWriter;

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for SubscriberMakeWriter {
    type Writer = DelegatingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DelegatingWriter::new()
    }
}

/// Initialize the tracing subscriber: browser console on wasm32, stderr
/// elsewhere. Safe to call multiple times; subsequent calls are no-ops for
/// the global subscriber.
#[cfg(target_arch = "wasm32")]
pub fn init_default() {
    // wasm32 has no wall clock for the fmt layer and the console adds its
    // own timestamps anyway
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_writer(SubscriberMakeWriter)
        .with_target(false)
        .with_ansi(false)
        .without_time()
        .try_init();
}

#[cfg(not(target_arch = "wasm32"))]
pub fn init_default() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_writer(SubscriberMakeWriter)
        .with_target(false)
        .with_thread_names(false)
        .try_init();
}
