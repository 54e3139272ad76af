//! The flowdec converter process.
//!
//! Serves the line-JSON host protocol on stdin/stdout until stdin closes
//! (or the host interrupts us, which is a graceful shutdown -- partial
//! streams need no special handling). Logs go to stderr: stdout belongs
//! to the protocol.

use std::io;

use tracing_subscriber::EnvFilter;

use flowdec::{decode_stream, host, Config};

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = Config::default();
    let mut reader = io::stdin().lock();
    let mut writer = io::stdout().lock();

    loop {
        match host::read_stream(&mut reader) {
            Ok(None) => break,
            Ok(Some(stream)) => {
                tracing::debug!(
                    stream_id = stream.metadata.stream_id,
                    chunks = stream.chunks.len(),
                    "decoding stream"
                );
                let result = decode_stream(&stream, &config);
                host::write_result(&mut writer, &result)?;
            }
            Err(host::HostError::Io(e)) => return Err(e),
            Err(e) => {
                tracing::error!(error = %e, "host protocol error");
                host::write_error_result(&mut writer, &e)?;
            }
        }
    }
    Ok(())
}
