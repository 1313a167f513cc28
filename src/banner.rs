//! Banner grabbing for open TCP ports.
//!
//! After a successful connect, a minimal HTTP probe is sent and whatever the
//! service answers within the timeout becomes the banner. The grab is best
//! effort: every failure yields an empty banner.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Maximum bytes to read for a banner.
pub const MAX_BANNER_SIZE: usize = 1024;

/// Probe sent to elicit a response.
const HTTP_PROBE: &[u8] = b"HEAD / HTTP/1.0\r\n\r\n";

/// Grab a banner from an already connected stream.
///
/// Both the probe write and the read are bounded by `io_timeout`. Returns an
/// empty string if the service says nothing, resets, or times out.
pub async fn grab_banner(stream: &mut TcpStream, io_timeout: Duration) -> String {
    match timeout(io_timeout, stream.write_all(HTTP_PROBE)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::trace!("banner probe write failed: {}", e);
            return String::new();
        }
        Err(_) => return String::new(),
    }

    let mut buffer = vec![0u8; MAX_BANNER_SIZE];
    match timeout(io_timeout, stream.read(&mut buffer)).await {
        Ok(Ok(n)) if n > 0 => decode_banner(&buffer[..n]),
        Ok(Err(e)) => {
            tracing::trace!("banner read failed: {}", e);
            String::new()
        }
        _ => String::new(),
    }
}

/// Decode raw response bytes permissively and strip surrounding whitespace.
///
/// Invalid UTF-8 sequences become U+FFFD rather than failing.
pub fn decode_banner(data: &[u8]) -> String {
    String::from_utf8_lossy(data).trim().to_string()
}
