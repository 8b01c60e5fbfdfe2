mod handles;
mod logging;
pub mod proxy_bytes;
pub mod threading;

pub use handles::{PassComponentKey, PrimitiveHandle};
pub use proxy_bytes::{MAX_INLINE_PROXY_BYTE_SIZE, ProxyBytes};

pub use tracing;
