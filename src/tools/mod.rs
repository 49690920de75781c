//! Tool discovery and invocation

pub mod dispatch;
pub mod federation;
pub mod snapshot;

pub use dispatch::{Dispatcher, ToolTransport};
pub use federation::FederationClient;
pub use snapshot::{RemoteTool, ToolSnapshot};
