pub mod assertions;
pub mod server;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::{MessageAssertion, MessageContent};
#[allow(unused_imports)]
pub use mocks::ScriptedSocket;
#[allow(unused_imports)]
pub use server::{TestClient, TestServer};
#[allow(unused_imports)]
pub use setup::{stroke, TestSetup, TestSetupBuilder};
