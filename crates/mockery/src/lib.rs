// Library exports for the binary, integration tests and benchmarks.

pub mod compose;
pub mod config;
pub mod delay;
pub mod dispatch;
pub mod error;
pub mod handler;
pub mod predicate;
pub mod request;
pub mod server;
pub mod wiremock;

pub use compose::{Cases, Composer, Composition, Mockery};
pub use dispatch::DEFAULT_PRIORITY;
pub use error::{ConfigError, MappingError};
pub use handler::{Handler, ResponseWriter, SharedHandler};
pub use hyper::StatusCode;
pub use request::MockRequest;
pub use server::MockServer;
