//! HTTP/1.1 client requests as [`tether`] futures.
//!
//! [`request`] returns a lazy [`Future`](tether::Future): nothing is sent
//! until it is started, and aborting it closes the connection and drops the
//! result. The exchange itself runs on a worker thread and is handed back to
//! the thread's [`Runtime`](tether::Runtime) as a completion.
//!
//! Only plain `http://` URLs are supported, one request per connection.
//!
//! # Module Structure
//!
//! - [`types`]: [`Method`], [`Request`], [`Response`] and [`Status`]
//! - [`error`](mod@error): transport [`Error`]s

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

mod codec;
pub mod error;
mod transport;
pub mod types;
mod url;

pub use error::Error;
pub use transport::request;
pub use types::{Headers, Method, Request, Response, Status, StatusClass};
