//! Running an exchange on a worker thread.
//!
//! The blocking exchange runs on its own thread and hands its result back to
//! the runtime thread through a [`Completer`](tether::runtime::Completer).
//! Aborting shuts the socket down so the worker unblocks, and cancels the
//! completion so nothing is delivered.

use crate::codec;
use crate::error::Error;
use crate::types::{Request, Response};
use crate::url::Target;
use parking_lot::Mutex;
use std::cell::RefCell;
use std::io::{self, BufWriter, Write};
use std::net::{Shutdown, TcpStream};
use std::rc::Rc;
use std::sync::Arc;
use std::thread;
use tether::future::{self, Future};
use tether::runtime::{self, CompletionToken};
use tether::tracing_compat::{debug, trace};

/// The socket of an exchange in progress, shared with whoever may abort it.
#[derive(Debug, Default)]
pub(crate) struct Connection {
    state: Mutex<Socket>,
}

#[derive(Debug, Default)]
enum Socket {
    #[default]
    Connecting,
    Open(TcpStream),
    Closed,
}

impl Connection {
    /// Registers the connected socket. Fails if the exchange was aborted
    /// while connecting.
    fn attach(&self, stream: &TcpStream) -> io::Result<()> {
        let mut state = self.state.lock();
        match *state {
            Socket::Closed => Err(aborted()),
            _ => {
                *state = Socket::Open(stream.try_clone()?);
                Ok(())
            }
        }
    }

    /// Unblocks the worker. Safe to call from any thread, at any point.
    pub(crate) fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), Socket::Closed);
        if let Socket::Open(stream) = previous {
            let _ = stream.shutdown(Shutdown::Both);
        }
    }
}

fn aborted() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "request aborted")
}

/// Performs one blocking request/response exchange.
pub(crate) fn exchange(request: &Request, connection: &Connection) -> Result<Response, Error> {
    let target = Target::parse(&request.url)?;
    trace!(host = %target.host, port = target.port, "connecting");
    let stream = TcpStream::connect((target.host.as_str(), target.port))?;
    connection.attach(&stream)?;

    let mut writer = BufWriter::new(&stream);
    writer.write_all(&codec::encode_request(request, &target))?;
    writer.flush()?;
    drop(writer);

    let mut reader = &stream;
    codec::read_response(&mut reader, request.method)
}

struct Inflight {
    token: CompletionToken,
    connection: Arc<Connection>,
}

/// Sends `request` when the returned future is started.
///
/// Any response, whatever its status, resolves the future with `Ok`; only
/// an invalid URL or a transport failure resolves it with `Err`.
///
/// # Examples
///
/// ```no_run
/// use tether::runtime::Runtime;
/// use tether_http::{Request, request};
///
/// let response = Runtime::new()
///     .block_on(request(Request::get("http://localhost:8182/xhr/ascii")))
///     .expect("runtime")
///     .expect("exchange");
/// println!("{} {:?}", response.status, response.body);
/// ```
pub fn request(request: Request) -> Future<Response, Error> {
    let (task, response) = future::channel();
    let inflight: Rc<RefCell<Option<Inflight>>> = Rc::default();

    let (producer, slot) = (task.clone(), Rc::clone(&inflight));
    task.start(move || {
        debug!(method = %request.method, url = %request.url, "sending request");
        let answer = producer.clone();
        let (token, completer) = runtime::completion(move |result: Result<Response, Error>| {
            answer.end(result);
        });
        let connection = Arc::new(Connection::default());
        let worker = Arc::clone(&connection);
        let spawned = thread::Builder::new()
            .name("tether-http".into())
            .spawn(move || {
                let result = exchange(&request, &worker);
                completer.complete(result);
            });
        match spawned {
            Ok(_) => {
                *slot.borrow_mut() = Some(Inflight { token, connection });
            }
            Err(err) => {
                token.cancel();
                producer.fail(Error::Io(err));
            }
        }
    })
    .abort(move || {
        let current = inflight.borrow_mut().take();
        if let Some(Inflight { token, connection }) = current {
            debug!("request aborted");
            token.cancel();
            connection.shutdown();
        }
    });
    response
}
