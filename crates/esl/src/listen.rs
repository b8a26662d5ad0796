use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;

use crate::error::Result;
use crate::handle::Handle;
use crate::logger::{log, Level};

/// Invoked once per accepted connection, with the attached handle and
/// the caller-supplied context.
pub type ListenCallback<C> = fn(Handle, &C);

/// Binds `host:port` and services one connection at a time, calling
/// `callback` for each accepted peer before accepting the next. The
/// original's signature takes a server-socket/client-socket pair
/// directly; this port attaches the handle before handing it to the
/// callback, since that attachment is the whole reason a consumer
/// wants the raw sockets in the first place.
pub fn listen<C>(host: &str, port: u16, callback: ListenCallback<C>, context: &C) -> Result<()> {
    let listener = TcpListener::bind((host, port))?;
    loop {
        let (stream, peer) = listener.accept()?;
        match Handle::attach_handle(stream, peer) {
            Ok(handle) => callback(handle, context),
            Err(err) => log(Level::Warning, &format!("failed to attach inbound handle: {err}")),
        }
    }
}

/// Like [`listen`], but spawns a detached OS thread per accepted
/// connection instead of servicing them sequentially. `context` must
/// be `Send + Sync` since it is shared across every connection thread.
pub fn listen_threaded<C>(host: &str, port: u16, callback: ListenCallback<C>, context: Arc<C>) -> Result<()>
where
    C: Send + Sync + 'static,
{
    let listener = TcpListener::bind((host, port))?;
    loop {
        let (stream, peer) = listener.accept()?;
        let context = context.clone();
        esl_utils::thread::spawn_detached("esl-listen", move || {
            service_one(stream, peer, callback, &context);
        });
    }
}

fn service_one<C>(stream: TcpStream, peer: SocketAddr, callback: ListenCallback<C>, context: &C) {
    match Handle::attach_handle(stream, peer) {
        Ok(handle) => callback(handle, context),
        Err(err) => log(Level::Warning, &format!("failed to attach inbound handle: {err}")),
    }
}
