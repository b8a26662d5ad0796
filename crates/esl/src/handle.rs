use std::io::{Cursor, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::os::fd::AsRawFd;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use esl_event::{create_json, parse_wire, serialize_wire, Event, EventId, Stack};
use esl_net::{Framer, NetError};
use esl_utils::ArrayStr;

use crate::error::{EslError, Result};
use crate::logger::{log, Level};

/// Event-subscription grammar accepted by the server's `event` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    Plain,
    Xml,
    Json,
}

impl EventType {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Xml => "xml",
            Self::Json => "json",
        }
    }
}

/// An authenticated session: one OS socket, one inbound framer, the
/// handle's five event slots, and the two reply-text scratches.
/// `listen`/`listen_threaded` hand one of these to each accepted
/// connection's dedicated thread -- within that thread it is used
/// exactly like any other handle.
pub struct Handle {
    stream: TcpStream,
    framer: Framer,
    peer_addr: SocketAddr,

    last_reply: ArrayStr<1024>,
    last_sr_reply: ArrayStr<1024>,

    last_event: Option<Event>,
    last_sr_event: Option<Event>,
    last_ievent: Option<Event>,
    info_event: Option<Event>,

    race_tx: Sender<Event>,
    race_rx: Receiver<Event>,

    connected: bool,
    async_execute: bool,
    event_lock: bool,

    err: String,
    errnum: i32,
}

enum Classified {
    CommandReply(Event),
    ApiResponse(Event),
    DisconnectNotice(Event),
    AuthRequest(Event),
    LogData(Event),
    InnerEvent(Event),
    Other(Event),
}

impl Handle {
    /// Opens a TCP connection to `host:port`, disables Nagle, enables
    /// `SO_KEEPALIVE`, waits for the server's `auth/request` challenge,
    /// and authenticates. `ms == 0` means a blocking connect and
    /// unbounded waits thereafter.
    pub fn connect_timeout(host: &str, port: u16, user: &str, password: &str, ms: u32) -> Result<Self> {
        let addr = (host, port)
            .to_socket_addrs()
            .map_err(EslError::Io)?
            .next()
            .ok_or_else(|| EslError::Argument(format!("could not resolve {host}:{port}")))?;

        let stream = if ms == 0 {
            TcpStream::connect(addr).map_err(EslError::Io)?
        } else {
            TcpStream::connect_timeout(&addr, Duration::from_millis(u64::from(ms))).map_err(EslError::Io)?
        };

        let mut handle = Self::from_stream(stream, addr)?;

        let auth_request = handle.wait_for_auth_request(ms)?;
        handle.info_event = Some(auth_request);

        let cmd = if user.is_empty() {
            format!("auth {password}\n\n")
        } else {
            format!("userauth {user}:{password}\n\n")
        };
        handle.raw_send(&cmd)?;

        let reply = handle.next_classified(ms)?.ok_or_else(|| {
            EslError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "auth reply timed out"))
        })?;

        match reply {
            Classified::CommandReply(event) => {
                let reply_text = event.get_header("Reply-Text").unwrap_or_default();
                handle.set_last_sr_reply(&reply_text);
                handle.last_sr_event = Some(event);
                if reply_text.starts_with("+OK") {
                    handle.connected = true;
                    Ok(handle)
                } else {
                    handle.connected = false;
                    Err(EslError::State(format!("authentication rejected: {reply_text}")))
                }
            }
            _ => {
                handle.connected = false;
                Err(EslError::Protocol("expected command/reply after auth".into()))
            }
        }
    }

    /// Outbound-socket variant: skips the password handshake. The
    /// server is expected to push an initial event describing the call
    /// leg, captured into `info_event`.
    pub fn attach_handle(stream: TcpStream, peer_addr: SocketAddr) -> Result<Self> {
        let mut handle = Self::from_stream(stream, peer_addr)?;
        if let Some(event) = handle.next_event_timed(0)? {
            handle.info_event = Some(event);
        }
        handle.connected = true;
        Ok(handle)
    }

    fn from_stream(stream: TcpStream, peer_addr: SocketAddr) -> Result<Self> {
        stream.set_nodelay(true).map_err(EslError::Io)?;
        set_keepalive(&stream);

        let (race_tx, race_rx) = bounded(1);
        Ok(Self {
            stream,
            framer: Framer::new(),
            peer_addr,
            last_reply: ArrayStr::new(),
            last_sr_reply: ArrayStr::new(),
            last_event: None,
            last_sr_event: None,
            last_ievent: None,
            info_event: None,
            race_tx,
            race_rx,
            connected: false,
            async_execute: false,
            event_lock: false,
            err: String::new(),
            errnum: 0,
        })
    }

    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    pub const fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn last_reply(&self) -> &str {
        &self.last_reply
    }

    pub fn last_sr_reply(&self) -> &str {
        &self.last_sr_reply
    }

    pub fn last_sr_event(&self) -> Option<&Event> {
        self.last_sr_event.as_ref()
    }

    pub fn info_event(&self) -> Option<&Event> {
        self.info_event.as_ref()
    }

    pub fn set_event_lock(&mut self, on: bool) {
        self.event_lock = on;
    }

    pub fn set_async_execute(&mut self, on: bool) {
        self.async_execute = on;
    }

    /// Marks the handle unusable and releases the socket. Idempotent.
    pub fn disconnect(&mut self) {
        if self.connected {
            let _ = self.stream.shutdown(std::net::Shutdown::Both);
        }
        self.connected = false;
    }

    fn guard_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(EslError::State("handle is not connected".into()))
        }
    }

    fn raw_send(&mut self, text: &str) -> Result<()> {
        self.stream.write_all(text.as_bytes()).map_err(EslError::Io)?;
        Ok(())
    }

    /// Writes `cmd`, appending the `\n\n` frame terminator if the
    /// caller didn't already include it.
    pub fn send(&mut self, cmd: &str) -> Result<()> {
        self.guard_connected()?;
        let framed = if cmd.ends_with("\n\n") { cmd.to_string() } else { format!("{cmd}\n\n") };
        self.raw_send(&framed)
    }

    /// Sends `cmd`, then drains inbound packets until a `command/reply`
    /// or `api/response` arrives (stashing it into `last_sr_reply` /
    /// `last_sr_event`), a disconnect notice arrives (marking the
    /// handle disconnected), or `ms` elapses.
    pub fn send_recv_timed(&mut self, cmd: &str, ms: u32) -> Result<()> {
        self.send(cmd)?;
        let deadline = Deadline::new(ms);
        loop {
            let remaining = deadline.remaining_ms()?;
            let Some(classified) = self.next_classified(remaining)? else {
                return Err(EslError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "send_recv timed out",
                )));
            };
            match classified {
                Classified::CommandReply(event) | Classified::ApiResponse(event) => {
                    self.set_last_sr_reply(&reply_text_of(&event));
                    self.last_sr_event = Some(event);
                    return Ok(());
                }
                Classified::DisconnectNotice(event) => {
                    self.last_ievent = Some(event);
                    self.connected = false;
                    return Err(EslError::State("peer sent a disconnect notice".into()));
                }
                Classified::InnerEvent(event) => self.push_race_event(event)?,
                Classified::LogData(event) => self.last_ievent = Some(event),
                Classified::AuthRequest(event) => self.info_event = Some(event),
                Classified::Other(_) => {}
            }
        }
    }

    pub fn send_recv(&mut self, cmd: &str) -> Result<()> {
        self.send_recv_timed(cmd, 0)
    }

    fn push_race_event(&mut self, event: Event) -> Result<()> {
        match self.race_tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                Err(EslError::State("race_event slot is full; caller must drain before dispatching another command".into()))
            }
            Err(TrySendError::Disconnected(_)) => unreachable!("handle owns both ends"),
        }
    }

    /// Drains one inbound event: the held `race_event`, if `check_q`
    /// and one is queued, otherwise the next packet off the socket.
    /// Returns `Ok(None)` on timeout.
    pub fn recv_event_timed(&mut self, check_q: bool, ms: u32) -> Result<Option<Event>> {
        self.guard_connected()?;
        if check_q {
            if let Ok(event) = self.race_rx.try_recv() {
                return Ok(Some(event));
            }
        }
        let event = self.next_event_timed(ms)?;
        if let Some(event) = &event {
            self.last_event = Some(event.clone());
        }
        Ok(event)
    }

    pub fn recv_event(&mut self, check_q: bool) -> Result<Option<Event>> {
        self.recv_event_timed(check_q, 0)
    }

    /// `sendevent <Event-Name>\n<serialized headers>\n`
    pub fn sendevent(&mut self, event: &Event) -> Result<()> {
        let cmd = format!("sendevent {}\n{}\n", event.event_id, serialize_wire(event, false));
        self.send_recv(&cmd)
    }

    /// `sendmsg <uuid>\n<serialized headers>\n`
    pub fn sendmsg(&mut self, event: &Event, uuid: &str) -> Result<()> {
        let cmd = format!("sendmsg {uuid}\n{}\n", serialize_wire(event, false));
        self.send_recv(&cmd)
    }

    /// Builds and dispatches a `sendmsg` event requesting `app arg` be
    /// executed on `uuid`, honouring the handle's `async_execute` /
    /// `event_lock` flags.
    pub fn execute(&mut self, app: &str, arg: &str, uuid: &str) -> Result<()> {
        let mut event = Event::new(EventId::Command);
        event.add_header_at("call-command", "execute", Stack::Bottom)?;
        event.add_header_at("execute-app-name", app, Stack::Bottom)?;
        if !arg.is_empty() {
            event.add_header_at("execute-app-arg", arg, Stack::Bottom)?;
        }
        if self.async_execute {
            event.add_header_at("async", "true", Stack::Bottom)?;
        }
        if self.event_lock {
            event.add_header_at("event-lock", "true", Stack::Bottom)?;
        }
        self.sendmsg(&event, uuid)
    }

    /// `filter <header> <value>\n\n`
    pub fn filter(&mut self, header: &str, value: &str) -> Result<()> {
        self.send_recv(&format!("filter {header} {value}\n\n"))
    }

    /// `event <plain|xml|json> <value>\n\n`
    pub fn events(&mut self, etype: EventType, value: &str) -> Result<()> {
        if etype == EventType::Json && value.is_empty() {
            return Err(EslError::Argument("events(Json, ...) requires a non-empty value".into()));
        }
        self.send_recv(&format!("event {} {value}\n\n", etype.as_str()))
    }

    fn wait_for_auth_request(&mut self, ms: u32) -> Result<Event> {
        let deadline = Deadline::new(ms);
        loop {
            let remaining = deadline.remaining_ms()?;
            let Some(classified) = self.next_classified(remaining)? else {
                return Err(EslError::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    "auth challenge timed out",
                )));
            };
            if let Classified::AuthRequest(event) = classified {
                return Ok(event);
            }
        }
    }

    fn next_event_timed(&mut self, ms: u32) -> Result<Option<Event>> {
        let Some(packet) = self.read_packet_timed(ms)? else { return Ok(None) };
        let event = parse_wire(&packet.header_text, packet.body)?;
        Ok(Some(event))
    }

    fn next_classified(&mut self, ms: u32) -> Result<Option<Classified>> {
        let Some(event) = self.next_event_timed(ms)? else { return Ok(None) };
        let classified = self.classify(event)?;
        if let Classified::CommandReply(event) | Classified::ApiResponse(event) = &classified {
            self.set_last_reply(&reply_text_of(event));
        }
        Ok(Some(classified))
    }

    /// Records `text` into the 1024-byte `last_reply` scratch, truncating
    /// on a char boundary as the original's fixed-size buffer would.
    fn set_last_reply(&mut self, text: &str) {
        self.last_reply.set_truncate(text);
    }

    /// Records `text` into the 1024-byte `last_sr_reply` scratch.
    fn set_last_sr_reply(&mut self, text: &str) {
        self.last_sr_reply.set_truncate(text);
    }

    fn classify(&self, envelope: Event) -> Result<Classified> {
        let content_type = envelope.get_header("Content-Type").unwrap_or_default();
        match content_type.as_str() {
            "command/reply" => Ok(Classified::CommandReply(envelope)),
            "api/response" => Ok(Classified::ApiResponse(envelope)),
            "text/disconnect-notice" => Ok(Classified::DisconnectNotice(envelope)),
            "auth/request" => Ok(Classified::AuthRequest(envelope)),
            "log/data" => Ok(Classified::LogData(envelope)),
            "text/event-plain" => {
                let body = envelope.get_body().unwrap_or_default();
                let mut framer = Framer::new();
                let mut cursor = Cursor::new(body.to_vec());
                let packet = framer.read_packet(&mut cursor)?;
                Ok(Classified::InnerEvent(parse_wire(&packet.header_text, packet.body)?))
            }
            "text/event-json" => {
                let body = envelope.get_body().unwrap_or_default();
                let text = String::from_utf8_lossy(body);
                Ok(Classified::InnerEvent(create_json(&text)?))
            }
            "text/event-xml" => {
                Err(EslError::Protocol("text/event-xml decoding is not supported".into()))
            }
            _ => Ok(Classified::Other(envelope)),
        }
    }

    fn read_packet_timed(&mut self, ms: u32) -> Result<Option<esl_net::Packet>> {
        let timeout = if ms == 0 { None } else { Some(Duration::from_millis(u64::from(ms))) };
        self.stream.set_read_timeout(timeout).map_err(EslError::Io)?;
        match self.framer.read_packet(&mut self.stream) {
            Ok(packet) => Ok(Some(packet)),
            Err(NetError::Io(e))
                if matches!(e.kind(), std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut) =>
            {
                Ok(None)
            }
            Err(NetError::Disconnected) => {
                self.connected = false;
                log(Level::Notice, "peer closed the connection");
                Err(EslError::State("peer closed the connection".into()))
            }
            Err(err) => {
                self.errnum = -1;
                self.err = err.to_string();
                Err(err.into())
            }
        }
    }
}

fn reply_text_of(event: &Event) -> String {
    event
        .get_header("Reply-Text")
        .or_else(|| event.get_body().map(|b| String::from_utf8_lossy(b).into_owned()))
        .unwrap_or_default()
}

/// A `0`-means-unbounded millisecond budget, re-checked on each
/// partial I/O step of a multi-packet wait.
struct Deadline(Option<Instant>);

impl Deadline {
    fn new(ms: u32) -> Self {
        Self((ms != 0).then(|| Instant::now() + Duration::from_millis(u64::from(ms))))
    }

    fn remaining_ms(&self) -> Result<u32> {
        match self.0 {
            None => Ok(0),
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    Err(EslError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "deadline elapsed")))
                } else {
                    Ok((deadline - now).as_millis().min(u64::from(u32::MAX) as u128) as u32)
                }
            }
        }
    }
}

fn set_keepalive(stream: &TcpStream) {
    let fd = stream.as_raw_fd();
    let enable: libc::c_int = 1;
    unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_KEEPALIVE,
            std::ptr::from_ref(&enable).cast(),
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        );
    }
}
