use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use esl::Handle;

fn spawn_server(listener: TcpListener, script: impl FnOnce(TcpStream) + Send + 'static) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        script(stream);
    })
}

fn read_command(stream: &mut TcpStream) -> String {
    let mut buf = [0u8; 4096];
    let mut text = String::new();
    loop {
        let n = stream.read(&mut buf).unwrap();
        text.push_str(&String::from_utf8_lossy(&buf[..n]));
        if text.ends_with("\n\n") {
            return text;
        }
    }
}

#[test]
fn auth_success_marks_handle_connected() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = spawn_server(listener, |mut stream| {
        stream.write_all(b"Content-Type: auth/request\n\n").unwrap();
        let cmd = read_command(&mut stream);
        assert_eq!(cmd, "auth ClueCon\n\n");
        stream
            .write_all(b"Content-Type: command/reply\nReply-Text: +OK accepted\n\n")
            .unwrap();
    });

    let handle = Handle::connect_timeout(&addr.ip().to_string(), addr.port(), "", "ClueCon", 2000).unwrap();
    assert!(handle.is_connected());
    assert_eq!(handle.last_sr_reply(), "+OK accepted");

    server.join().unwrap();
}

#[test]
fn auth_failure_leaves_handle_disconnected() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = spawn_server(listener, |mut stream| {
        stream.write_all(b"Content-Type: auth/request\n\n").unwrap();
        let _ = read_command(&mut stream);
        stream
            .write_all(b"Content-Type: command/reply\nReply-Text: -ERR invalid\n\n")
            .unwrap();
    });

    let result = Handle::connect_timeout(&addr.ip().to_string(), addr.port(), "", "wrong", 2000);
    assert!(result.is_err());

    server.join().unwrap();
}

#[test]
fn buffered_event_surfaces_through_race_queue() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let server = spawn_server(listener, |mut stream| {
        stream.write_all(b"Content-Type: auth/request\n\n").unwrap();
        let _ = read_command(&mut stream);
        stream
            .write_all(b"Content-Type: command/reply\nReply-Text: +OK accepted\n\n")
            .unwrap();

        let _ = read_command(&mut stream);

        let inner = b"Event-Name: CHANNEL_ANSWER\nUnique-ID: abc-123\n\n";
        let envelope = format!(
            "Content-Type: text/event-plain\nContent-Length: {}\n\n",
            inner.len()
        );
        stream.write_all(envelope.as_bytes()).unwrap();
        stream.write_all(inner).unwrap();

        let body = b"FreeSWITCH is ready";
        let api_reply = format!("Content-Type: api/response\nContent-Length: {}\n\n", body.len());
        stream.write_all(api_reply.as_bytes()).unwrap();
        stream.write_all(body).unwrap();
    });

    let mut handle = Handle::connect_timeout(&addr.ip().to_string(), addr.port(), "", "ClueCon", 2000).unwrap();

    handle.send_recv_timed("api status\n\n", 2000).unwrap();
    assert_eq!(handle.last_sr_reply(), "FreeSWITCH is ready");

    let raced = handle.recv_event_timed(true, 2000).unwrap().expect("race event should be queued");
    assert_eq!(raced.event_id, esl::EventId::ChannelAnswer);

    server.join().unwrap();
}
