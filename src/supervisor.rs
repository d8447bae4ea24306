//! Supervision loops: one background thread per service that keeps its
//! listener alive and dispatches arriving traffic to the bound handler.
//!
//! Stream services block in `accept` and spawn a dedicated thread per
//! accepted connection — concurrent, unordered, unbounded. Datagram
//! services invoke the handler inline with the socket, so one datagram is
//! fully handled (reply included) before the next is read. Neither loop
//! has a normal exit; both run until the process ends.

use std::net::{TcpListener, UdpSocket};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use crate::handler::{DatagramHandler, StreamHandler};
use crate::log::{LogLevel, Logger};
use crate::registry::ServiceState;

/// Launch the accept loop for a stream service. Returns once the loop
/// thread is running; the caller does not wait for any traffic.
pub(crate) fn spawn_stream_loop(
    name: String,
    listener: TcpListener,
    handler: Arc<StreamHandler>,
    state: Arc<ServiceState>,
    logger: Arc<dyn Logger>,
) {
    thread::Builder::new()
        .name(format!("svc-{name}"))
        .spawn(move || stream_loop(&name, listener, handler, state, logger))
        .expect("failed to spawn stream supervision thread");
}

fn stream_loop(
    name: &str,
    listener: TcpListener,
    handler: Arc<StreamHandler>,
    state: Arc<ServiceState>,
    logger: Arc<dyn Logger>,
) {
    loop {
        match listener.accept() {
            Ok((stream, peer_addr)) => {
                let conn_id = state.next_conn_id.fetch_add(1, Ordering::SeqCst);
                state.connections.insert(conn_id, peer_addr);
                logger.log(
                    LogLevel::Info,
                    &format!("{name}: new connection {peer_addr} (id {conn_id})"),
                );

                let conn_handler = handler.clone();
                let conn_state = state.clone();
                let conn_logger = logger.clone();
                let service = name.to_owned();
                let spawned = thread::Builder::new()
                    .name(format!("svc-{name}-conn-{conn_id}"))
                    .spawn(move || {
                        if let Err(e) = conn_handler.invoke(stream) {
                            conn_logger.log(
                                LogLevel::Error,
                                &format!("{service}: connection {conn_id} handler error: {e}"),
                            );
                        }
                        conn_state.connections.remove(&conn_id);
                    });
                if let Err(e) = spawned {
                    state.connections.remove(&conn_id);
                    logger.log(
                        LogLevel::Error,
                        &format!("{name}: failed to spawn connection thread: {e}"),
                    );
                }
            }
            Err(e) => {
                // Transient and fatal accept errors are not distinguished;
                // a single failure must not kill the service.
                logger.log(LogLevel::Error, &format!("{name}: accept error: {e}"));
            }
        }
    }
}

/// Launch the receive loop for a datagram service. The loop thread owns
/// the socket; the handler borrows it one invocation at a time.
pub(crate) fn spawn_datagram_loop(
    name: String,
    socket: UdpSocket,
    handler: DatagramHandler,
    logger: Arc<dyn Logger>,
) {
    thread::Builder::new()
        .name(format!("svc-{name}"))
        .spawn(move || datagram_loop(&name, socket, handler, logger))
        .expect("failed to spawn datagram supervision thread");
}

fn datagram_loop(name: &str, socket: UdpSocket, handler: DatagramHandler, logger: Arc<dyn Logger>) {
    loop {
        if let Err(e) = handler.invoke(&socket) {
            // Failures are local to the datagram they occurred on.
            logger.log(LogLevel::Error, &format!("{name}: handler error: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{self, BoundHandler, ServiceHandler, ServiceKind};
    use crate::log::NoOpLogger;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::time::Duration;

    fn bound_stream_echo() -> Arc<StreamHandler> {
        let bound = handler::bind(
            ServiceKind::Stream,
            ServiceHandler::conn(|mut conn| {
                let mut buf = [0u8; 512];
                loop {
                    let n = conn.read(&mut buf)?;
                    if n == 0 {
                        return Ok(());
                    }
                    conn.write_all(&buf[..n])?;
                }
            }),
        )
        .unwrap();
        match bound {
            BoundHandler::Stream(h) => h,
            BoundHandler::Datagram(_) => unreachable!(),
        }
    }

    #[test]
    fn stream_loop_tracks_live_connections() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let state = ServiceState::new(ServiceKind::Stream, addr);

        spawn_stream_loop(
            "track".to_owned(),
            listener,
            bound_stream_echo(),
            state.clone(),
            Arc::new(NoOpLogger),
        );

        assert_eq!(state.connection_count(), 0);

        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(b"x").unwrap();
        let mut buf = [0u8; 1];
        stream.read_exact(&mut buf).unwrap();
        // The echo came back, so the connection is accepted and tracked.
        assert_eq!(state.connection_count(), 1);

        drop(stream);
        for _ in 0..100 {
            if state.connection_count() == 0 {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("connection was not untracked after close");
    }

    #[test]
    fn handler_error_closes_only_that_connection() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let state = ServiceState::new(ServiceKind::Stream, addr);

        let bound = handler::bind(
            ServiceKind::Stream,
            ServiceHandler::tcp(|mut stream: TcpStream| {
                let mut buf = [0u8; 8];
                let n = stream.read(&mut buf)?;
                if &buf[..n] == b"fail" {
                    return Err(std::io::Error::other("handler failure"));
                }
                stream.write_all(&buf[..n])?;
                Ok(())
            }),
        )
        .unwrap();
        let bound = match bound {
            BoundHandler::Stream(h) => h,
            BoundHandler::Datagram(_) => unreachable!(),
        };

        spawn_stream_loop(
            "faulty".to_owned(),
            listener,
            bound,
            state,
            Arc::new(NoOpLogger),
        );

        // First connection makes its handler fail.
        let mut bad = TcpStream::connect(addr).unwrap();
        bad.write_all(b"fail").unwrap();

        // The service keeps serving new connections afterwards.
        let mut good = TcpStream::connect(addr).unwrap();
        good.write_all(b"ok").unwrap();
        let mut buf = [0u8; 2];
        good.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ok");
    }
}
