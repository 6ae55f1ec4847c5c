use std::io;
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use tracing::{info, warn};
use tungstenite::{Message, accept};

use crate::interface::{ChannelSelection, ConfigInterface};

const STATUS_PERIOD: Duration = Duration::from_millis(200);

/// Pushes the snapshot of every channel to each connected client.
pub fn status_thread(listener: TcpListener, interface: ConfigInterface) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                warn!(error = %e, "Status connection error");
                continue;
            }
        };

        let interface = interface.clone();
        let spawned = thread::Builder::new()
            .name("status-client".to_string())
            .spawn(move || serve_client(stream, &interface));
        if let Err(e) = spawned {
            warn!(error = %e, "Could not start status client thread");
        }
    }
}

pub fn bind(addr: &str) -> io::Result<TcpListener> {
    let listener = TcpListener::bind(addr)?;
    info!(addr, "Status WebSocket server listening");
    Ok(listener)
}

fn serve_client(stream: TcpStream, interface: &ConfigInterface) {
    let peer = stream.peer_addr().ok();
    let mut websocket = match accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            warn!(?peer, error = %e, "WebSocket handshake error");
            return;
        }
    };

    info!(?peer, "Status client connected");

    loop {
        let snapshots = match interface.snapshots(ChannelSelection::All) {
            Ok(snapshots) => snapshots,
            Err(e) => {
                warn!(error = %e, "Snapshot failed");
                break;
            }
        };

        match serde_json::to_string(&snapshots) {
            Ok(json) => {
                if websocket.send(Message::Text(json)).is_err() {
                    info!(?peer, "Status client disconnected");
                    break;
                }
            }
            Err(e) => warn!(error = %e, "JSON serialization error"),
        }

        thread::sleep(STATUS_PERIOD);
    }
}
