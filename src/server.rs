use crate::ipc::{self, AppState};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::{TcpListener, TcpStream};

/// Accepts connections one after another; session state carries over between them.
pub fn serve(listener: TcpListener, state: &mut AppState) -> anyhow::Result<()> {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "accept failed");
                continue;
            }
        };
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        tracing::info!(%peer, "client connected");
        match serve_connection(stream, state) {
            Ok(n) => tracing::info!(%peer, requests = n, "client disconnected"),
            Err(e) => tracing::warn!(%peer, error = %e, "connection closed with error"),
        }
    }
    Ok(())
}

/// One JSON request per line in, one JSON response per line out.
/// Returns the number of lines answered.
pub fn serve_connection(stream: TcpStream, state: &mut AppState) -> std::io::Result<usize> {
    let reader = BufReader::new(stream.try_clone()?);
    let mut writer = BufWriter::new(stream);
    let mut answered = 0;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(state, req),
            Err(e) => {
                tracing::warn!(error = %e, "unparseable request line");
                ipc::err("", "bad_json", e.to_string(), None)
            }
        };

        let text = serde_json::to_string(&resp)
            .unwrap_or_else(|_| "{\"ok\":false}".to_string());
        writeln!(writer, "{}", text)?;
        writer.flush()?;
        answered += 1;
    }
    Ok(answered)
}
