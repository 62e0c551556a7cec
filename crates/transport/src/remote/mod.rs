use common::DashboardError;
use url::Url;

pub mod engine_io;
pub mod socket_io;

pub use engine_io::{EnginePacket, Handshake};
pub use socket_io::{SocketPacket, sanitize_non_finite};

/// Websocket endpoint of a Socket.IO server given its http(s) base URL.
pub fn socket_url(server_url: &str) -> Result<Url, DashboardError> {
    let mut url = Url::parse(server_url)
        .map_err(|e| DashboardError::Config(format!("invalid server url '{}': {}", server_url, e)))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(DashboardError::Config(format!(
                "unsupported server url scheme '{}'",
                other
            )));
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| DashboardError::Config(format!("cannot use scheme '{}'", scheme)))?;

    url.set_path("/socket.io/");
    url.query_pairs_mut()
        .clear()
        .append_pair("EIO", "4")
        .append_pair("transport", "websocket");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_maps_to_ws_endpoint() {
        let url = socket_url("http://127.0.0.1:5000").unwrap();
        assert_eq!(
            url.as_str(),
            "ws://127.0.0.1:5000/socket.io/?EIO=4&transport=websocket"
        );
    }

    #[test]
    fn test_https_maps_to_wss() {
        let url = socket_url("https://dash.example.com/").unwrap();
        assert_eq!(url.scheme(), "wss");
        assert_eq!(url.path(), "/socket.io/");
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(matches!(
            socket_url("ftp://host"),
            Err(DashboardError::Config(_))
        ));
        assert!(socket_url("not a url").is_err());
    }
}
