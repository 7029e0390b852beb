//! `GET /api/server-ip`: the address registers should use to reach this server.

use std::io;
use std::net::IpAddr;

use axum::extract::State;
use axum::Json;
use scanpay_core::ServerIp;
use tokio::net::UdpSocket;
use tracing::{debug, error};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Any routable address works; connecting a UDP socket sends nothing.
const PROBE_ADDR: &str = "8.8.8.8:80";

pub async fn server_ip(State(state): State<AppState>) -> ApiResult<Json<ServerIp>> {
    let ip = match state.advertise_ip {
        Some(ip) => ip,
        None => detect_local_ip().await.map_err(|e| {
            error!(error = %e, "Could not detect server IP");
            ApiError::internal(e.to_string())
        })?,
    };

    debug!(%ip, "Server IP requested");
    Ok(Json(ServerIp { ip: ip.to_string() }))
}

/// Address of the interface used for outbound traffic.
pub async fn detect_local_ip() -> io::Result<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect(PROBE_ADDR).await?;
    let ip = socket.local_addr()?.ip();
    if ip.is_unspecified() {
        return Err(io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            "no outbound interface",
        ));
    }
    Ok(ip)
}

#[cfg(test)]
mod tests {
    use crate::test_support::spawn_app_with;
    use serde_json::Value;

    #[tokio::test]
    async fn test_advertised_ip_is_returned() {
        let app = spawn_app_with(Some("192.168.1.20".parse().unwrap())).await;

        let body: Value = app
            .client
            .get(app.url("/api/server-ip"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, serde_json::json!({"ip": "192.168.1.20"}));
    }

    #[tokio::test]
    async fn test_detected_ip_is_never_unspecified() {
        // Hosts without a route fail detection; that is a 500, not 0.0.0.0
        if let Ok(ip) = super::detect_local_ip().await {
            assert!(!ip.is_unspecified());
        }
    }
}
