//! Shared helpers for tests that talk to a stand-in server over real HTTP.

#![allow(dead_code)]

use std::net::TcpListener;

use axum::Router;
use hsctl_core::{HubSpotClient, Properties};

pub const TOKEN: &str = "test-api-key";

/// Serve `app` on a random loopback port from a background thread and
/// return its base URL.
///
/// The listener is bound before this returns, so requests made right after
/// queue until the server starts accepting.
pub fn spawn(app: Router) -> String {
    let std_listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            axum::serve(listener, app).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

pub fn client_for(base_url: &str) -> HubSpotClient {
    HubSpotClient::new(TOKEN, Some(base_url))
}

pub fn properties(pairs: &[(&str, &str)]) -> Properties {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), (*v).into()))
        .collect()
}
