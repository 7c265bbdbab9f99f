use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::session::MemorySessionStore;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;

/// Serves `router` on an ephemeral local port and returns the base url,
/// `prefix` included.
pub(crate) async fn serve(router: Router, prefix: &str) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}/{prefix}")
}

pub(crate) fn client_for(base_url: &str, store: Arc<MemorySessionStore>) -> ApiClient {
    let config = ClientConfig::new(base_url)
        .unwrap()
        .with_timeout(Duration::from_secs(5));
    ApiClient::new(config, store).unwrap()
}
