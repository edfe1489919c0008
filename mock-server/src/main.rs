use mock_server::MockState;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let state = match std::env::var("MOCK_TOKEN") {
        Ok(token) => MockState::with_token(&token),
        Err(_) => MockState::shared(),
    };
    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!("mock CRM listening on http://{addr}");
    mock_server::run_with_state(listener, state).await
}
