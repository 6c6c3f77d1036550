//! Minimal backend for trying the balancer locally.
//!
//! ```text
//! test-backend --port 8080 &
//! test-backend --port 8081 &
//! balancer-proxy --backends http://localhost:8080,http://localhost:8081
//! ```

use std::net::SocketAddr;

use axum::Router;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "test-backend", about = "Toy HTTP backend that reports its port")]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let args = Args::parse();
    let port = args.port;

    let greeting = format!("Hello From Backend Server on port {port}");
    let app = Router::new().fallback(move || async move { greeting });

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Backend server listening on http://{addr}");

    axum::serve(listener, app).await
}
