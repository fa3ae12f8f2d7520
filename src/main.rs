#[tokio::main]
async fn main() {
    if let Err(err) = rest_mcp::mcp::server::run_stdio().await {
        eprintln!("rest-mcp: {}", err);
        std::process::exit(1);
    }
}
