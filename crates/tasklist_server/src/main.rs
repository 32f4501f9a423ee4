#[tokio::main]
async fn main() {
    if let Err(err) = tasklist_server::start_server().await {
        eprintln!("tasklist_server failed: {err}");
        std::process::exit(1);
    }
}
