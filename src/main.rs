#[tokio::main]
async fn main() {
    if let Err(e) = medremind_lib::run().await {
        eprintln!("medremind: {e}");
        std::process::exit(1);
    }
}
