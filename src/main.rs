#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = gradegate::run().await {
        eprintln!("gradegate fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
