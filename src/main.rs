#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = quizbox::run().await {
        eprintln!("quizbox fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
