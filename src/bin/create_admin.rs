#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if let Err(e) = academy_rust::create_admin(args).await {
        eprintln!("create-admin fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
