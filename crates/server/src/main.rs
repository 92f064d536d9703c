#[tokio::main]
async fn main() -> anyhow::Result<()> {
    menuvision_server::start().await
}
