#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    sr_tui::run_app()
        .await
        .map_err(|e| color_eyre::eyre::eyre!(e))
}
