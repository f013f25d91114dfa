//! Serve command handler.

use clap::Args;
use docchat_core::{config::AppConfig, AppResult};
use docchat_server::AppState;

/// Start the web chat app
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to bind (default from config: 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (default from config: 8501)
    #[arg(long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        config.validate()?;

        let host = self.host.as_deref().unwrap_or(&config.server.host);
        let port = self.port.unwrap_or(config.server.port);

        let state = AppState::from_config(config).await?;
        tracing::info!(
            "Knowledge base holds {} chunks",
            state.knowledge.count().await?
        );

        docchat_server::run(state, host, port, config.max_upload_bytes()).await
    }
}
