//! MongoDB client construction.

use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::Client;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub max_pool_size: u32,
    /// Applied to both connect and server selection.
    pub connect_timeout: Duration,
    pub app_name: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_pool_size: 10,
            connect_timeout: Duration::from_secs(10),
            app_name: Some("docstore".to_string()),
        }
    }
}

/// Parse `uri` and build a client. No server round trip happens here; the
/// driver connects lazily.
pub async fn create_client(uri: &str, config: &ClientConfig) -> Result<Client, mongodb::error::Error> {
    let mut options = ClientOptions::parse(uri).await?;
    options.max_pool_size = Some(config.max_pool_size);
    options.connect_timeout = Some(config.connect_timeout);
    options.server_selection_timeout = Some(config.connect_timeout);
    if options.app_name.is_none() {
        options.app_name.clone_from(&config.app_name);
    }
    Client::with_options(options)
}

/// Round trip to the server to prove it is reachable.
pub async fn ping(client: &Client, database: &str) -> Result<(), mongodb::error::Error> {
    client
        .database(database)
        .run_command(doc! {"ping": 1}, None)
        .await?;
    Ok(())
}
