use std::{net::SocketAddr, sync::Arc};

use derive_more::Deref;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{config::AppConfig, pipeline::SiteProbe, ProviderClient, Result};

// ###################################
// ->  Structs
// ###################################
pub struct App {
    pub app_state: AppState,
    pub listener: TcpListener,
}
impl App {
    pub fn new(app_state: AppState, listener: TcpListener) -> Self {
        App {
            app_state,
            listener,
        }
    }

    pub async fn build_from_config(config: AppConfig) -> Result<Self> {
        let provider_client = ProviderClient::from_config(&config.provider_config)?;
        if !provider_client.has_api_key() {
            warn!("MAILERLITE_API_KEY is not set, signups and stats will fail");
        }
        let site_probe = SiteProbe::from_config(&config.pipeline_config)?;

        let app_state = AppState::new(provider_client, site_probe);

        let addr = SocketAddr::from((config.net_config.host, config.net_config.app_port));
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;
        info!("{:<20} - {}", "Listening on:", addr);

        let app = App::new(app_state, listener);
        Ok(app)
    }
}

pub struct InternalState {
    pub provider_client: ProviderClient,
    pub site_probe: SiteProbe,
}

/// Application state containing all global data.
/// It implements `Deref` to easily access the fields on `InternalState`
/// Uses an `Arc` so it can be cloned around.
#[derive(Clone, Deref)]
pub struct AppState(Arc<InternalState>);

impl AppState {
    pub fn new(provider_client: ProviderClient, site_probe: SiteProbe) -> Self {
        AppState(Arc::new(InternalState {
            provider_client,
            site_probe,
        }))
    }
}
