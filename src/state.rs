use crate::config::Settings;
use crate::plugin::JmPlugin;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub plugin: Arc<JmPlugin>,
    pub tx: broadcast::Sender<String>,
}
