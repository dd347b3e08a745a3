use std::{net::SocketAddr, sync::Arc};

use hook_inspector::config::Config;
use hook_inspector::router::router;
use hook_inspector::server::serve;
use hook_inspector::state::AppState;
use tokio::{net::TcpListener, sync::Notify};

pub struct ServerHandle {
    pub addr: SocketAddr,
    pub shutdown: Arc<Notify>,
}

impl ServerHandle {
    pub async fn for_config(config: Config) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let notify = Arc::new(Notify::new());
        let shutdown = notify.clone();

        let state = AppState::from_config(&config).await.unwrap();
        let app = router(state, &config, None);

        tokio::spawn(async move {
            serve(app, listener, async move { notify.notified().await })
                .await
                .unwrap()
        });

        Self { addr, shutdown }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown.notify_one()
    }
}
