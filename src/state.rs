use std::sync::Arc;

use crate::config::Config;
use crate::contest::Contest;
use crate::store::RedisStore;

pub struct AppState {
    pub config: Config,
    pub contest: Contest,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let store = RedisStore::connect(&config.redis_url)
            .await
            .expect("Redis must be reachable at startup");
        let contest = Contest::new(Arc::new(store));

        Arc::new(Self { config, contest })
    }
}
