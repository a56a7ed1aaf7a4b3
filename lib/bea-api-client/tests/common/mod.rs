use rstest::fixture;
use tracing::info;

use bea_api_client::test_backend::TestClient;

mod store_backend;
pub use self::store_backend::*;

pub fn init_tracing() {
    // should be run once, fail otherwise, we skip that error
    let _ = tracing_subscriber::fmt()
        .pretty()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    info!("Tracing initialized");
}

#[fixture]
pub async fn backend() -> TestClient<StoreBackend> {
    init_tracing();
    match TestClient::start(StoreBackend).await {
        Ok(client) => client,
        Err(error) => {
            panic!("fail to start store backend: {error:?}");
        }
    }
}
