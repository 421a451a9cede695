#[tokio::main]
async fn main() {
    photovote::start_server().await;
}
