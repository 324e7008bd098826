#[tokio::main]
async fn main() {
    assistant_gateway::run().await;
}
