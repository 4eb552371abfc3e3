#[tokio::main]
async fn main() {
    rebook_backend::run().await;
}
