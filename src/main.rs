#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let query = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    aura_lib::run(&query).await
}
