use std::time::Duration;

use seed_examples_http::{Client, RequestOption};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut opts = seed_examples_http::options_from_env().map_err(anyhow::Error::msg)?;
    opts.push(RequestOption::timeout(Duration::from_secs(10)));

    let client = Client::new(opts);

    if !client.health().ping(&[]).await? {
        anyhow::bail!("service at {} is not healthy", client.base_url());
    }

    let movie = client
        .service()
        .get_movie(
            "movie-c06a4ad7",
            &[RequestOption::header("x-request-source", "demo")],
        )
        .await?;

    println!("{movie:?}");

    Ok(())
}
