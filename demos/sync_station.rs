use euskalmet::{Concurrency, Euskalmet, EuskalmetError};
use std::env;

#[tokio::main]
async fn main() -> Result<(), EuskalmetError> {
    configure_polars_display();
    let client = Euskalmet::new().await?;

    let report = client
        .sync()
        .station("C017")
        .concurrency(Concurrency::Parallel)
        .call()
        .await?;
    println!("{report}");

    if let Some(observations) = client.load_observations("C017").await? {
        println!("{:#?}", observations.tail(Some(6)));
    }

    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
