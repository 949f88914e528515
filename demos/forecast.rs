use chrono::{Local, TimeDelta};
use euskalmet::{Euskalmet, EuskalmetError};

#[tokio::main]
async fn main() -> Result<(), EuskalmetError> {
    let client = Euskalmet::new().await?;
    let tomorrow = Local::now().date_naive() + TimeDelta::days(1);

    let regions = client.geo().regions().await?;
    println!("{regions:#}");

    let forecast = client
        .weather()
        .location_forecast()
        .region("basque_country")
        .zone("donostialdea")
        .location("donostia")
        .forecast_date(tomorrow)
        .call()
        .await?;
    println!("{forecast:#}");

    let report = client
        .weather()
        .last_report()
        .region("basque_country")
        .zone("donostialdea")
        .location("donostia")
        .call()
        .await?;
    println!("{report:#}");

    Ok(())
}
