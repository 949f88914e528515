pub mod geo_client;
pub mod stations_client;
pub mod weather_client;
