use crimedata::{CrimeData, CrimeDataError, DetailLevel, OutputFormat};
use std::env;

#[tokio::main]
async fn main() -> Result<(), CrimeDataError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    configure_polars_display();
    let client = CrimeData::new()?;

    let response = client
        .get_crime_data()
        .years(2019)
        .cities(["Chicago", "Detroit"])
        .data_type(DetailLevel::Core)
        .output(OutputFormat::Geo)
        .call()
        .await?;

    println!("{}", response.data.frame());
    if let Some(geo) = response.data.as_geo() {
        println!(
            "{} of {} offenses have a location ({})",
            geo.located(),
            geo.geometry.len(),
            geo.crs
        );
    }
    for advisory in &response.advisories {
        println!("Skipped: {advisory}");
    }

    Ok(())
}

fn configure_polars_display() {
    // show every column
    env::set_var("POLARS_FMT_MAX_COLS", "-1");
    // show 20 rows
    env::set_var("POLARS_FMT_MAX_ROWS", "20");
}
