use hydrocapt_rs::{HydrocaptClient, Settings};
use std::collections::BTreeMap;

/// Log in with the `HC_*` settings, fetch everything once and print it as JSON.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let settings = Settings::from_env()?;
    log::debug!("{:?}", settings);

    let mut client = HydrocaptClient::new(&settings);
    let data: BTreeMap<_, _> = client.fetch_all_data().await?.into_iter().collect();

    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}
