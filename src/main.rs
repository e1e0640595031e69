use clap::Parser;
use wiimote_osc::{
    connect_with_retry, mode, Args, Bridge, Config, Controller, Error, HidConnector, OscClient,
    LED_1,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_args(Args::parse())?;
    println!("Arguments: {}", serde_json::to_string(&config)?);

    let client = OscClient::connect(config.destination()?).await?;

    // Pairing is manual, so keep trying until the user presses 1+2
    let mut connector = HidConnector::new()?;
    let (mut wiimote, _) = connect_with_retry(&mut connector, config.connect_attempts)?;
    println!("Wiimote successfully connected!");
    wiimote.set_led(LED_1)?;

    mode::configure(&mut wiimote, &config)?;
    println!("Initial state: {}", serde_json::to_string(&wiimote.state()?)?);

    Bridge::new(wiimote, client, config).run().await
}
