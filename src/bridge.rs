use log::debug;
use tokio::time::sleep;

use crate::client::OscClient;
use crate::config::Config;
use crate::connector::Controller;
use crate::message::OutboundMessage;
use crate::Error;

/// Poll-and-forward loop: snapshot, assemble, send, pause.
pub struct Bridge<C: Controller> {
    controller: C,
    client: OscClient,
    config: Config,
}

impl<C: Controller> Bridge<C> {
    pub fn new(controller: C, client: OscClient, config: Config) -> Self {
        Self {
            controller,
            client,
            config,
        }
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// One iteration without the trailing pause.
    pub async fn step(&mut self) -> Result<OutboundMessage, Error> {
        let snapshot = self.controller.state()?;
        let message = OutboundMessage::assemble(&snapshot, &self.config);
        println!("Sending: {}", message);
        let sent = self.client.send(&self.config.message, &message).await?;
        debug!("Sent {} bytes to {}", sent, self.client.destination());
        Ok(message)
    }

    /// Runs `iterations` send/pause cycles.
    pub async fn run_for(&mut self, iterations: u64) -> Result<(), Error> {
        let delay = self.config.delay_duration();
        for _ in 0..iterations {
            self.step().await?;
            sleep(delay).await;
        }
        Ok(())
    }

    /// Runs until a read or send fails. There is no reconnect.
    pub async fn run(&mut self) -> Result<(), Error> {
        let delay = self.config.delay_duration();
        loop {
            self.step().await?;
            sleep(delay).await;
        }
    }
}
