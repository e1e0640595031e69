use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use log::debug;
use tokio::net::UdpSocket;

use crate::message::OutboundMessage;
use crate::Error;

/// Fire-and-forget OSC sender bound to one destination.
pub struct OscClient {
    socket: UdpSocket,
    destination: SocketAddr,
}

impl OscClient {
    pub async fn connect(destination: SocketAddr) -> Result<Self, Error> {
        // Bind to any local port in the destination's address family
        let local: SocketAddr = if destination.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        debug!(
            "OSC client bound to {} (sending to {})",
            socket.local_addr()?,
            destination
        );
        Ok(Self {
            socket,
            destination,
        })
    }

    pub fn destination(&self) -> SocketAddr {
        self.destination
    }

    /// Encodes `message` under `path` and sends it as a single datagram.
    pub async fn send(&self, path: &str, message: &OutboundMessage) -> Result<usize, Error> {
        let buf = rosc::encoder::encode(&message.to_packet(path))?;
        let sent = self.socket.send_to(&buf, self.destination).await?;
        Ok(sent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MotionFields;
    use rosc::{OscPacket, OscType};

    #[tokio::test]
    async fn sends_one_datagram_per_message() {
        let receiver = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        receiver
            .set_read_timeout(Some(std::time::Duration::from_secs(2)))
            .unwrap();
        let client = OscClient::connect(receiver.local_addr().unwrap())
            .await
            .unwrap();

        let message = OutboundMessage {
            buttons: Some(2.0),
            acceleration: [1.0, 2.0, 3.0],
            motion: Some(MotionFields::ZERO),
        };
        let sent = client.send("/wek/inputs", &message).await.unwrap();

        let mut buf = [0u8; rosc::decoder::MTU];
        let size = receiver.recv(&mut buf).unwrap();
        assert_eq!(size, sent);
        let (_, packet) = rosc::decoder::decode_udp(&buf[..size]).unwrap();
        match packet {
            OscPacket::Message(msg) => {
                assert_eq!(msg.addr, "/wek/inputs");
                assert_eq!(msg.args.len(), 10);
                assert_eq!(msg.args[0], OscType::Float(2.0));
                assert_eq!(msg.args[9], OscType::Float(0.0));
            }
            OscPacket::Bundle(_) => panic!("expected a message"),
        }
    }
}
