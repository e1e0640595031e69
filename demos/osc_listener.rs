//
// Simple OSC receiver that prints every packet, for checking the bridge output
// without running Wekinator.
//
// cargo run --example osc_listener -- 127.0.0.1:6448
//

use std::net::{SocketAddr, UdpSocket};

use rosc::{OscPacket, OscType};

fn main() {
    let addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:6448".to_string())
        .parse()
        .expect("expected a socket address like 127.0.0.1:6448");
    let sock = UdpSocket::bind(addr).unwrap();
    println!("Listening for OSC packets on {}", addr);
    let mut buf = [0u8; rosc::decoder::MTU];

    loop {
        match sock.recv_from(&mut buf) {
            Ok((size, from)) => match rosc::decoder::decode_udp(&buf[..size]) {
                Ok((_, packet)) => handle_packet(packet, from),
                Err(e) => println!("Undecodable packet from {}: {:?}", from, e),
            },
            Err(e) => {
                println!("Error receiving from socket: {}", e);
                break;
            }
        }
    }
}

fn handle_packet(packet: OscPacket, from: SocketAddr) {
    match packet {
        OscPacket::Message(msg) => {
            let values: Vec<String> = msg
                .args
                .iter()
                .map(|arg| match arg {
                    OscType::Float(v) => format!("{:.1}", v),
                    other => format!("{:?}", other),
                })
                .collect();
            println!(
                "{} {} [{}] ({} values)",
                from,
                msg.addr,
                values.join(", "),
                msg.args.len()
            );
        }
        OscPacket::Bundle(bundle) => {
            for packet in bundle.content {
                handle_packet(packet, from);
            }
        }
    }
}
