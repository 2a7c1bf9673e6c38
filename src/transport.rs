/*
 * Transport Module
 *
 * How descriptors reach the environment. Control panels publish a
 * `cube-created` message; the relay broadcasts it to every other viewer as
 * `new-cube`. Two transports are provided:
 * - ChannelTransport: in-process, the viewer's own panel feeds it
 * - JsonLinesTransport: TCP client speaking one JSON object per line,
 *   `{"event":"new-cube","data":{...}}`
 */

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::descriptor::CreatureDescriptor;
use crate::error::TransportError;

// One line on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum WireMessage {
    NewCube(CreatureDescriptor),
    CubeCreated(CreatureDescriptor),
}

impl WireMessage {
    pub fn decode(line: &str) -> Result<Self, TransportError> {
        Ok(serde_json::from_str(line)?)
    }

    pub fn encode(&self) -> Result<String, TransportError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Spawn(CreatureDescriptor),
    Connected,
    Disconnected,
    Error(String),
}

pub trait Transport {
    // Events received since the last poll, oldest first; never blocks
    fn poll(&mut self) -> Vec<TransportEvent>;

    // Broadcast a descriptor composed locally
    fn publish(&mut self, descriptor: &CreatureDescriptor) -> Result<(), TransportError>;
}

fn drain(receiver: &Receiver<TransportEvent>) -> (Vec<TransportEvent>, bool) {
    let mut events = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(event) => events.push(event),
            Err(TryRecvError::Empty) => return (events, false),
            Err(TryRecvError::Disconnected) => return (events, true),
        }
    }
}

// Feeds events from other threads or the local panel
pub struct ChannelTransport {
    sender: Sender<TransportEvent>,
    receiver: Receiver<TransportEvent>,
}

// Cloneable handle for pushing events into a ChannelTransport
#[derive(Clone)]
pub struct PanelSender {
    sender: Sender<TransportEvent>,
}

impl PanelSender {
    pub fn send(&self, descriptor: CreatureDescriptor) -> Result<(), TransportError> {
        self.sender
            .send(TransportEvent::Spawn(descriptor))
            .map_err(|_| TransportError::Closed)
    }

    pub fn send_event(&self, event: TransportEvent) -> Result<(), TransportError> {
        self.sender.send(event).map_err(|_| TransportError::Closed)
    }
}

impl ChannelTransport {
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    pub fn panel(&self) -> PanelSender {
        PanelSender {
            sender: self.sender.clone(),
        }
    }
}

impl Default for ChannelTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for ChannelTransport {
    fn poll(&mut self) -> Vec<TransportEvent> {
        // We hold a sender ourselves, so the channel never disconnects
        drain(&self.receiver).0
    }

    // With no relay in between, what is published is delivered to ourselves
    fn publish(&mut self, descriptor: &CreatureDescriptor) -> Result<(), TransportError> {
        self.sender
            .send(TransportEvent::Spawn(descriptor.clone()))
            .map_err(|_| TransportError::Closed)
    }
}

// TCP client for a line-delimited JSON relay
pub struct JsonLinesTransport {
    addr: String,
    writer: TcpStream,
    receiver: Receiver<TransportEvent>,
    connected: bool,
}

impl JsonLinesTransport {
    pub fn connect(addr: &str) -> Result<Self, TransportError> {
        let writer = TcpStream::connect(addr).map_err(|source| TransportError::Connect {
            addr: addr.to_string(),
            source,
        })?;
        let reader = writer.try_clone()?;
        let (sender, receiver) = mpsc::channel();

        // Reported on the first poll, like any other event
        let _ = sender.send(TransportEvent::Connected);

        let thread_addr = addr.to_string();
        thread::Builder::new()
            .name("transport-reader".into())
            .spawn(move || read_lines(reader, sender, thread_addr))?;

        info!("Connected to relay at {}", addr);
        Ok(Self {
            addr: addr.to_string(),
            writer,
            receiver,
            connected: true,
        })
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }
}

impl Transport for JsonLinesTransport {
    fn poll(&mut self) -> Vec<TransportEvent> {
        let (events, reader_gone) = drain(&self.receiver);
        if events.contains(&TransportEvent::Disconnected) || reader_gone {
            self.connected = false;
        }
        events
    }

    fn publish(&mut self, descriptor: &CreatureDescriptor) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::Closed);
        }
        let line = WireMessage::CubeCreated(descriptor.clone()).encode()?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        debug!("Published {} to {}", descriptor.model_path, self.addr);
        Ok(())
    }
}

fn read_lines(stream: TcpStream, sender: Sender<TransportEvent>, addr: String) {
    let reader = BufReader::new(stream);
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                let _ = sender.send(TransportEvent::Error(err.to_string()));
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = match WireMessage::decode(&line) {
            Ok(WireMessage::NewCube(descriptor)) => TransportEvent::Spawn(descriptor),
            Ok(WireMessage::CubeCreated(_)) => {
                debug!("Ignoring echoed cube-created from {}", addr);
                continue;
            }
            Err(err) => {
                warn!("Dropping malformed line from {}: {}", addr, err);
                TransportEvent::Error(err.to_string())
            }
        };

        if sender.send(event).is_err() {
            // Transport dropped
            return;
        }
    }

    info!("Relay at {} closed the connection", addr);
    let _ = sender.send(TransportEvent::Disconnected);
}
