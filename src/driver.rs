//! Streaming driver: pulls receiver events, publishes measurement messages
use std::io::{BufRead, Write};

use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    dispatcher::Dispatcher,
    output::OutputMessage,
    prelude::Error,
    report::{ReceiverEvent, ReceiverReport},
};

/// Source of [ReceiverEvent]s.
pub trait Transport {
    /// Blocks until the next [ReceiverEvent]. Ok(None) marks the end of stream.
    fn recv(&mut self) -> Result<Option<ReceiverEvent>, Error>;
}

/// Sink of [OutputMessage]s.
pub trait Publisher {
    fn publish(&mut self, msg: &OutputMessage) -> Result<(), Error>;
}

/// [Transport] reading one JSON encoded [ReceiverEvent] per line.
/// Lines that do not decode (bad JSON or bad bytes) are skipped.
pub struct JsonLinesTransport<R: BufRead> {
    reader: R,
    line: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead> JsonLinesTransport<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::new(),
            line_number: 0,
        }
    }
}

impl<R: BufRead> Transport for JsonLinesTransport<R> {
    fn recv(&mut self) -> Result<Option<ReceiverEvent>, Error> {
        loop {
            self.line.clear();
            if self.reader.read_until(b'\n', &mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let content = self.line.trim_ascii();
            if content.is_empty() {
                continue;
            }

            match serde_json::from_slice::<ReceiverEvent>(content) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => {
                    warn!("line {}: undecodable event: {}", self.line_number, e);
                },
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputEvent<'a> {
    gnss_measurements: &'a OutputMessage,
}

/// [Publisher] writing one JSON encoded message per line.
pub struct JsonLinesPublisher<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Releases the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Publisher for JsonLinesPublisher<W> {
    fn publish(&mut self, msg: &OutputMessage) -> Result<(), Error> {
        let event = OutputEvent {
            gnss_measurements: msg,
        };
        serde_json::to_writer(&mut self.writer, &event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Runs the [Dispatcher] over a [Transport], publishing exactly one
/// message per measurement report.
pub struct Driver<T: Transport, P: Publisher> {
    dispatcher: Dispatcher,
    transport: T,
    publisher: P,
}

impl<T: Transport, P: Publisher> Driver<T, P> {
    pub fn new(dispatcher: Dispatcher, transport: T, publisher: P) -> Self {
        Self {
            dispatcher,
            transport,
            publisher,
        }
    }

    /// Processes one [ReceiverEvent], returns true when a message was published.
    pub fn step(&mut self, event: &ReceiverEvent) -> Result<bool, Error> {
        let output = self
            .dispatcher
            .process(&event.ublox_gnss, event.log_mono_time);

        match (&event.ublox_gnss, output) {
            (_, Some(msg)) => {
                debug!(
                    "{} - publishing {} measurements",
                    event.log_mono_time,
                    msg.corrected_measurements.len()
                );
                self.publisher.publish(&msg)?;
                Ok(true)
            },
            (ReceiverReport::MeasurementReport(_), None) => {
                self.publisher.publish(&OutputMessage::empty())?;
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    /// Runs until end of stream. Returns the number of published messages.
    pub fn run(&mut self) -> Result<usize, Error> {
        let mut published = 0;
        while let Some(event) = self.transport.recv()? {
            if self.step(&event)? {
                published += 1;
            }
        }
        info!("end of stream: {} messages published", published);
        Ok(published)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Releases the [Publisher].
    pub fn into_publisher(self) -> P {
        self.publisher
    }
}
