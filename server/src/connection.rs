use crate::error::DeliveryError;
use crate::messages::Event;
use std::sync::mpsc::Sender;

/// Something that carries events to a client
pub trait Connection: Send {
  /// Hand over one event. A failure means the client is gone.
  fn send(&self, event: &Event) -> Result<(), DeliveryError>;
}

impl Connection for Sender<Event> {
  fn send(&self, event: &Event) -> Result<(), DeliveryError> {
    Sender::send(self, event.clone()).map_err(|_| DeliveryError::Closed)
  }
}
