use tokio::sync::mpsc;

use crate::{adaptation::AdaptationType, period::SharedPeriod, representation::Decipherability};

#[derive(Debug, Clone)]
pub enum ManifestEvent {
    /// The manifest was refreshed through `update` or `replace`.
    ManifestUpdate,
    /// The decipherability of some representations changed.
    DecipherabilityUpdate(Vec<DecipherabilityUpdate>),
}

#[derive(Debug, Clone)]
pub struct DecipherabilityUpdate {
    pub manifest_id: String,
    pub period: SharedPeriod,
    pub adaptation_id: String,
    pub adaptation_type: AdaptationType,
    pub representation_id: String,
    pub decipherable: Decipherability,
}

#[derive(Debug, Default)]
pub(crate) struct Subscribers {
    senders: Vec<mpsc::UnboundedSender<ManifestEvent>>,
}

impl Subscribers {
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<ManifestEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.senders.push(sender);
        receiver
    }

    /// Send `event` to every subscriber, forgetting the ones whose receiver was dropped.
    pub fn emit(&mut self, event: ManifestEvent) {
        self.senders
            .retain(|sender| sender.send(event.clone()).is_ok());
        tracing::trace!(subscribers = self.senders.len(), ?event, "Manifest event emitted");
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }
}
