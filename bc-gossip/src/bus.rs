// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::announcement::Announcement;
use crate::errors::Error;
use parking_lot::RwLock;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// The external collaborator named in §1: something that can publish a
/// gossip announcement and let callers subscribe to the stream.
pub trait GossipBus: Send + Sync {
    fn publish(&self, announcement: Announcement) -> Result<(), Error>;
    fn subscribe(&self) -> Receiver<Announcement>;
}

/// An in-memory `mpsc` fan-out: `publish` clones the announcement to every
/// live subscriber channel, dropping any that have disconnected.
#[derive(Default)]
pub struct ChannelGossipBus {
    subscribers: RwLock<Vec<Sender<Announcement>>>,
}

impl ChannelGossipBus {
    pub fn new() -> Self {
        ChannelGossipBus::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl GossipBus for ChannelGossipBus {
    fn publish(&self, announcement: Announcement) -> Result<(), Error> {
        let mut subscribers = self.subscribers.write();
        if subscribers.is_empty() {
            return Err(Error::NoSubscribers);
        }
        subscribers.retain(|sender| sender.send(announcement.clone()).is_ok());
        Ok(())
    }

    fn subscribe(&self) -> Receiver<Announcement> {
        let (sender, receiver) = channel();
        self.subscribers.write().push(sender);
        receiver
    }
}

/// Convenience wrapper so callers can share one bus across threads without
/// re-deriving the `Arc` boilerplate at every call site.
pub type SharedGossipBus = Arc<dyn GossipBus>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announcement::AnnouncementKind;
    use bc_primitives::Checksum;

    fn sample_announcement() -> Announcement {
        Announcement {
            kind: AnnouncementKind::Add,
            block_id: Checksum::from_bytes([1u8; 64]),
            node_id: "node-1".to_string(),
            timestamp_ms: 1700000000000,
            ttl: 8,
            message_delivery: None,
        }
    }

    #[test]
    fn publish_fans_out_to_every_subscriber() {
        let bus = ChannelGossipBus::new();
        let rx1 = bus.subscribe();
        let rx2 = bus.subscribe();

        bus.publish(sample_announcement()).unwrap();

        assert_eq!(rx1.recv().unwrap().node_id, "node-1");
        assert_eq!(rx2.recv().unwrap().node_id, "node-1");
    }

    #[test]
    fn publish_with_no_subscribers_fails() {
        let bus = ChannelGossipBus::new();
        assert!(matches!(bus.publish(sample_announcement()), Err(Error::NoSubscribers)));
    }

    #[test]
    fn dropped_subscriber_is_pruned_on_next_publish() {
        let bus = ChannelGossipBus::new();
        {
            let _rx = bus.subscribe();
        }
        let rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        bus.publish(sample_announcement()).unwrap();
        assert!(rx2.recv().is_ok());
        assert_eq!(bus.subscriber_count(), 1);
    }
}
