// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Gossip announcement bus: the wire shape block and message-delivery
//! events travel in, and an in-memory `mpsc` fan-out implementation.

pub mod announcement;
pub mod bus;
pub mod errors;

pub use announcement::{Announcement, AnnouncementKind, MessageDelivery, Priority};
pub use bus::{ChannelGossipBus, GossipBus, SharedGossipBus};
pub use errors::Error;
