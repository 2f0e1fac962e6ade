// Copyright 2024 BrightChain Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no subscribers are registered on this bus")]
    NoSubscribers,
    #[error("subscriber channel {0} was disconnected")]
    SubscriberDisconnected(u64),
}
