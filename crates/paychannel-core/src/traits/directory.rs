// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only channel lookup used by the dialogue engine.

use async_trait::async_trait;

use crate::error::PaychannelError;
use crate::types::Channel;

/// Resolves payment channels by short code or id.
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    /// Exact-match lookup on the USSD code.
    ///
    /// With `require_enabled`, channels whose USSD access is switched off
    /// are treated as absent.
    async fn lookup_by_code(
        &self,
        code: &str,
        require_enabled: bool,
    ) -> Result<Option<Channel>, PaychannelError>;

    /// Lookup by channel id.
    async fn get_channel(&self, id: &str) -> Result<Option<Channel>, PaychannelError>;
}
