//! Device session bracket

use mtpcopy_types::{DeviceProvider, Result};
use tracing::{debug, warn};

/// An open connection to a device
///
/// Created by [`DeviceSession::connect`] and closed by
/// [`DeviceSession::finish`], which must be called on every path once the
/// connection succeeded.
///
/// Disconnecting is asynchronous, so dropping an unfinished session cannot
/// do it. If the future driving the session is cancelled or the body panics,
/// the device stays connected and only a warning is logged. Callers that can
/// be cancelled must release the device themselves.
pub struct DeviceSession<'a> {
    provider: &'a dyn DeviceProvider,
    closed: bool,
}

impl<'a> DeviceSession<'a> {
    /// Connect to `provider`
    ///
    /// If connecting fails there is nothing to release.
    pub async fn connect(provider: &'a dyn DeviceProvider) -> Result<Self> {
        provider.connect().await?;
        debug!("Session opened on '{}'", provider.name());
        Ok(Self {
            provider,
            closed: false,
        })
    }

    /// The connected device
    pub fn provider(&self) -> &'a dyn DeviceProvider {
        self.provider
    }

    /// Disconnect and combine the result with the outcome of the session body
    ///
    /// A body error takes precedence; a disconnect failure after it is only
    /// logged. After a successful body the disconnect failure is returned.
    pub async fn finish<T>(mut self, outcome: Result<T>) -> Result<T> {
        self.closed = true;
        let disconnected = self.provider.disconnect().await;
        debug!("Session closed on '{}'", self.provider.name());

        match (outcome, disconnected) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(disconnect_error)) => {
                warn!(
                    "Disconnecting from '{}' failed after an error: {}",
                    self.provider.name(),
                    disconnect_error
                );
                Err(e)
            }
        }
    }
}

impl Drop for DeviceSession<'_> {
    fn drop(&mut self) {
        if !self.closed {
            warn!(
                "Session on '{}' dropped without disconnecting",
                self.provider.name()
            );
        }
    }
}

impl std::fmt::Debug for DeviceSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSession")
            .field("device", &self.provider.name())
            .field("closed", &self.closed)
            .finish()
    }
}
