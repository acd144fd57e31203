use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::client::Client;
use crate::clock::Clock;
use crate::config::{DefaultConfig, S2wConfig};
use crate::sink::DataSink;
use crate::transport::Transport;

/// A [`Client`] that can be reached from several execution contexts.
///
/// Every exchange with the module runs inside [`SharedClient::lock`], so a
/// command and its response are never interleaved with another context.
/// Locking again from inside the closure panics.
pub struct SharedClient<M, T, C, S, Cfg = DefaultConfig>
where
    M: RawMutex,
    T: Transport,
    C: Clock,
    S: DataSink,
{
    inner: Mutex<M, RefCell<Client<T, C, S, Cfg>>>,
}

impl<M, T, C, S, Cfg> SharedClient<M, T, C, S, Cfg>
where
    M: RawMutex,
    T: Transport,
    C: Clock,
    S: DataSink,
    Cfg: S2wConfig,
{
    pub const fn new(client: Client<T, C, S, Cfg>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(client)),
        }
    }

    pub fn lock<R>(&self, f: impl FnOnce(&mut Client<T, C, S, Cfg>) -> R) -> R {
        self.inner.lock(|client| f(&mut client.borrow_mut()))
    }

    pub fn into_inner(self) -> Client<T, C, S, Cfg> {
        self.inner.into_inner().into_inner()
    }
}
