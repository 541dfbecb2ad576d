use crate::application::notif::Notify;
use crate::domain::ports::{Notification, SinkRef};
use crate::error::Result;
use async_trait::async_trait;
use std::marker::PhantomData;

/// An execution result that can be reported to operators.
pub trait Notifiable {
    fn notification(&self) -> Notification;
}

/// Forwards results to the notification sink.
pub struct SinkNotifier<P> {
    sink: SinkRef,
    _result: PhantomData<fn(&P)>,
}

impl<P> SinkNotifier<P> {
    pub fn new(sink: SinkRef) -> Self {
        Self {
            sink,
            _result: PhantomData,
        }
    }
}

#[async_trait]
impl<P> Notify<P> for SinkNotifier<P>
where
    P: Notifiable + Send + Sync,
{
    async fn notify(&self, p: &P) -> Result<()> {
        self.sink.send(p.notification()).await
    }
}
