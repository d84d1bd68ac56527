//! In-process topic based message queue over a `flume` channel.

use std::{collections::HashMap, future::Future, pin::Pin, sync::Arc};

use tracing::Instrument;

use crate::hosting::BackgroundService;

pub type ConsumerReturn<'async_fn> =
    Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'async_fn>>;
pub type ConsumerFn<SP> = for<'async_fn> fn(content: &'async_fn str, sp: Arc<SP>) -> ConsumerReturn;

#[derive(Debug, Clone)]
pub struct InternalMessage {
    pub target: String,
    pub body: String,
}

#[async_trait::async_trait]
pub trait MessageQueueProducerTemplate<T>: Send + Sync
where
    T: serde::Serialize + Send + Sync,
{
    async fn send_object(&self, content: &T, topic: Option<&str>) -> anyhow::Result<()>;
}

pub struct InternalMessageQueueProducer {
    receiver: flume::Receiver<InternalMessage>,
    sender: flume::Sender<InternalMessage>,
}

impl InternalMessageQueueProducer {
    pub fn new() -> Self {
        let (sender, receiver) = flume::unbounded();
        Self { sender, receiver }
    }

    pub fn get_receiver(&self) -> flume::Receiver<InternalMessage> {
        self.receiver.clone()
    }

    pub async fn send(&self, content: &str, topic: Option<&str>) -> anyhow::Result<()> {
        Ok(self
            .sender
            .send_async(InternalMessage {
                target: topic.unwrap_or_default().to_string(),
                body: content.to_string(),
            })
            .await?)
    }
}

impl Default for InternalMessageQueueProducer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl<T> MessageQueueProducerTemplate<T> for InternalMessageQueueProducer
where
    T: serde::Serialize + Send + Sync,
{
    async fn send_object(&self, content: &T, topic: Option<&str>) -> anyhow::Result<()> {
        let body = serde_json::to_string(content)?;
        self.send(&body, topic).await
    }
}

/// Dispatches every received message to the consumer registered for its topic.
pub struct InternalMessageQueueConsumer<SP>
where
    SP: Send + Sync + 'static,
{
    receiver: flume::Receiver<InternalMessage>,
    service_provider: Arc<SP>,
    fn_mapper: HashMap<String, ConsumerFn<SP>>,
}

impl<SP> InternalMessageQueueConsumer<SP>
where
    SP: Send + Sync + 'static,
{
    pub fn new(
        receiver: flume::Receiver<InternalMessage>,
        service_provider: Arc<SP>,
        fn_mapper: HashMap<String, ConsumerFn<SP>>,
    ) -> Self {
        Self {
            receiver,
            service_provider,
            fn_mapper,
        }
    }

    async fn dispatch(&self, message: InternalMessage) {
        tracing::trace!("Message received: {:?}.", message);
        match self.fn_mapper.get(message.target.as_str()) {
            Some(consumer) => {
                let sp = self.service_provider.clone();
                if let Err(e) = consumer(message.body.as_str(), sp)
                    .instrument(tracing::trace_span!("internal_message_queue"))
                    .await
                {
                    tracing::error!("{}", e)
                }
            }
            None => tracing::warn!("No consumer for topic: {}.", message.target),
        }
    }
}

#[async_trait::async_trait]
impl<SP> BackgroundService for InternalMessageQueueConsumer<SP>
where
    SP: Send + Sync + 'static,
{
    async fn run(&self) {
        while let Ok(message) = self.receiver.recv_async().await {
            self.dispatch(message).await;
        }
        tracing::warn!("Internal message queue closed.");
    }
}
