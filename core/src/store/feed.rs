// karat/src/store/feed.rs

//! Change notifications and the cancellable subscription handle returned by
//! `DataStore::watch`.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{event, Level};

use crate::error::{KaratError, KaratResult};

const FEED_CAPACITY: usize = 64;

/// What a subscription listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
  Products,
  Leads,
  GoldRates,
  GstRate,
}

impl Topic {
  pub const ALL: [Topic; 4] = [Topic::Products, Topic::Leads, Topic::GoldRates, Topic::GstRate];

  fn index(self) -> usize {
    match self {
      Topic::Products => 0,
      Topic::Leads => 1,
      Topic::GoldRates => 2,
      Topic::GstRate => 3,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Topic::Products => "products",
      Topic::Leads => "leads",
      Topic::GoldRates => "gold_rates",
      Topic::GstRate => "gst_rate",
    }
  }

  pub fn parse(s: &str) -> Option<Topic> {
    Topic::ALL.into_iter().find(|t| t.as_str() == s)
  }
}

/// One broadcast channel per topic. Cheap to clone; every clone publishes
/// to the same subscribers.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
  senders: Arc<[broadcast::Sender<()>; 4]>,
}

impl Default for ChangeFeed {
  fn default() -> Self {
    Self::new()
  }
}

impl ChangeFeed {
  pub fn new() -> Self {
    let channel = || broadcast::channel::<()>(FEED_CAPACITY).0;
    Self {
      senders: Arc::new([channel(), channel(), channel(), channel()]),
    }
  }

  fn sender(&self, topic: Topic) -> &broadcast::Sender<()> {
    &self.senders[topic.index()]
  }

  /// Notifies every live subscription on `topic`. Publishing with no
  /// subscribers is not an error.
  pub fn publish(&self, topic: Topic) {
    let delivered = self.sender(topic).send(()).unwrap_or(0);
    event!(Level::TRACE, topic = topic.as_str(), delivered, "Change published.");
  }

  pub fn subscribe(&self, topic: Topic) -> Subscription {
    Subscription {
      topic,
      rx: self.sender(topic).subscribe(),
    }
  }

  pub fn subscriber_count(&self, topic: Topic) -> usize {
    self.sender(topic).receiver_count()
  }
}

/// A live listener on one topic. Dropping it (or calling [`release`]) stops
/// delivery; nothing else needs to be torn down.
///
/// [`release`]: Subscription::release
#[derive(Debug)]
pub struct Subscription {
  topic: Topic,
  rx: broadcast::Receiver<()>,
}

impl Subscription {
  pub fn topic(&self) -> Topic {
    self.topic
  }

  /// Resolves on the next change. Changes missed while the subscriber was
  /// slow collapse into a single notification.
  pub async fn changed(&mut self) -> KaratResult<()> {
    match self.rx.recv().await {
      Ok(()) => Ok(()),
      Err(broadcast::error::RecvError::Lagged(skipped)) => {
        event!(Level::DEBUG, topic = self.topic.as_str(), skipped, "Subscription lagged, coalescing.");
        Ok(())
      }
      Err(broadcast::error::RecvError::Closed) => Err(KaratError::Internal(format!(
        "change feed for '{}' closed",
        self.topic.as_str()
      ))),
    }
  }

  pub fn release(self) {
    event!(Level::DEBUG, topic = self.topic.as_str(), "Subscription released.");
  }
}
