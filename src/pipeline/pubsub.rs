//! Pub/Sub mode handler (`spec.md` §4.5, component C6).
//!
//! After `SUBSCRIBE`/`PSUBSCRIBE`, most inbound frames are unsolicited
//! push messages routed to per-channel callbacks rather than matched to a
//! FIFO completion. A small whitelist of commands (`PING`, `QUIT`) still
//! behaves request/response and falls through to the ordinary
//! [`super::CommandPipeline`]-style queue this type shares via
//! [`super::queue::transplant`].

use std::collections::HashMap;

use crate::resp::RespValue;

use super::queue::InFlightQueue;

/// An opaque handle returned at subscription time, per the design note in
/// `spec.md` §9 ("callback identity in Pub/Sub... a better design assigns
/// a subscription handle"). Required for selective unsubscribe of a
/// single callback; bulk channel-wide unsubscription (the teacher-grade
/// minimum the spec also asks for) doesn't need one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A registered Pub/Sub callback: invoked with `(channel_or_pattern, payload)`.
pub type Callback = Box<dyn FnMut(&str, &[u8]) + Send>;

struct Registered {
    id: SubscriptionId,
    callback: Callback,
}

/// Channel-or-pattern -> ordered list of registered callbacks, plus the
/// server-reported active-subscription counter (`spec.md` §3).
#[derive(Default)]
pub struct SubscriptionTable {
    by_key: HashMap<String, Vec<Registered>>,
    active_count: i64,
    next_id: u64,
}

/// What the driver should do after handing an inbound value to
/// [`PubSubPipeline::dispatch`].
pub enum PubSubOutcome {
    /// A `message`/`pmessage` frame was routed to its callbacks.
    MessageDelivered,
    /// A subscription-change frame updated the active count. If it
    /// reached zero the connection should exit Pub/Sub mode
    /// (`spec.md` §9, the TODO the source left and this spec resolves).
    SubscriptionChanged { active_count: i64 },
    /// Not a Pub/Sub-shaped frame: forward to the ordinary FIFO queue
    /// (`spec.md` §4.5, "If the frame does not match..."). Logged at
    /// debug severity by the driver, not fatal.
    ForwardToQueue(RespValue),
}

#[derive(Default)]
pub struct PubSubPipeline {
    in_flight: InFlightQueue,
    subscriptions: SubscriptionTable,
}

impl PubSubPipeline {
    pub fn new() -> Self {
        PubSubPipeline::default()
    }

    pub fn in_flight(&mut self) -> &mut InFlightQueue {
        &mut self.in_flight
    }

    /// Register `callback` under every key in `channels` (channel names
    /// for `SUBSCRIBE`, patterns for `PSUBSCRIBE`). Returns one handle per
    /// key, each individually revocable via [`Self::unsubscribe_handle`].
    pub fn subscribe(
        &mut self,
        channels: &[String],
        callback: impl FnMut(&str, &[u8]) + Send + 'static,
    ) -> Vec<SubscriptionId> {
        // Cloning the callback's effect by boxing a forwarding closure per
        // channel isn't possible without `Clone` on arbitrary `FnMut`, so
        // the single callback is shared (via `Arc<Mutex<_>>`) behind one
        // boxed trampoline per key; callers registering one callback
        // across several channels in a single `SUBSCRIBE` still get one
        // handle per channel, as `spec.md` §4.5 implies ("register the
        // callback under each supplied channel").
        let shared = std::sync::Arc::new(std::sync::Mutex::new(callback));
        let mut ids = Vec::with_capacity(channels.len());
        for channel in channels {
            let id = SubscriptionId(self.subscriptions.next_id);
            self.subscriptions.next_id += 1;
            ids.push(id);
            let shared = shared.clone();
            self.subscriptions.by_key.entry(channel.clone()).or_default().push(Registered {
                id,
                callback: Box::new(move |ch, payload| (shared.lock().unwrap())(ch, payload)),
            });
        }
        ids
    }

    /// The teacher-grade minimum unsubscribe: remove every callback
    /// registered under the given keys wholesale.
    pub fn unsubscribe_keys(&mut self, keys: &[String]) {
        for key in keys {
            self.subscriptions.by_key.remove(key);
        }
    }

    /// Selective unsubscribe by handle, the recommended addition from
    /// `spec.md` §9.
    pub fn unsubscribe_handle(&mut self, id: SubscriptionId) {
        self.subscriptions.by_key.retain(|_, registered| {
            registered.retain(|r| r.id != id);
            !registered.is_empty()
        });
    }

    pub fn active_count(&self) -> i64 {
        self.subscriptions.active_count
    }

    /// Interpret one inbound value. A three- or four-element array whose
    /// first element is one of the known Pub/Sub verbs is handled here;
    /// everything else falls through to the FIFO queue.
    pub fn dispatch(&mut self, value: RespValue) -> PubSubOutcome {
        let items = match &value {
            RespValue::Array(Some(items)) if items.len() == 3 || items.len() == 4 => items,
            _ => return PubSubOutcome::ForwardToQueue(value),
        };

        let kind = match &items[0] {
            RespValue::BulkString(Some(b)) => match std::str::from_utf8(b) {
                Ok(s) => s.to_ascii_lowercase(),
                Err(_) => return PubSubOutcome::ForwardToQueue(value),
            },
            _ => return PubSubOutcome::ForwardToQueue(value),
        };

        match (kind.as_str(), items.len()) {
            ("message", 3) => {
                let channel = bulk_str(&items[1]);
                let payload = bulk_bytes(&items[2]);
                if let (Some(channel), Some(payload)) = (channel, payload) {
                    self.invoke(&channel, &payload);
                    return PubSubOutcome::MessageDelivered;
                }
                PubSubOutcome::ForwardToQueue(value)
            }
            ("pmessage", 4) => {
                let pattern = bulk_str(&items[1]);
                let payload = bulk_bytes(&items[3]);
                if let (Some(pattern), Some(payload)) = (pattern, payload) {
                    self.invoke(&pattern, &payload);
                    return PubSubOutcome::MessageDelivered;
                }
                PubSubOutcome::ForwardToQueue(value)
            }
            ("subscribe", 3) | ("psubscribe", 3) | ("unsubscribe", 3) | ("punsubscribe", 3) => {
                match i64::try_from_resp(&items[2]) {
                    Some(count) => {
                        self.subscriptions.active_count = count;
                        PubSubOutcome::SubscriptionChanged { active_count: count }
                    }
                    None => PubSubOutcome::ForwardToQueue(value),
                }
            }
            _ => PubSubOutcome::ForwardToQueue(value),
        }
    }

    fn invoke(&mut self, key: &str, payload: &[u8]) {
        if let Some(registered) = self.subscriptions.by_key.get_mut(key) {
            for entry in registered.iter_mut() {
                (entry.callback)(key, payload);
            }
        }
    }
}

fn bulk_str(value: &RespValue) -> Option<String> {
    match value {
        RespValue::BulkString(Some(b)) => String::from_utf8(b.to_vec()).ok(),
        RespValue::SimpleString(s) => Some(s.clone()),
        _ => None,
    }
}

fn bulk_bytes(value: &RespValue) -> Option<Vec<u8>> {
    match value {
        RespValue::BulkString(Some(b)) => Some(b.to_vec()),
        _ => None,
    }
}

/// Local helper trait so `dispatch` can read the active count without
/// pulling in the whole `Decode` machinery for a single `i64` case.
trait TryFromResp {
    fn try_from_resp(value: &RespValue) -> Option<i64>;
}

impl TryFromResp for i64 {
    fn try_from_resp(value: &RespValue) -> Option<i64> {
        match value {
            RespValue::Integer(n) => Some(*n),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn bulk(s: &str) -> RespValue {
        RespValue::bulk(s.to_string())
    }

    #[test]
    fn message_dispatches_to_registered_callbacks_in_order() {
        let mut pubsub = PubSubPipeline::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls1 = calls.clone();
        let calls2 = calls.clone();
        pubsub.subscribe(&["ch".to_string()], move |channel, payload| {
            calls1.lock().unwrap().push(("first", channel.to_string(), payload.to_vec()));
        });
        pubsub.subscribe(&["ch".to_string()], move |channel, payload| {
            calls2.lock().unwrap().push(("second", channel.to_string(), payload.to_vec()));
        });
        pubsub.subscribe(&["other".to_string()], |_, _| panic!("wrong channel invoked"));

        let frame = RespValue::Array(Some(vec![bulk("message"), bulk("ch"), bulk("hello")]));
        assert!(matches!(pubsub.dispatch(frame), PubSubOutcome::MessageDelivered));

        let recorded = calls.lock().unwrap();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].0, "first");
        assert_eq!(recorded[1].0, "second");
        assert_eq!(recorded[0].2, b"hello");
    }

    #[test]
    fn pmessage_uses_four_element_shape() {
        let mut pubsub = PubSubPipeline::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls1 = calls.clone();
        pubsub.subscribe(&["ch.*".to_string()], move |pattern, payload| {
            calls1.lock().unwrap().push((pattern.to_string(), payload.to_vec()));
        });

        let frame = RespValue::Array(Some(vec![
            bulk("pmessage"),
            bulk("ch.*"),
            bulk("ch.1"),
            bulk("payload"),
        ]));
        assert!(matches!(pubsub.dispatch(frame), PubSubOutcome::MessageDelivered));
        assert_eq!(calls.lock().unwrap()[0].0, "ch.*");
    }

    #[test]
    fn subscription_change_tracks_active_count() {
        let mut pubsub = PubSubPipeline::new();
        let frame = RespValue::Array(Some(vec![bulk("subscribe"), bulk("ch"), RespValue::Integer(1)]));
        match pubsub.dispatch(frame) {
            PubSubOutcome::SubscriptionChanged { active_count } => assert_eq!(active_count, 1),
            _ => panic!("expected SubscriptionChanged"),
        }
        assert_eq!(pubsub.active_count(), 1);
    }

    #[test]
    fn non_pubsub_three_array_forwards_to_queue() {
        let mut pubsub = PubSubPipeline::new();
        let frame = RespValue::Array(Some(vec![RespValue::Integer(1), RespValue::Integer(2), RespValue::Integer(3)]));
        match pubsub.dispatch(frame.clone()) {
            PubSubOutcome::ForwardToQueue(v) => assert_eq!(v, frame),
            _ => panic!("expected ForwardToQueue"),
        }
    }

    #[test]
    fn unsubscribe_by_handle_is_selective() {
        let mut pubsub = PubSubPipeline::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let calls1 = calls.clone();
        let calls2 = calls.clone();
        let ids = pubsub.subscribe(&["ch".to_string()], move |_, _| calls1.lock().unwrap().push(1));
        pubsub.subscribe(&["ch".to_string()], move |_, _| calls2.lock().unwrap().push(2));

        pubsub.unsubscribe_handle(ids[0]);
        let frame = RespValue::Array(Some(vec![bulk("message"), bulk("ch"), bulk("x")]));
        pubsub.dispatch(frame);
        assert_eq!(*calls.lock().unwrap(), vec![2]);
    }
}
