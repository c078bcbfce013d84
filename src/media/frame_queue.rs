//! Bounded hand-off queue between the decode thread and frame consumers.
//!
//! The queue keeps memory bounded when consumers lag: a push against a full
//! queue evicts the oldest element instead of blocking the producer. One lock
//! guards the sequence and a condition variable wakes blocked consumers on
//! push. The design assumes a single producer per instance; consumers may be
//! many.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Thread-safe queue with a soft capacity and drop-oldest backpressure.
pub struct BoundedFrameQueue<T> {
    inner: Mutex<VecDeque<T>>,
    available: Condvar,
    capacity: usize,
}

impl<T> BoundedFrameQueue<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Condvar::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Append an item, evicting the oldest one first when the queue is full.
    /// Never blocks the producer.
    pub fn push(&self, item: T) {
        let mut queue = self.inner.lock().unwrap();
        if queue.len() >= self.capacity {
            queue.pop_front();
        }
        queue.push_back(item);
        self.available.notify_one();
    }

    /// Reinsert an item at the head, used to un-pop a frame while the
    /// reference clock bootstraps.
    pub fn push_front(&self, item: T) {
        let mut queue = self.inner.lock().unwrap();
        queue.push_front(item);
        self.available.notify_one();
    }

    /// Non-blocking pop.
    pub fn try_pop(&self) -> Option<T> {
        self.inner.lock().unwrap().pop_front()
    }

    /// Pop, waiting up to `timeout` for an item to arrive. Returns `None` on
    /// timeout, so callers can tell an empty queue from a slow producer.
    pub fn wait_pop(&self, timeout: Duration) -> Option<T> {
        let queue = self.inner.lock().unwrap();
        let (mut queue, result) = self
            .available
            .wait_timeout_while(queue, timeout, |q| q.is_empty())
            .unwrap();
        if result.timed_out() && queue.is_empty() {
            return None;
        }
        queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }

    /// Remove every queued item. No signaling side effect, so a `clear`
    /// followed by a `push` leaves exactly one item queued.
    pub fn clear(&self) {
        self.inner.lock().unwrap().clear();
    }
}

impl<T: Clone> BoundedFrameQueue<T> {
    /// Peek the most recently pushed item without removing it.
    pub fn try_back(&self) -> Option<T> {
        self.inner.lock().unwrap().back().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_capacity_bound_retains_most_recent() {
        let queue = BoundedFrameQueue::new(3);
        for i in 0..10 {
            queue.push(i);
            assert!(queue.len() <= 3);
        }
        // The three most recent pushes survive, oldest first.
        assert_eq!(queue.try_pop(), Some(7));
        assert_eq!(queue.try_pop(), Some(8));
        assert_eq!(queue.try_pop(), Some(9));
        assert_eq!(queue.try_pop(), None);
    }

    #[test]
    fn test_fifo_order_under_wait_pop() {
        let queue = BoundedFrameQueue::new(16);
        for i in 0..8 {
            queue.push(i);
        }
        for i in 0..8 {
            assert_eq!(queue.wait_pop(Duration::from_millis(10)), Some(i));
        }
    }

    #[test]
    fn test_wait_pop_times_out_when_empty() {
        let queue: BoundedFrameQueue<u32> = BoundedFrameQueue::new(4);
        let start = Instant::now();
        assert_eq!(queue.wait_pop(Duration::from_millis(30)), None);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_wait_pop_wakes_on_push() {
        let queue = Arc::new(BoundedFrameQueue::new(4));
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                queue.push(42u32);
            })
        };
        assert_eq!(queue.wait_pop(Duration::from_secs(2)), Some(42));
        producer.join().unwrap();
    }

    #[test]
    fn test_push_front_reorders_head() {
        let queue = BoundedFrameQueue::new(4);
        queue.push(1);
        queue.push(2);
        let first = queue.try_pop().unwrap();
        queue.push_front(first);
        assert_eq!(queue.try_pop(), Some(1));
        assert_eq!(queue.try_pop(), Some(2));
    }

    #[test]
    fn test_clear_then_push_yields_single_item() {
        let queue = BoundedFrameQueue::new(4);
        for i in 0..4 {
            queue.push(i);
        }
        queue.clear();
        assert!(queue.is_empty());
        queue.push(99);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.try_pop(), Some(99));
    }

    #[test]
    fn test_try_back_peeks_most_recent() {
        let queue = BoundedFrameQueue::new(4);
        assert_eq!(queue.try_back(), None);
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.try_back(), Some(2));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_frame_survives_roundtrip_bit_identical() {
        use crate::media::VideoFrame;

        let frame = VideoFrame::new(4, 2, 1.25, (0u8..24).collect());
        let queue = BoundedFrameQueue::new(2);
        queue.push(frame.clone());
        let popped = queue.try_pop().unwrap();
        assert_eq!(popped, frame);
    }

    #[test]
    fn test_producer_consumer_handoff() {
        let queue = Arc::new(BoundedFrameQueue::new(64));
        let producer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..100u32 {
                    queue.push(i);
                }
            })
        };
        let mut received = Vec::new();
        while received.len() < 100 {
            if let Some(item) = queue.wait_pop(Duration::from_secs(2)) {
                received.push(item);
            } else {
                break;
            }
        }
        producer.join().unwrap();
        assert_eq!(received.len(), 100);
        // FIFO within the single producer.
        assert!(received.windows(2).all(|w| w[0] < w[1]));
    }
}
