//! FIFO buffer for outbound frames awaiting an open channel.

use std::collections::VecDeque;

/// Strictly ordered queue of serialized frames. A frame leaves the queue
/// exactly once: either when it is flushed after the channel opens, or when
/// the caller clears the queue explicitly.
#[derive(Debug, Default)]
pub struct MessageQueue {
    frames: VecDeque<String>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, frame: String) {
        self.frames.push_back(frame);
    }

    /// Remove and return the oldest frame.
    pub fn dequeue(&mut self) -> Option<String> {
        self.frames.pop_front()
    }

    /// Put a frame back at the front after a failed transmission so flush
    /// order is preserved across retries.
    pub fn requeue_front(&mut self, frame: String) {
        self.frames.push_front(frame);
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn dequeue_preserves_enqueue_order() {
        let mut queue = MessageQueue::new();
        queue.enqueue("a".into());
        queue.enqueue("b".into());
        queue.enqueue("c".into());

        assert_eq!(queue.dequeue().as_deref(), Some("a"));
        assert_eq!(queue.dequeue().as_deref(), Some("b"));
        assert_eq!(queue.dequeue().as_deref(), Some("c"));
        assert_eq!(queue.dequeue(), None);
    }

    #[test]
    fn requeue_front_keeps_the_frame_next_in_line() {
        let mut queue = MessageQueue::new();
        queue.enqueue("a".into());
        queue.enqueue("b".into());

        let frame = queue.dequeue().unwrap();
        queue.requeue_front(frame);

        assert_eq!(queue.dequeue().as_deref(), Some("a"));
        assert_eq!(queue.dequeue().as_deref(), Some("b"));
    }

    #[test]
    fn clear_empties_the_queue() {
        let mut queue = MessageQueue::new();
        queue.enqueue("a".into());
        queue.clear();
        assert!(queue.is_empty());
    }

    proptest! {
        /// Draining always yields exactly the enqueued frames, in order.
        #[test]
        fn drain_is_fifo(frames in proptest::collection::vec("[a-z0-9]{0,16}", 0..64)) {
            let mut queue = MessageQueue::new();
            for frame in &frames {
                queue.enqueue(frame.clone());
            }

            let mut drained = Vec::new();
            while let Some(frame) = queue.dequeue() {
                drained.push(frame);
            }
            prop_assert_eq!(drained, frames);
        }
    }
}
