//! Queue seams between the device and host contexts.

use hid_proto::QueueEntry;

/// Queue had no free slot; the entry was not enqueued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QueueFull;

/// Device-side end of the queue.
pub trait ReportProducer {
    /// Enqueue without blocking.
    fn try_enqueue(&mut self, entry: QueueEntry) -> Result<(), QueueFull>;
}

/// Host-side end of the queue.
pub trait ReportConsumer {
    /// Dequeue without blocking.
    fn try_dequeue(&mut self) -> Option<QueueEntry>;
}

impl<T: ReportProducer + ?Sized> ReportProducer for &mut T {
    fn try_enqueue(&mut self, entry: QueueEntry) -> Result<(), QueueFull> {
        (**self).try_enqueue(entry)
    }
}

impl<T: ReportConsumer + ?Sized> ReportConsumer for &mut T {
    fn try_dequeue(&mut self) -> Option<QueueEntry> {
        (**self).try_dequeue()
    }
}

impl<const N: usize> ReportProducer for heapless::spsc::Producer<'_, QueueEntry, N> {
    fn try_enqueue(&mut self, entry: QueueEntry) -> Result<(), QueueFull> {
        self.enqueue(entry).map_err(|_| QueueFull)
    }
}

impl<const N: usize> ReportConsumer for heapless::spsc::Consumer<'_, QueueEntry, N> {
    fn try_dequeue(&mut self) -> Option<QueueEntry> {
        self.dequeue()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::spsc::Queue;

    #[test]
    fn test_spsc_backend_fifo_and_full() {
        // heapless 0.8 keeps one slot free: capacity is N - 1.
        let mut queue: Queue<QueueEntry, 3> = Queue::new();
        let (mut producer, mut consumer) = queue.split();
        assert_eq!(producer.try_enqueue(QueueEntry::MouseEot), Ok(()));
        let keyboard = QueueEntry::Keyboard(Default::default());
        assert_eq!(producer.try_enqueue(keyboard), Ok(()));
        assert_eq!(producer.try_enqueue(QueueEntry::MouseEot), Err(QueueFull));

        assert_eq!(consumer.try_dequeue(), Some(QueueEntry::MouseEot));
        assert_eq!(consumer.try_dequeue(), Some(keyboard));
        assert_eq!(consumer.try_dequeue(), None);
    }
}
