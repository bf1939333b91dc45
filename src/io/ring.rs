//! Bounded single-producer/single-consumer sample ring, the boundary
//! between a sample source running on its own thread (audio callback, SDR
//! I/Q reader) and the pipeline, which itself takes no locks.

use crate::errors::DspError;
use crossbeam::queue::ArrayQueue;
use num_complex::Complex64;
use std::sync::Arc;

/// Fixed-capacity ring of complex baseband samples shared between a
/// producer and a consumer. Cloning shares the same underlying queue.
#[derive(Clone)]
pub struct SampleRing {
    queue: Arc<ArrayQueue<Complex64>>,
}

impl SampleRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: Arc::new(ArrayQueue::new(capacity.max(1))),
        }
    }

    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Push one sample. Errs with `BufferOverflow` if the ring is full
    /// rather than overwriting or blocking.
    pub fn push(&self, sample: Complex64) -> Result<(), DspError> {
        self.queue.push(sample).map_err(|_| DspError::BufferOverflow {
            capacity: self.queue.capacity(),
            size: self.queue.len() + 1,
        })
    }

    /// Push as many samples from `samples` as fit; returns the number
    /// actually written.
    pub fn push_slice(&self, samples: &[Complex64]) -> usize {
        let mut written = 0;
        for &s in samples {
            if self.queue.push(s).is_err() {
                break;
            }
            written += 1;
        }
        written
    }

    pub fn pop(&self) -> Option<Complex64> {
        self.queue.pop()
    }

    /// Drain up to `count` samples into a freshly allocated vector.
    pub fn drain(&self, count: usize) -> Vec<Complex64> {
        let mut out = Vec::with_capacity(count.min(self.queue.len()));
        while out.len() < count {
            match self.queue.pop() {
                Some(s) => out.push(s),
                None => break,
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_preserves_order() {
        let ring = SampleRing::new(4);
        for i in 0..4 {
            ring.push(Complex64::new(i as f64, 0.0)).unwrap();
        }
        for i in 0..4 {
            assert_eq!(ring.pop().unwrap().re, i as f64);
        }
        assert!(ring.pop().is_none());
    }

    #[test]
    fn push_errs_when_full() {
        let ring = SampleRing::new(2);
        ring.push(Complex64::new(0.0, 0.0)).unwrap();
        ring.push(Complex64::new(0.0, 0.0)).unwrap();
        assert!(ring.push(Complex64::new(0.0, 0.0)).is_err());
    }

    #[test]
    fn push_slice_stops_at_capacity() {
        let ring = SampleRing::new(3);
        let samples: Vec<Complex64> = (0..10).map(|i| Complex64::new(i as f64, 0.0)).collect();
        let written = ring.push_slice(&samples);
        assert_eq!(written, 3);
        assert_eq!(ring.len(), 3);
    }

    #[test]
    fn drain_returns_available_samples_only() {
        let ring = SampleRing::new(8);
        ring.push_slice(&[Complex64::new(1.0, 0.0), Complex64::new(2.0, 0.0)]);
        let drained = ring.drain(5);
        assert_eq!(drained.len(), 2);
    }

    #[test]
    fn producer_consumer_threads_preserve_all_samples() {
        let ring = SampleRing::new(16);
        let producer_ring = ring.clone();
        let producer = std::thread::spawn(move || {
            for i in 0..1000 {
                loop {
                    if producer_ring.push(Complex64::new(i as f64, 0.0)).is_ok() {
                        break;
                    }
                    std::thread::yield_now();
                }
            }
        });

        let mut received = Vec::with_capacity(1000);
        while received.len() < 1000 {
            if let Some(s) = ring.pop() {
                received.push(s.re as i64);
            } else {
                std::thread::yield_now();
            }
        }
        producer.join().unwrap();
        assert_eq!(received, (0..1000).collect::<Vec<_>>());
    }
}
