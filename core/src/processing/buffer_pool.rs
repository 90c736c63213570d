use crate::prelude::{SourceError, SourceResult};

/// Scoped pool of stack buffers reused across the mechanisms one worker scores.
pub struct StackPool {
    buffers: Vec<Vec<f64>>,
    max_capacity: usize,
}

impl StackPool {
    pub fn with_capacity(max_capacity: usize) -> Self {
        Self {
            buffers: Vec::with_capacity(max_capacity),
            max_capacity,
        }
    }

    /// Hands out a zeroed buffer of `length` samples, reusing a released one
    /// when available.
    pub fn checkout(&mut self, length: usize) -> SourceResult<Vec<f64>> {
        if let Some(mut buffer) = self.buffers.pop() {
            buffer.clear();
            buffer.resize(length, 0.0);
            Ok(buffer)
        } else if self.max_capacity > 0 {
            Ok(vec![0.0; length])
        } else {
            Err(SourceError::Internal("stack pool has no capacity".to_string()))
        }
    }

    /// Returns a buffer back to the pool for reuse.
    pub fn release(&mut self, mut buffer: Vec<f64>) {
        buffer.clear();
        if self.buffers.len() < self.max_capacity {
            self.buffers.push(buffer);
        }
    }

    pub fn reset(&mut self) {
        self.buffers.clear();
    }
}
