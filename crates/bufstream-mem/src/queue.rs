//! FIFO of owned chunks with an incrementally maintained byte total.

use std::collections::VecDeque;

use bufstream_core::chunk::Chunk;

#[derive(Debug, Default)]
pub struct ChunkQueue {
    chunks: VecDeque<Chunk>,
    size: usize,
}

impl ChunkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `chunk`; the queue owns it until `dequeue` hands it back.
    pub fn enqueue(&mut self, chunk: Chunk) {
        self.size += chunk.len();
        self.chunks.push_back(chunk);
    }

    /// Remove the oldest chunk, releasing its bytes from the total.
    pub fn dequeue(&mut self) -> Option<Chunk> {
        let chunk = self.chunks.pop_front()?;
        self.size -= chunk.len();
        Some(chunk)
    }

    /// Sum of the lengths of all queued chunks.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of queued chunks (zero-length chunks included).
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Drop every queued chunk. Returns the number of bytes discarded.
    pub fn clear(&mut self) -> usize {
        let dropped = self.size;
        self.chunks.clear();
        self.size = 0;
        dropped
    }
}
