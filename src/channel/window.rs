//! Sliding chunk window for completion-pattern matching.
//!
//! Matching the completion pattern against the full accumulated output is
//! correct but rescans already-confirmed-incomplete text on every poll;
//! matching only the newest chunk misses a pattern split across reads.
//! The compromise is a fixed window over the last three chunks: matching
//! cost stays bounded while a pattern split across two read boundaries is
//! still caught. A pattern split across more than three reads will be
//! missed - an accepted limitation, since widening the window changes the
//! matching cost profile.

use std::collections::VecDeque;

use regex::Regex;

/// Number of trailing chunks the completion pattern is matched against.
pub const WINDOW_CHUNKS: usize = 3;

/// Fixed-size window over the most recent read chunks.
#[derive(Debug)]
pub struct ChunkWindow {
    chunks: VecDeque<String>,
    capacity: usize,
}

impl ChunkWindow {
    /// Create a window retaining the last `capacity` chunks.
    pub fn new(capacity: usize) -> Self {
        Self {
            chunks: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append a chunk, evicting the oldest when over capacity.
    pub fn push(&mut self, chunk: String) {
        if self.chunks.len() == self.capacity {
            self.chunks.pop_front();
        }
        self.chunks.push_back(chunk);
    }

    /// Concatenation of the retained chunks.
    pub fn tail(&self) -> String {
        self.chunks.iter().map(String::as_str).collect()
    }

    /// Check the pattern against the retained tail.
    pub fn is_match(&self, pattern: &Regex) -> bool {
        pattern.is_match(&self.tail())
    }

    /// Drop all retained chunks.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}

impl Default for ChunkWindow {
    fn default() -> Self {
        Self::new(WINDOW_CHUNKS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_pattern_split_across_two_chunks() {
        let mut window = ChunkWindow::default();
        window.push("output Rou".to_string());
        window.push("ter#".to_string());

        let pattern = Regex::new(r"Router#").unwrap();
        assert!(window.is_match(&pattern));
    }

    #[test]
    fn old_chunks_fall_out_of_the_window() {
        let mut window = ChunkWindow::default();
        window.push("Router#".to_string());
        window.push("a".to_string());
        window.push("b".to_string());
        window.push("c".to_string());

        let pattern = Regex::new(r"Router#").unwrap();
        assert!(!window.is_match(&pattern));
        assert_eq!(window.tail(), "abc");
    }

    #[test]
    fn pattern_split_across_more_than_window_is_missed() {
        // Documented limitation: four single-character reads defeat the
        // three-chunk window.
        let mut window = ChunkWindow::default();
        for piece in ["R", "o", "u", "t"] {
            window.push(piece.to_string());
        }
        let pattern = Regex::new(r"Rout").unwrap();
        assert!(!window.is_match(&pattern));
    }
}
