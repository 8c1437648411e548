use std::collections::VecDeque;

use crate::message::Message;

/// The number of recent messages kept by default.
pub const DEFAULT_SHORT_TERM_CAPACITY: usize = 10;

/// A sliding window over the most recent messages.
///
/// Appending beyond the capacity evicts the oldest messages first.
#[derive(Clone, Debug)]
pub struct ShortTermMemory {
    capacity: usize,
    messages: VecDeque<Message>,
}

impl ShortTermMemory {
    /// Creates an empty window holding at most `capacity` messages.
    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            messages: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Appends a message, evicting the oldest ones beyond the capacity.
    pub fn append(&mut self, message: Message) {
        self.messages.push_back(message);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// Iterates the messages from oldest to newest.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Copies the messages out, oldest first.
    #[inline]
    pub fn to_vec(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// Returns the number of messages held.
    #[inline]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if no message is held.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Removes all messages.
    #[inline]
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for ShortTermMemory {
    #[inline]
    fn default() -> Self {
        Self::with_capacity(DEFAULT_SHORT_TERM_CAPACITY)
    }
}

/// Returns the last [`DEFAULT_SHORT_TERM_CAPACITY`] messages, in their
/// original order.
pub fn prune(messages: &[Message]) -> Vec<Message> {
    let start = messages.len().saturating_sub(DEFAULT_SHORT_TERM_CAPACITY);
    messages[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Role;

    fn messages(count: usize) -> Vec<Message> {
        (0..count)
            .map(|i| Message::new(Role::User, format!("msg {i}"), i as u64))
            .collect()
    }

    #[test]
    fn test_prune() {
        for count in [0, 1, 9, 10] {
            let input = messages(count);
            assert_eq!(prune(&input), input);
        }

        for count in [11, 25] {
            let input = messages(count);
            let pruned = prune(&input);
            assert_eq!(pruned.len(), 10);
            assert_eq!(pruned, input[count - 10..]);
        }
    }

    #[test]
    fn test_append_evicts_oldest() {
        let mut memory = ShortTermMemory::default();
        for msg in messages(13) {
            memory.append(msg);
        }
        assert_eq!(memory.len(), 10);
        let contents: Vec<_> = memory.iter().map(Message::content).collect();
        assert_eq!(contents.first(), Some(&"msg 3"));
        assert_eq!(contents.last(), Some(&"msg 12"));
        assert_eq!(memory.to_vec(), prune(&messages(13)));
    }

    #[test]
    fn test_custom_capacity() {
        let mut memory = ShortTermMemory::with_capacity(2);
        for msg in messages(3) {
            memory.append(msg);
        }
        let contents: Vec<_> = memory.iter().map(Message::content).collect();
        assert_eq!(contents, ["msg 1", "msg 2"]);

        memory.clear();
        assert!(memory.is_empty());
    }
}
