//! Sliding-window conversation history.

use labchat_llm::Message;

/// Conversation history bounded to the most recent messages.
///
/// The full transcript is kept for display; only the last `window_size`
/// messages are handed to the model, so long sessions stay under the
/// context limit at the cost of the model forgetting older turns.
#[derive(Debug, Clone)]
pub struct SlidingWindowConversation {
    messages: Vec<Message>,
    window_size: usize,
}

impl SlidingWindowConversation {
    pub fn new(window_size: usize) -> Self {
        Self {
            messages: Vec::new(),
            window_size,
        }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// The messages the model sees: the most recent `window_size`.
    pub fn window(&self) -> Vec<Message> {
        let skip = self.messages.len().saturating_sub(self.window_size);
        self.messages[skip..].to_vec()
    }

    /// The full transcript, oldest first.
    pub fn transcript(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use labchat_llm::Role;

    #[test]
    fn test_window_returns_everything_when_short() {
        let mut convo = SlidingWindowConversation::new(10);
        convo.push_user("hi");
        convo.push_assistant("hello");

        assert_eq!(convo.window().len(), 2);
        assert_eq!(convo.transcript().len(), 2);
    }

    #[test]
    fn test_window_drops_oldest_messages() {
        let mut convo = SlidingWindowConversation::new(4);
        for i in 0..6 {
            convo.push_user(format!("question {}", i));
            convo.push_assistant(format!("answer {}", i));
        }

        let window = convo.window();
        assert_eq!(window.len(), 4);
        assert_eq!(window[0].content, "question 4");
        assert_eq!(window[3].content, "answer 5");

        // Full transcript is untouched
        assert_eq!(convo.len(), 12);
        assert_eq!(convo.transcript()[0].content, "question 0");
    }

    #[test]
    fn test_roles_alternate() {
        let mut convo = SlidingWindowConversation::new(10);
        convo.push_user("q");
        convo.push_assistant("a");

        let window = convo.window();
        assert_eq!(window[0].role, Role::User);
        assert_eq!(window[1].role, Role::Assistant);
    }
}
