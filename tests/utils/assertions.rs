//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use canvas_relay::{DrawEvent, Message};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    participants: Vec<String>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for every currently connected participant
    pub async fn for_all_participants(setup: &'a TestSetup) -> MessageAssertion<'a> {
        let participants = setup.participant_names().await;
        Self {
            setup,
            participants,
        }
    }

    /// Create an assertion for specific participants
    pub fn for_participants(setup: &'a TestSetup, participants: Vec<&str>) -> Self {
        Self {
            setup,
            participants: participants.into_iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Assert that each participant received exactly one message, of the given
    /// type, and that they all received the same one (consumes the messages)
    pub async fn received_message_type(self, expected_type: &str) -> MessageContent {
        let mut messages = vec![];

        for name in &self.participants {
            let received = self.setup.drain(name).await;
            assert_eq!(
                received.len(),
                1,
                "{} should have received exactly one message, got {:?}",
                name,
                received
            );
            assert_eq!(
                received[0].kind(),
                expected_type,
                "{} received wrong message type",
                name
            );
            messages.extend(received);
        }

        for (i, msg) in messages.iter().enumerate().skip(1) {
            assert_eq!(
                msg, &messages[0],
                "{} payload differs from {}",
                self.participants[i], self.participants[0]
            );
        }

        MessageContent {
            message: messages.into_iter().next().expect("no participants to check"),
        }
    }

    /// Assert that participants received the given sequence of message types in order
    pub async fn received_message_sequence(self, expected_types: Vec<&str>) -> Vec<Message> {
        let mut first = vec![];

        for name in &self.participants {
            let received = self.setup.drain(name).await;
            let kinds: Vec<&str> = received.iter().map(Message::kind).collect();
            assert_eq!(kinds, expected_types, "{} received wrong sequence", name);

            if first.is_empty() {
                first = received;
            }
        }

        first
    }

    /// Assert that participants received no messages
    pub async fn received_no_messages(self) {
        for name in &self.participants {
            let received = self.setup.drain(name).await;
            assert!(
                received.is_empty(),
                "{} should not have received any messages, got {:?}",
                name,
                received
            );
        }
    }
}

// ============================================================================
// Message Content Assertions
// ============================================================================

pub struct MessageContent {
    pub message: Message,
}

impl MessageContent {
    /// Assert the message is a draw of exactly `expected`
    pub fn with_draw(self, expected: &DrawEvent) -> Self {
        match &self.message {
            Message::Draw { data } => assert_eq!(data, expected),
            other => panic!("Expected draw, got {:?}", other),
        }
        self
    }

    /// Assert the draw carries the given originator id
    pub fn from_client(self, expected_client_id: &str) -> Self {
        match &self.message {
            Message::Draw { data } => assert_eq!(data.client_id(), Some(expected_client_id)),
            other => panic!("Expected draw, got {:?}", other),
        }
        self
    }

    pub fn with_count(self, expected: usize) -> Self {
        assert_eq!(self.message, Message::user_count(expected));
        self
    }

    pub fn with_history(self, expected: &[DrawEvent]) -> Self {
        assert_eq!(self.message, Message::history(expected.to_vec()));
        self
    }
}
