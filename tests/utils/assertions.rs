//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use jukebox::{EventTag, WebSocketMessage};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    members: Vec<String>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for every member in the setup
    pub fn for_all_members(setup: &'a TestSetup) -> Self {
        let mut members: Vec<String> = setup.members.keys().cloned().collect();
        members.sort();
        Self { setup, members }
    }

    /// Create an assertion for specific members
    pub fn for_members(setup: &'a TestSetup, members: Vec<&str>) -> Self {
        Self {
            setup,
            members: members.into_iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Assert the next message each member received has the given tag
    /// (consumes it) and that all of them saw the same payload
    pub async fn received(self, expected: EventTag) -> serde_json::Value {
        let mut payloads = Vec::new();

        for name in &self.members {
            let message = self.next_message(name).await;
            let message = message.unwrap_or_else(|| panic!("{name} should have received {expected}"));
            assert_eq!(
                message.tag(),
                Some(expected),
                "{name} received {} instead of {expected}",
                message.event
            );
            payloads.push(message.payload);
        }

        for (i, payload) in payloads.iter().enumerate().skip(1) {
            assert_eq!(
                payload, &payloads[0],
                "{} payload differs from {}",
                self.members[i], self.members[0]
            );
        }

        payloads.into_iter().next().unwrap_or(serde_json::Value::Null)
    }

    /// Assert the members' remaining messages are exactly these tags, in order
    pub async fn received_sequence(self, expected: &[EventTag]) {
        for name in &self.members {
            let mut tags = Vec::new();
            while let Some(message) = self.next_message(name).await {
                tags.push(message.event);
            }
            let expected: Vec<String> = expected.iter().map(|t| t.to_string()).collect();
            assert_eq!(tags, expected, "unexpected message sequence for {name}");
        }
    }

    /// Assert members received nothing
    pub async fn received_no_messages(self) {
        for name in &self.members {
            let message = self.next_message(name).await;
            assert!(
                message.is_none(),
                "{name} should not have received anything, got {:?}",
                message.map(|m| m.event)
            );
        }
    }

    async fn next_message(&self, name: &str) -> Option<WebSocketMessage> {
        self.setup.member(name).inbox.lock().await.try_recv().ok()
    }
}
