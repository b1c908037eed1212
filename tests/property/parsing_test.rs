// tests/property/parsing_test.rs

//! Property-based tests for private-message parsing and line classification.

use chatrelay::core::protocol::{InboundLine, PrivateMessage, PrivateMessageError};
use proptest::prelude::*;

/// Names that survive the `,` split and trimming unchanged.
fn recipient_name() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_]{1,12}"
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn test_well_formed_private_message_parses(
        recipients in prop::collection::vec(recipient_name(), 1..=6),
        body in "[^\\s](.{0,60}[^\\s])?",
        pad in " {0,3}",
    ) {
        let line = format!(">{pad}{}{pad}:{pad}{body}{pad}", recipients.join(&format!("{pad},{pad}")));
        let parsed = PrivateMessage::parse(&line).unwrap();
        prop_assert_eq!(parsed.recipients, recipients);
        prop_assert_eq!(parsed.body, body);
    }

    #[test]
    fn test_body_is_everything_after_first_colon(
        name in recipient_name(),
        body in "[a-z:]{1,30}",
    ) {
        let line = format!(">{name}:{body}");
        let parsed = PrivateMessage::parse(&line).unwrap();
        prop_assert_eq!(parsed.recipients, vec![name]);
        prop_assert_eq!(parsed.body, body);
    }

    #[test]
    fn test_missing_colon_is_rejected(rest in "[^:\\n]{0,80}") {
        let line = format!(">{rest}");
        prop_assert_eq!(
            PrivateMessage::parse(&line),
            Err(PrivateMessageError::MissingSeparator)
        );
    }

    #[test]
    fn test_leading_colon_is_rejected(rest in ".{0,80}") {
        let line = format!(">:{rest}");
        prop_assert_eq!(
            PrivateMessage::parse(&line),
            Err(PrivateMessageError::EmptyRecipients)
        );
    }

    #[test]
    fn test_lines_without_marker_are_chat(line in "[^>\\s][^\\n]{0,80}") {
        prop_assert_eq!(InboundLine::classify(&line), InboundLine::Chat(line.as_str()));
    }

    #[test]
    fn test_whitespace_lines_are_blank(line in "[ \\t]{0,20}") {
        prop_assert_eq!(InboundLine::classify(&line), InboundLine::Blank);
    }
}
