//! Flattening conversation history into chat messages under a character
//! budget.

use kupah_core::{ConversationHistory, Message};

/// Flattens each turn into at most two messages (user, then assistant) and
/// drops the oldest messages until the total content length fits
/// `max_chars`.
///
/// Trimming from the left preserves recency and role alternation without
/// reordering. A single over-budget message is dropped too, so the result
/// can be empty.
#[must_use]
pub fn history_to_messages(history: &ConversationHistory, max_chars: usize) -> Vec<Message> {
    let mut messages: Vec<Message> = Vec::new();
    for turn in &history.turns {
        if let Some(user_text) = turn.user_text.as_deref().filter(|t| !t.is_empty()) {
            messages.push(Message::user(user_text));
        }
        if let Some(assistant_text) = turn.assistant_text.as_deref().filter(|t| !t.is_empty()) {
            messages.push(Message::assistant(assistant_text));
        }
    }

    let mut total: usize = messages.iter().map(|m| m.content.chars().count()).sum();
    let mut start = 0;
    while start < messages.len() && total > max_chars {
        total -= messages[start].content.chars().count();
        start += 1;
    }

    messages.split_off(start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kupah_core::{Role, Turn};

    fn turn(user: &str, assistant: &str) -> Turn {
        Turn {
            user_text: Some(user.to_string()),
            assistant_text: Some(assistant.to_string()),
            citations: vec![],
        }
    }

    fn total_chars(messages: &[Message]) -> usize {
        messages.iter().map(|m| m.content.chars().count()).sum()
    }

    #[test]
    fn turns_flatten_in_user_assistant_order() {
        let history = ConversationHistory {
            turns: vec![turn("שאלה", "תשובה"), turn("עוד שאלה", "עוד תשובה")],
        };
        let messages = history_to_messages(&history, 10_000);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Message::user("שאלה"));
        assert_eq!(messages[1], Message::assistant("תשובה"));
        assert_eq!(messages[3], Message::assistant("עוד תשובה"));
    }

    #[test]
    fn oldest_messages_drop_first_until_under_budget() {
        let history = ConversationHistory {
            turns: vec![turn("aaaaa", "bbbbb"), turn("ccccc", "ddddd")],
        };
        // Budget of 12 keeps only the last two messages (5 + 5).
        let messages = history_to_messages(&history, 12);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::user("ccccc"));
        assert_eq!(messages[1], Message::assistant("ddddd"));
        assert!(total_chars(&messages) <= 12);
    }

    #[test]
    fn last_message_always_comes_from_most_recent_turn() {
        let history = ConversationHistory {
            turns: vec![turn("old", "older answer"), turn("new", "newest answer")],
        };
        let messages = history_to_messages(&history, 16);
        let last = messages.last().unwrap();
        assert_eq!(last.content, "newest answer");
    }

    #[test]
    fn oversized_single_message_leaves_history_empty() {
        let history = ConversationHistory {
            turns: vec![turn(&"x".repeat(100), "")],
        };
        let messages = history_to_messages(&history, 50);
        assert!(messages.is_empty());
    }

    #[test]
    fn partial_turns_flatten_without_placeholders() {
        let history = ConversationHistory {
            turns: vec![Turn {
                user_text: Some("רק שאלה".into()),
                assistant_text: None,
                citations: vec![],
            }],
        };
        let messages = history_to_messages(&history, 1_000);
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, Role::User);
    }

    #[test]
    fn budget_counts_characters_not_bytes() {
        // Ten Hebrew letters are twenty UTF-8 bytes but ten characters.
        let history = ConversationHistory {
            turns: vec![turn("אבגדהוזחטי", "")],
        };
        let messages = history_to_messages(&history, 10);
        assert_eq!(messages.len(), 1);
    }
}
