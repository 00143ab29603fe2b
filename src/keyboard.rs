use std::fmt;

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};
use uuid::Uuid;

use crate::quiz::TestSummary;
use crate::sessions::QuestionView;

pub const TAKE_TEST: &str = "Take a test📝";
pub const MY_RESULTS: &str = "My results📊";

/// Payload of an inline button. Telegram caps it at 64 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackData {
    Select {
        test_id: Uuid,
    },
    Answer {
        test_id: Uuid,
        question: usize,
        option: usize,
    },
}

impl fmt::Display for CallbackData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackData::Select { test_id } => write!(f, "t:{}", test_id.simple()),
            CallbackData::Answer {
                test_id,
                question,
                option,
            } => write!(f, "a:{}:{}:{}", test_id.simple(), question, option),
        }
    }
}

impl CallbackData {
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.split(':');
        let data = match (parts.next()?, parts.next()?) {
            ("t", id) => CallbackData::Select {
                test_id: Uuid::parse_str(id).ok()?,
            },
            ("a", id) => CallbackData::Answer {
                test_id: Uuid::parse_str(id).ok()?,
                question: parts.next()?.parse().ok()?,
                option: parts.next()?.parse().ok()?,
            },
            _ => return None,
        };

        if parts.next().is_some() {
            return None;
        }
        Some(data)
    }
}

pub(crate) fn yes_no_keyboard() -> KeyboardMarkup {
    let keyboard: Vec<Vec<KeyboardButton>> = vec![vec![
        KeyboardButton::new("Yes✔️"),
        KeyboardButton::new("No❌"),
    ]];

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn action_keyboard() -> KeyboardMarkup {
    let keyboard = vec![
        vec![KeyboardButton::new(TAKE_TEST)],
        vec![KeyboardButton::new(MY_RESULTS)],
    ];

    KeyboardMarkup::new(keyboard)
}

pub(crate) fn tests_keyboard(tests: &[TestSummary]) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = tests
        .iter()
        .map(|test| {
            vec![InlineKeyboardButton::callback(
                format!("{} ({})", test.title, test.question_count),
                CallbackData::Select { test_id: test.uuid }.to_string(),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}

pub(crate) fn answers_keyboard(test_id: Uuid, view: &QuestionView) -> InlineKeyboardMarkup {
    let keyboard: Vec<Vec<InlineKeyboardButton>> = view
        .question
        .options()
        .iter()
        .enumerate()
        .map(|(option, text)| {
            vec![InlineKeyboardButton::callback(
                text.clone(),
                CallbackData::Answer {
                    test_id,
                    question: view.index,
                    option,
                }
                .to_string(),
            )]
        })
        .collect();

    InlineKeyboardMarkup::new(keyboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::Question;

    #[test]
    fn answer_data_parses_back() {
        let data = CallbackData::Answer {
            test_id: Uuid::new_v4(),
            question: 4,
            option: 2,
        };
        let encoded = data.to_string();

        assert!(encoded.len() <= 64);
        assert_eq!(CallbackData::parse(&encoded), Some(data));
    }

    #[test]
    fn malformed_data_is_rejected() {
        let id = Uuid::new_v4().simple().to_string();
        assert_eq!(CallbackData::parse(""), None);
        assert_eq!(CallbackData::parse("t:not-a-uuid"), None);
        assert_eq!(CallbackData::parse(&format!("a:{id}:1")), None);
        assert_eq!(CallbackData::parse(&format!("a:{id}:1:-1")), None);
        assert_eq!(CallbackData::parse(&format!("t:{id}:extra")), None);
        assert_eq!(CallbackData::parse(&format!("x:{id}")), None);
    }

    #[test]
    fn answers_keyboard_has_one_row_per_option() {
        let question = Question::new(
            "Where do walnuts go?",
            vec!["Bar".into(), "Nuts and dried fruit".into(), "Greens".into()],
            1,
            None,
        )
        .unwrap();
        let view = QuestionView {
            index: 3,
            total: 5,
            question,
        };
        let test_id = Uuid::new_v4();

        let markup = answers_keyboard(test_id, &view);
        assert_eq!(markup.inline_keyboard.len(), 3);
        assert_eq!(markup.inline_keyboard[1][0].text, "Nuts and dried fruit");
    }
}
