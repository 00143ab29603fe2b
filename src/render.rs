//! HTML texts sent to the user.

use teloxide::utils::html::escape;

use crate::quiz::{AnswerRecord, Attempt, Question, QuizResult, TestStats, TestSummary};
use crate::sessions::QuestionView;

pub(crate) fn tests_list(tests: &[TestSummary]) -> String {
    let mut text = String::from("Choose a test to check your knowledge:\n");
    for test in tests {
        text.push_str(&format!(
            "\n• <b>{}</b>, {} questions, passing score {}%",
            escape(&test.title),
            test.question_count,
            test.passing_score
        ));
    }
    text
}

pub(crate) fn test_card(test: &TestSummary, stats: &TestStats) -> String {
    let mut text = format!("<b>{}</b>\n", escape(&test.title));
    if !test.description.is_empty() {
        text.push_str(&format!("\n{}\n", escape(&test.description)));
    }
    text.push_str(&format!(
        "\nThe test has {} questions.\nYou need at least {}% correct answers to pass.\n",
        test.question_count, test.passing_score
    ));
    if stats.total_attempts > 0 {
        text.push_str(&format!(
            "\nAttempts so far: {}, passed {:.0}%, average score {:.1}%.\n",
            stats.total_attempts, stats.passing_rate, stats.average_percentage
        ));
    }
    text.push_str("\nAre you ready to begin? (Yes/No)");
    text
}

pub(crate) fn question(view: &QuestionView) -> String {
    format!(
        "<b>Question {} of {}</b>\n\n{}",
        view.index + 1,
        view.total,
        escape(view.question.text())
    )
}

/// The answered question with the given answer marked and the explanation, if any.
pub(crate) fn feedback(index: usize, question: &Question, answer: &AnswerRecord) -> String {
    let selected = question
        .options()
        .get(answer.selected_option)
        .map(String::as_str)
        .unwrap_or_default();

    let mut text = format!(
        "<b>Question {}</b>\n\n{}\n\nYour answer: {}\n",
        index + 1,
        escape(question.text()),
        escape(selected)
    );
    if answer.is_correct {
        text.push_str("Answer is correct.✅");
    } else {
        let correct = &question.options()[question.correct_option()];
        text.push_str(&format!(
            "Answer is incorrect.❌ Correct answer: {}",
            escape(correct)
        ));
    }
    if let Some(explanation) = question.explanation() {
        text.push_str(&format!("\n\n<i>{}</i>", escape(explanation)));
    }
    text
}

pub(crate) fn result(title: &str, result: &QuizResult) -> String {
    let mut text = format!(
        "<b>Results of \"{}\"</b>\n\nCorrect answers: {} of {} ({:.1}%)\nPassing score: {}%\n\n",
        escape(title),
        result.score,
        result.max_score,
        result.percentage,
        result.passing_score
    );
    if result.passed {
        text.push_str("🎉 <b>Congratulations! You passed the test.</b>");
    } else {
        text.push_str("❌ <b>Unfortunately, the test is not passed.</b> Try again.");
    }
    text
}

pub(crate) fn history(attempts: &[Attempt]) -> String {
    if attempts.is_empty() {
        return "You haven't completed any tests yet.".to_owned();
    }

    let mut text = String::from("<b>Your latest results</b>\n");
    for attempt in attempts {
        text.push_str(&format!(
            "\n{} {} {}/{} ({:.1}%) {}",
            if attempt.result.passed { "✅" } else { "❌" },
            escape(&attempt.test_title),
            attempt.result.score,
            attempt.result.max_score,
            attempt.result.percentage,
            attempt.completed_at.format("%Y-%m-%d %H:%M")
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz_result(score: usize, passing_score: u8) -> QuizResult {
        let percentage = score as f64 * 20.0;
        QuizResult {
            score,
            max_score: 5,
            percentage,
            passing_score,
            passed: percentage >= f64::from(passing_score),
        }
    }

    #[test]
    fn result_shows_percentage_and_pass_line() {
        let text = result("Greens", &quiz_result(4, 80));
        assert!(text.contains("Correct answers: 4 of 5 (80.0%)"));
        assert!(text.contains("Passing score: 80%"));
        assert!(text.contains("You passed the test"));
    }

    #[test]
    fn failed_result_suggests_retry() {
        let text = result("Greens", &quiz_result(3, 70));
        assert!(text.contains("(60.0%)"));
        assert!(text.contains("Try again"));
    }

    #[test]
    fn feedback_shows_correct_option_and_explanation() {
        let question = Question::new(
            "Where are lemons displayed?",
            vec!["Exotic".into(), "Main showcase".into()],
            1,
            Some("Citrus belongs to the main showcase.".into()),
        )
        .unwrap();
        let answer = AnswerRecord {
            question_id: *question.uuid(),
            question_index: 0,
            selected_option: 0,
            is_correct: false,
        };

        let text = feedback(0, &question, &answer);
        assert!(text.contains("Your answer: Exotic"));
        assert!(text.contains("Correct answer: Main showcase"));
        assert!(text.contains("<i>Citrus belongs to the main showcase.</i>"));
    }

    #[test]
    fn titles_are_escaped() {
        let text = result("<Bar> & co", &quiz_result(5, 50));
        assert!(text.contains("&lt;Bar&gt; &amp; co"));
    }

    #[test]
    fn empty_history() {
        assert_eq!(history(&[]), "You haven't completed any tests yet.");
    }
}
