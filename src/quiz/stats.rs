use super::session::QuizResult;

/// Aggregate over archived attempts of one test.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestStats {
    pub total_attempts: usize,
    pub passed_attempts: usize,
    pub passing_rate: f64,
    pub average_percentage: f64,
    pub best_percentage: f64,
    pub worst_percentage: f64,
}

impl TestStats {
    /// All fields stay zero when there are no attempts.
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a QuizResult>) -> Self {
        let mut stats = Self::default();
        let mut sum = 0.0;

        for result in results {
            if stats.total_attempts == 0 {
                stats.best_percentage = result.percentage;
                stats.worst_percentage = result.percentage;
            } else {
                stats.best_percentage = stats.best_percentage.max(result.percentage);
                stats.worst_percentage = stats.worst_percentage.min(result.percentage);
            }
            stats.total_attempts += 1;
            if result.passed {
                stats.passed_attempts += 1;
            }
            sum += result.percentage;
        }

        if stats.total_attempts > 0 {
            let total = stats.total_attempts as f64;
            stats.passing_rate = stats.passed_attempts as f64 * 100.0 / total;
            stats.average_percentage = sum / total;
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(score: usize, passed: bool) -> QuizResult {
        QuizResult {
            score,
            max_score: 4,
            percentage: score as f64 * 25.0,
            passing_score: 75,
            passed,
        }
    }

    #[test]
    fn no_attempts_is_all_zero() {
        let results: Vec<QuizResult> = Vec::new();
        assert_eq!(TestStats::from_results(&results), TestStats::default());
    }

    #[test]
    fn aggregates_mixed_attempts() {
        let results = [result(4, true), result(1, false), result(3, true), result(2, false)];
        let stats = TestStats::from_results(&results);

        assert_eq!(stats.total_attempts, 4);
        assert_eq!(stats.passed_attempts, 2);
        assert_eq!(stats.passing_rate, 50.0);
        assert_eq!(stats.average_percentage, 62.5);
        assert_eq!(stats.best_percentage, 100.0);
        assert_eq!(stats.worst_percentage, 25.0);
    }
}
