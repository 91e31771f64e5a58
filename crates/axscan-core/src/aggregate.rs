//! Merging of analysis results into one ranked view.

use chrono::Utc;

use crate::issue::{AnalysisResult, AnalysisType, Issue};

/// Merges every result's issues in input order and ranks them by severity.
///
/// The sort is stable, so issues of equal severity keep their relative
/// order. The summary is recomputed from the merged list. Analysis type and
/// target are kept when every input agrees on them; the timestamp is the
/// latest input timestamp. Re-aggregating the output returns it unchanged.
pub fn aggregate(results: &[AnalysisResult]) -> AnalysisResult {
    let Some(first) = results.first() else {
        return AnalysisResult::at(AnalysisType::Combined, Vec::new(), None, Utc::now());
    };

    let analysis_type = if results
        .iter()
        .all(|r| r.analysis_type() == first.analysis_type())
    {
        first.analysis_type()
    } else {
        AnalysisType::Combined
    };

    let target = first
        .target()
        .filter(|target| results.iter().all(|r| r.target() == Some(*target)))
        .cloned();

    let timestamp = results
        .iter()
        .map(AnalysisResult::timestamp)
        .max()
        .unwrap_or_else(Utc::now);

    let mut issues: Vec<Issue> = results
        .iter()
        .flat_map(|r| r.issues().iter().cloned())
        .collect();
    issues.sort_by_key(|issue| issue.severity().rank());

    AnalysisResult::at(analysis_type, issues, target, timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::issue::{IssueSource, Severity, Target};
    use chrono::TimeZone;

    fn issue(id: &str, severity: Severity) -> Issue {
        Issue::new(id, "rule", severity, IssueSource::Static)
    }

    fn ids(result: &AnalysisResult) -> Vec<&str> {
        result.issues().iter().map(Issue::id).collect()
    }

    #[test]
    fn empty_input_gives_empty_result() {
        let result = aggregate(&[]);

        assert!(result.is_empty());
        assert_eq!(result.summary().total, 0);
        assert_eq!(result.summary().critical, 0);
        assert_eq!(result.summary().minor, 0);
        assert_eq!(result.analysis_type(), AnalysisType::Combined);
    }

    #[test]
    fn single_result_is_ranked_and_recounted() {
        let input = AnalysisResult::new(
            AnalysisType::Static,
            vec![issue("a", Severity::Minor), issue("b", Severity::Critical)],
            Some(Target::Project("app".into())),
        );

        let result = aggregate(std::slice::from_ref(&input));

        assert_eq!(ids(&result), vec!["b", "a"]);
        assert_eq!(result.summary(), input.summary());
        assert_eq!(result.analysis_type(), AnalysisType::Static);
        assert_eq!(result.target(), input.target());
        assert_eq!(result.timestamp(), input.timestamp());
    }

    #[test]
    fn equal_severities_keep_insertion_order() {
        let first = AnalysisResult::new(
            AnalysisType::Static,
            vec![
                issue("s1", Severity::Serious),
                issue("m1", Severity::Moderate),
                issue("s2", Severity::Serious),
            ],
            None,
        );
        let second = AnalysisResult::new(
            AnalysisType::Static,
            vec![issue("m2", Severity::Moderate), issue("s3", Severity::Serious)],
            None,
        );

        let result = aggregate(&[first, second]);

        assert_eq!(ids(&result), vec!["s1", "s2", "s3", "m1", "m2"]);
    }

    #[test]
    fn mixed_inputs_are_combined() {
        let at = |hour| Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap();
        let first = AnalysisResult::at(
            AnalysisType::Static,
            vec![issue("a", Severity::Minor)],
            Some(Target::Project("app".into())),
            at(9),
        );
        let second = AnalysisResult::at(
            AnalysisType::Dynamic,
            vec![issue("b", Severity::Serious)],
            Some(Target::Url("http://localhost/".into())),
            at(11),
        );

        let result = aggregate(&[first, second]);

        assert_eq!(result.analysis_type(), AnalysisType::Combined);
        assert_eq!(result.target(), None);
        assert_eq!(result.timestamp(), at(11));
        assert_eq!(result.summary().total, 2);
        assert_eq!(result.summary().serious, 1);
        assert_eq!(result.summary().minor, 1);
    }

    #[test]
    fn aggregation_is_a_fixed_point() {
        let input = AnalysisResult::new(
            AnalysisType::Dynamic,
            vec![
                issue("a", Severity::Moderate),
                issue("b", Severity::Critical),
                issue("c", Severity::Moderate),
            ],
            Some(Target::Url("http://localhost/".into())),
        );

        let once = aggregate(&[input]);
        let twice = aggregate(std::slice::from_ref(&once));

        assert_eq!(once, twice);
    }
}
