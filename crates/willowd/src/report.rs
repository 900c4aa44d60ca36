//! Assessment report composition.
//!
//! Turns category scores and reflex findings into the parent-facing summary
//! and its recommended actions. Wording stays plain: no raw technical detail
//! ever reaches this surface.

use willow_common::{CategoryScore, ReflexFinding, Severity};

/// The assembled end-of-assessment report
#[derive(Debug, Clone)]
pub struct AssessmentReport {
    pub category_scores: Vec<CategoryScore>,
    pub findings: Vec<ReflexFinding>,
    pub summary: String,
    pub recommendations: Vec<String>,
}

/// Recommended action for a severity band
fn action_for(severity: Severity) -> &'static str {
    match severity {
        Severity::High => {
            "We recommend booking a consultation and starting a daily integration exercise routine."
        }
        Severity::Moderate => {
            "Targeted activities a few times a week should help; we can suggest a program."
        }
        Severity::Mild => "Worth keeping an eye on; re-screen in a few months.",
    }
}

/// Compose the report from a finished scoring pass
pub fn compose(category_scores: Vec<CategoryScore>, findings: Vec<ReflexFinding>) -> AssessmentReport {
    let mut lines = Vec::new();

    lines.push("Here is what your answers show:".to_string());
    for score in &category_scores {
        lines.push(format!(
            "- {}: {}%",
            capitalize(score.category.display_name()),
            score.percentage
        ));
        for concern in &score.concerns {
            lines.push(format!("  Needs attention: {}", concern));
        }
        for strength in &score.strengths {
            lines.push(format!("  Strength: {}", strength));
        }
    }

    if findings.is_empty() {
        lines.push("No retained-reflex patterns stood out from these answers.".to_string());
    } else {
        lines.push("Patterns that stood out:".to_string());
        for finding in &findings {
            lines.push(format!(
                "- {} ({}% of related answers, {} priority)",
                finding.label, finding.retention_percentage, finding.severity
            ));
        }
    }

    let mut recommendations: Vec<String> = Vec::new();
    for finding in &findings {
        let action = format!("{}: {}", finding.label, action_for(finding.severity));
        if !recommendations.contains(&action) {
            recommendations.push(action);
        }
    }
    if recommendations.is_empty() {
        recommendations
            .push("Keep encouraging everyday play and re-screen if anything changes.".to_string());
    }

    let summary = lines.join("\n");
    AssessmentReport {
        category_scores,
        findings,
        summary,
        recommendations,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use willow_common::ConcernCategory;

    fn score(percentage: u8) -> CategoryScore {
        CategoryScore {
            category: ConcernCategory::Communication,
            raw_score: percentage as f64 / 10.0,
            max_score: 10.0,
            percentage,
            concerns: vec![],
            strengths: vec![],
        }
    }

    fn finding(pct: u8) -> ReflexFinding {
        ReflexFinding {
            label: "Moro reflex".to_string(),
            retention_percentage: pct,
            contributing_indicators: vec![],
            severity: Severity::from_percentage(pct),
        }
    }

    #[test]
    fn test_summary_mentions_percentages() {
        let report = compose(vec![score(60)], vec![finding(80)]);
        assert!(report.summary.contains("Communication: 60%"));
        assert!(report.summary.contains("Moro reflex (80%"));
    }

    #[test]
    fn test_high_severity_recommendation() {
        let report = compose(vec![], vec![finding(90)]);
        assert!(report.recommendations[0].contains("consultation"));
    }

    #[test]
    fn test_no_findings_has_gentle_default() {
        let report = compose(vec![score(85)], vec![]);
        assert!(report.summary.contains("No retained-reflex patterns"));
        assert_eq!(report.recommendations.len(), 1);
    }

    #[test]
    fn test_no_duplicate_recommendations() {
        let report = compose(vec![], vec![finding(90), finding(95)]);
        assert_eq!(report.recommendations.len(), 1);
    }
}
