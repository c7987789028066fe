use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::diff::ProfileChanges;
use crate::reconcile::SyncOutcome;

/// What one pass did, as logged, printed and sent to subscribers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeReport<'a> {
    pub generated_at: DateTime<Utc>,
    pub source_url: &'a str,
    pub dry_run: bool,
    pub unidentified: usize,
    pub rejected: usize,
    pub changes: &'a ProfileChanges,
}

impl<'a> ChangeReport<'a> {
    pub fn new(source_url: &'a str, outcome: &'a SyncOutcome, dry_run: bool) -> Self {
        ChangeReport {
            generated_at: Utc::now(),
            source_url,
            dry_run,
            unidentified: outcome.unidentified,
            rejected: outcome.rejected,
            changes: &outcome.changes,
        }
    }

    pub fn summary(&self) -> String {
        summary(self.changes)
    }

    pub fn render(&self) -> String {
        let mut out = self.summary();
        if self.unidentified > 0 || self.rejected > 0 {
            out.push_str(&format!(
                " ({} without id, {} rejected)",
                self.unidentified, self.rejected
            ));
        }
        for line in change_lines(self.changes) {
            out.push('\n');
            out.push_str(&line);
        }
        out
    }
}

pub fn summary(changes: &ProfileChanges) -> String {
    format!(
        "{} inserted, {} updated, {} deleted",
        changes.inserted.len(),
        changes.updated.len(),
        changes.deleted.len()
    )
}

/// `+` inserted, `-` deleted, `~` one line per changed field.
pub fn change_lines(changes: &ProfileChanges) -> Vec<String> {
    let mut lines = Vec::new();
    for p in &changes.inserted {
        lines.push(format!("+ {} {}", p.profile_id, p.display_name()));
    }
    for p in &changes.deleted {
        lines.push(format!("- {} {}", p.profile_id, p.display_name()));
    }
    for u in &changes.updated {
        for c in &u.changed_fields {
            lines.push(format!(
                "~ {} {}: {} -> {}",
                u.profile.profile_id,
                c.field,
                quoted(c.old.as_deref()),
                quoted(c.new.as_deref())
            ));
        }
    }
    lines
}

fn quoted(v: Option<&str>) -> String {
    match v {
        Some(s) => format!("{:?}", s),
        None => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;
    use crate::profile::ProfileRecord;

    fn rec(id: u32, name: &str, job: &str) -> ProfileRecord {
        ProfileRecord {
            job_title: Some(job.to_string()),
            ..ProfileRecord::new(id, name)
        }
    }

    fn scenario() -> ProfileChanges {
        diff(
            &[rec(1, "A", "X"), rec(2, "B", "Y")],
            &[rec(1, "A", "OLD"), rec(3, "C", "Z")],
        )
    }

    #[test]
    fn renders_one_line_per_change() {
        let changes = scenario();
        assert_eq!(summary(&changes), "1 inserted, 1 updated, 1 deleted");
        assert_eq!(
            change_lines(&changes),
            ["+ 2 B", "- 3 C", "~ 1 jobTitle: \"OLD\" -> \"X\""]
        );
    }

    #[test]
    fn json_uses_camel_case_fields() {
        let outcome = SyncOutcome {
            changes: scenario(),
            unidentified: 2,
            rejected: 0,
        };
        let report = ChangeReport::new("https://news.sky.com/sky-news-profiles", &outcome, false);
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["unidentified"], 2);
        assert_eq!(v["changes"]["updated"][0]["changedFields"][0]["field"], "jobTitle");
        assert_eq!(v["changes"]["updated"][0]["changedFields"][0]["old"], "OLD");
        assert_eq!(v["changes"]["inserted"][0]["profileId"], 2);
        assert!(report.render().contains("(2 without id, 0 rejected)"));
    }
}
