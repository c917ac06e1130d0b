//! Workflow rows of the runs list and the pure helpers that search, tag-filter
//! and group them.

use crate::status::RunStatus;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// One workflow of a run, as returned by the runs list endpoint.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Workflow {
    pub run_name: String,
    #[serde(default)]
    pub workflow_name: Option<String>,
    pub hub_user_name: String,
    #[serde(default)]
    pub runner_name: String,
    pub status: RunStatus,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub tag_name: Option<String>,
    /// Absent and `null` both decode to an empty map.
    #[serde(default, deserialize_with = "nullable_map")]
    pub variables: BTreeMap<String, String>,
    #[serde(default)]
    pub repo_url: Option<String>,
}

fn nullable_map<'de, D>(de: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let map: Option<BTreeMap<String, String>> = serde::Deserialize::deserialize(de)?;
    Ok(map.unwrap_or_default())
}

impl Workflow {
    pub fn full_name(&self) -> FullName {
        FullName {
            user: self.hub_user_name.clone(),
            run: self.run_name.clone(),
            workflow: self.workflow_name.clone(),
        }
    }
}

/// Case-insensitive substring match over name, runner, workflow, tag and
/// variables. An empty (or all-whitespace) query matches every row.
pub fn matches_search(row: &Workflow, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let hit = |s: &str| s.to_lowercase().contains(&needle);

    hit(&row.run_name)
        || hit(&row.runner_name)
        || row.workflow_name.as_deref().is_some_and(hit)
        || row.tag_name.as_deref().is_some_and(hit)
        || row.variables.iter().any(|(k, v)| hit(k) || hit(v))
}

pub fn has_tag(row: &Workflow, tag: &str) -> bool {
    row.tag_name.as_deref() == Some(tag)
}

/// Client-side filter applied on top of whatever the loader has accumulated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub search: String,
    pub tag: Option<String>,
}

impl RowFilter {
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.tag.is_none()
    }

    pub fn matches(&self, row: &Workflow) -> bool {
        matches_search(row, &self.search)
            && self.tag.as_deref().is_none_or(|t| has_tag(row, t))
    }
}

pub fn filter_rows<'a>(rows: &'a [Workflow], filter: &RowFilter) -> Vec<&'a Workflow> {
    rows.iter().filter(|r| filter.matches(r)).collect()
}

/// Distinct tag names in first-seen order.
pub fn distinct_tags(rows: &[Workflow]) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in rows.iter().filter_map(|r| r.tag_name.as_ref()) {
        if !tags.contains(tag) {
            tags.push(tag.clone());
        }
    }
    tags
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunGroup<'a> {
    pub run_name: String,
    pub workflows: Vec<&'a Workflow>,
}

impl RunGroup<'_> {
    /// Status of the most recently submitted workflow; ties keep the first one.
    pub fn status(&self) -> RunStatus {
        self.workflows
            .iter()
            .copied()
            .fold(None::<&Workflow>, |best, w| match best {
                Some(b) if b.submitted_at >= w.submitted_at => Some(b),
                _ => Some(w),
            })
            .map_or(RunStatus::Unknown, |w| w.status)
    }
}

/// Groups rows by run name. Group order and the order of rows inside each
/// group both follow first appearance in `rows`.
pub fn group_by_run<'a, I>(rows: I) -> Vec<RunGroup<'a>>
where
    I: IntoIterator<Item = &'a Workflow>,
{
    let mut groups: Vec<RunGroup<'a>> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();
    for row in rows {
        if let Some(&i) = index.get(row.run_name.as_str()) {
            groups[i].workflows.push(row);
        } else {
            index.insert(row.run_name.as_str(), groups.len());
            groups.push(RunGroup {
                run_name: row.run_name.clone(),
                workflows: vec![row],
            });
        }
    }
    groups
}

/// `user/run/workflow` composite key. The workflow segment is optional.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FullName {
    pub user: String,
    pub run: String,
    pub workflow: Option<String>,
}

impl FullName {
    pub fn compose(user: &str, run: &str, workflow: Option<&str>) -> String {
        match workflow {
            Some(w) => [user, run, w].join("/"),
            None => [user, run].join("/"),
        }
    }

    pub fn parse(s: &str) -> Option<FullName> {
        let parts: Vec<&str> = s.split('/').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        match parts.as_slice() {
            [user, run] => Some(FullName {
                user: (*user).to_string(),
                run: (*run).to_string(),
                workflow: None,
            }),
            [user, run, workflow] => Some(FullName {
                user: (*user).to_string(),
                run: (*run).to_string(),
                workflow: Some((*workflow).to_string()),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&FullName::compose(
            &self.user,
            &self.run,
            self.workflow.as_deref(),
        ))
    }
}

/// Format a duration in seconds into a human-readable string (e.g. "2m 5s").
pub fn format_duration(secs: i64) -> String {
    let secs = secs.max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86_400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86_400, (secs % 86_400) / 3600)
    }
}

/// Time since submission, relative to `now`.
pub fn format_age(submitted_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    format_duration(now.signed_duration_since(submitted_at).num_seconds())
}
