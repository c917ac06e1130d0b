use crate::event_list::EventRecord;
use crate::run::Workflow;
use color_eyre::eyre::{Result, WrapErr};

pub fn parse_workflows(json: &str) -> Result<Vec<Workflow>> {
    let rows: Vec<Workflow> =
        serde_json::from_str(json).wrap_err("Failed to parse runs list response")?;
    Ok(rows)
}

pub fn parse_events(json: &str) -> Result<Vec<EventRecord>> {
    let events: Vec<EventRecord> =
        serde_json::from_str(json).wrap_err("Failed to parse events list response")?;
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::RunStatus;

    const SINGLE_WORKFLOW_JSON: &str = r#"[
        {
            "run_name": "fast-cat-1",
            "workflow_name": "train",
            "hub_user_name": "alice",
            "runner_name": "r-1234",
            "status": "running",
            "submitted_at": 1717236000000,
            "tag_name": "baseline",
            "variables": {"EPOCHS": "10"},
            "repo_url": "https://github.com/acme/ml"
        }
    ]"#;

    #[test]
    fn parse_single_workflow() {
        let rows = parse_workflows(SINGLE_WORKFLOW_JSON).unwrap();
        assert_eq!(rows.len(), 1);
        let w = &rows[0];
        assert_eq!(w.run_name, "fast-cat-1");
        assert_eq!(w.workflow_name.as_deref(), Some("train"));
        assert_eq!(w.hub_user_name, "alice");
        assert_eq!(w.status, RunStatus::Running);
        assert_eq!(w.submitted_at.timestamp_millis(), 1_717_236_000_000);
        assert_eq!(w.tag_name.as_deref(), Some("baseline"));
        assert_eq!(w.variables.get("EPOCHS").map(String::as_str), Some("10"));
    }

    #[test]
    fn optional_fields_default() {
        let json = r#"[{"run_name":"r","hub_user_name":"u","status":"done",
            "submitted_at":0,"variables":null}]"#;
        let rows = parse_workflows(json).unwrap();
        assert_eq!(rows[0].workflow_name, None);
        assert_eq!(rows[0].runner_name, "");
        assert!(rows[0].variables.is_empty());
        assert_eq!(rows[0].tag_name, None);
    }

    #[test]
    fn all_status_strings() {
        for status in RunStatus::ALL {
            let json = format!(
                r#"[{{"run_name":"r","hub_user_name":"u","status":"{status}","submitted_at":0}}]"#
            );
            let rows = parse_workflows(&json).unwrap();
            assert_eq!(rows[0].status, status, "status string: {status}");
        }
    }

    #[test]
    fn empty_page() {
        assert!(parse_workflows("[]").unwrap().is_empty());
        assert!(parse_events("[]").unwrap().is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = parse_workflows("{\"detail\": \"nope\"}").unwrap_err();
        assert!(format!("{err}").contains("runs list"));
    }

    #[test]
    fn parse_events_list() {
        let json = r#"[
            {"id": "2", "message": "Run stopped", "recorded_at": "2024-06-01T10:05:00Z",
             "targets": []},
            {"id": "1", "message": "Run submitted", "recorded_at": "2024-06-01T10:00:00Z",
             "actor_user": "alice",
             "targets": [{"type": "run", "name": "fast-cat-1"}]}
        ]"#;
        let events = parse_events(json).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].actor_user, None);
        assert_eq!(events[1].targets[0].project_name, None);
    }
}
