//! The two paginated resources the dashboard loads: workflow runs of a project
//! and audit events.

use super::client::ApiClient;
use super::parser;
use crate::event_list::{EventListFilter, EventRecord};
use crate::loader::{PageRequest, PageSource};
use crate::run::Workflow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;

/// Server-side selection of the runs list. The project is part of the URL,
/// not the body, but still identifies the list.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RunListFilter {
    #[serde(skip)]
    pub project: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    pub only_active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RunCursor {
    pub prev_submitted_at: i64,
    pub prev_run_name: String,
}

pub struct RunsSource {
    client: ApiClient,
}

impl RunsSource {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub fn path(project: &str) -> String {
        format!("/api/project/{project}/runs/list")
    }
}

#[async_trait]
impl PageSource for RunsSource {
    type Item = Workflow;
    type Filter = RunListFilter;
    type Cursor = RunCursor;

    async fn fetch_page(
        &self,
        request: PageRequest<RunListFilter, RunCursor>,
    ) -> Result<Vec<Workflow>> {
        let json = self
            .client
            .post(&Self::path(&request.filter.project), &request)
            .await?;
        parser::parse_workflows(&json)
    }

    fn cursor_after(&self, last: &Workflow) -> RunCursor {
        run_cursor(last)
    }
}

pub fn run_cursor(last: &Workflow) -> RunCursor {
    RunCursor {
        prev_submitted_at: last.submitted_at.timestamp_millis(),
        prev_run_name: last.run_name.clone(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct EventCursor {
    pub prev_recorded_at: DateTime<Utc>,
    pub prev_id: String,
}

pub struct EventsSource {
    client: ApiClient,
}

impl EventsSource {
    pub const PATH: &'static str = "/api/events/list";

    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for EventsSource {
    type Item = EventRecord;
    type Filter = EventListFilter;
    type Cursor = EventCursor;

    async fn fetch_page(
        &self,
        request: PageRequest<EventListFilter, EventCursor>,
    ) -> Result<Vec<EventRecord>> {
        let json = self.client.post(Self::PATH, &request).await?;
        parser::parse_events(&json)
    }

    fn cursor_after(&self, last: &EventRecord) -> EventCursor {
        event_cursor(last)
    }
}

pub fn event_cursor(last: &EventRecord) -> EventCursor {
    EventCursor {
        prev_recorded_at: last.recorded_at,
        prev_id: last.id.clone(),
    }
}
