//! Audit events and the `key=value` filter tokens that select them.
//!
//! Tokens are what the user types (or passes with `--event-filter`); the
//! [`EventListFilter`] built from them is what the events endpoint receives.
//! The mapping is lossless, so a filter can be turned back into tokens for
//! display.

use chrono::{DateTime, Utc};
use color_eyre::eyre::{bail, eyre, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EventTarget {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub project_name: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct EventRecord {
    pub id: String,
    pub message: String,
    pub recorded_at: DateTime<Utc>,
    #[serde(default)]
    pub actor_user: Option<String>,
    #[serde(default)]
    pub targets: Vec<EventTarget>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    TargetProjects,
    TargetUsers,
    TargetRuns,
    TargetFleets,
    Actors,
    IncludeTargetTypes,
    WithinProjects,
    WithinRuns,
}

impl FilterKey {
    /// Display and serialization order.
    pub const ALL: [FilterKey; 8] = [
        FilterKey::TargetProjects,
        FilterKey::TargetUsers,
        FilterKey::TargetRuns,
        FilterKey::TargetFleets,
        FilterKey::Actors,
        FilterKey::IncludeTargetTypes,
        FilterKey::WithinProjects,
        FilterKey::WithinRuns,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterKey::TargetProjects => "target_projects",
            FilterKey::TargetUsers => "target_users",
            FilterKey::TargetRuns => "target_runs",
            FilterKey::TargetFleets => "target_fleets",
            FilterKey::Actors => "actors",
            FilterKey::IncludeTargetTypes => "include_target_types",
            FilterKey::WithinProjects => "within_projects",
            FilterKey::WithinRuns => "within_runs",
        }
    }
}

impl FromStr for FilterKey {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        FilterKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| eyre!("unknown event filter key '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterToken {
    pub key: FilterKey,
    pub value: String,
}

impl FromStr for FilterToken {
    type Err = color_eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| eyre!("event filter '{s}' must look like key=value"))?;
        let key: FilterKey = key.trim().parse()?;
        let value = value.trim();
        if value.is_empty() {
            bail!("event filter '{}' has an empty value", key.as_str());
        }
        Ok(FilterToken {
            key,
            value: value.to_string(),
        })
    }
}

impl fmt::Display for FilterToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key.as_str(), self.value)
    }
}

/// Request body fragment for the events list. Empty lists are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct EventListFilter {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target_projects: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target_users: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target_runs: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub target_fleets: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_target_types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within_projects: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub within_runs: Option<Vec<String>>,
}

impl EventListFilter {
    pub fn from_tokens(tokens: &[FilterToken]) -> Result<Self> {
        let mut filter = EventListFilter::default();
        for token in tokens {
            let slot = filter.slot_mut(token.key);
            if !slot.contains(&token.value) {
                slot.push(token.value.clone());
            }
        }
        if filter.within_projects.is_some() && filter.within_runs.is_some() {
            bail!("within_projects and within_runs cannot be combined");
        }
        Ok(filter)
    }

    pub fn to_tokens(&self) -> Vec<FilterToken> {
        FilterKey::ALL
            .into_iter()
            .flat_map(|key| {
                self.slot(key).iter().map(move |value| FilterToken {
                    key,
                    value: value.clone(),
                })
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        FilterKey::ALL.into_iter().all(|k| self.slot(k).is_empty())
    }

    fn slot(&self, key: FilterKey) -> &[String] {
        match key {
            FilterKey::TargetProjects => &self.target_projects,
            FilterKey::TargetUsers => &self.target_users,
            FilterKey::TargetRuns => &self.target_runs,
            FilterKey::TargetFleets => &self.target_fleets,
            FilterKey::Actors => &self.actors,
            FilterKey::IncludeTargetTypes => &self.include_target_types,
            FilterKey::WithinProjects => self.within_projects.as_deref().unwrap_or_default(),
            FilterKey::WithinRuns => self.within_runs.as_deref().unwrap_or_default(),
        }
    }

    fn slot_mut(&mut self, key: FilterKey) -> &mut Vec<String> {
        match key {
            FilterKey::TargetProjects => &mut self.target_projects,
            FilterKey::TargetUsers => &mut self.target_users,
            FilterKey::TargetRuns => &mut self.target_runs,
            FilterKey::TargetFleets => &mut self.target_fleets,
            FilterKey::Actors => &mut self.actors,
            FilterKey::IncludeTargetTypes => &mut self.include_target_types,
            FilterKey::WithinProjects => self.within_projects.get_or_insert_with(Vec::new),
            FilterKey::WithinRuns => self.within_runs.get_or_insert_with(Vec::new),
        }
    }
}

impl fmt::Display for EventListFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self.to_tokens().iter().map(ToString::to_string).collect();
        f.write_str(&tokens.join(" "))
    }
}
