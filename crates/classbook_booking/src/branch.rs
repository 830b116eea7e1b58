// --- File: crates/classbook_booking/src/branch.rs ---
//! Physical locations and their weekly closures.

use chrono::{Datelike, NaiveDate, Weekday};
use classbook_config::BranchConfig;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::settings::SettingsError;

/// Name of a configured branch.
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(String);

impl BranchId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for BranchId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    id: BranchId,
    closed_days: Vec<Weekday>,
}

impl Branch {
    pub fn new(name: impl Into<String>, closed_days: impl IntoIterator<Item = Weekday>) -> Self {
        let mut closed_days: Vec<Weekday> = closed_days.into_iter().collect();
        closed_days.sort_by_key(|d| d.num_days_from_monday());
        closed_days.dedup();
        Self {
            id: BranchId(name.into()),
            closed_days,
        }
    }

    pub fn id(&self) -> &BranchId {
        &self.id
    }

    pub fn closed_days(&self) -> &[Weekday] {
        &self.closed_days
    }

    pub fn is_closed_on(&self, date: NaiveDate) -> bool {
        self.closed_days.contains(&date.weekday())
    }
}

/// The closed set of branches known to the center.
#[derive(Debug, Clone, Default)]
pub struct BranchDirectory {
    branches: Vec<Branch>,
}

impl BranchDirectory {
    pub fn new(branches: Vec<Branch>) -> Self {
        Self { branches }
    }

    pub fn from_config(configs: &[BranchConfig]) -> Result<Self, SettingsError> {
        if configs.is_empty() {
            return Err(SettingsError::NoBranches);
        }
        let mut branches: Vec<Branch> = Vec::with_capacity(configs.len());
        for config in configs {
            let name = config.name.trim();
            if name.is_empty() {
                return Err(SettingsError::InvalidBranch(
                    "branch name must not be empty".to_string(),
                ));
            }
            if branches.iter().any(|b| b.id.as_str() == name) {
                return Err(SettingsError::InvalidBranch(format!(
                    "branch {name} is configured twice"
                )));
            }
            let closed_days = config
                .closed_days
                .iter()
                .map(|day| {
                    day.parse::<Weekday>().map_err(|_| {
                        SettingsError::InvalidBranch(format!(
                            "branch {name}: unknown weekday {day:?}"
                        ))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            branches.push(Branch::new(name, closed_days));
        }
        Ok(Self { branches })
    }

    /// Looks a branch up by name, ignoring surrounding whitespace.
    pub fn get(&self, name: &str) -> Option<&Branch> {
        let name = name.trim();
        self.branches.iter().find(|b| b.id.as_str() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Branch> {
        self.branches.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.branches.iter().map(|b| b.id.as_str()).collect()
    }
}
