//! Step log of a `meeting-agent` run.
//!
//! Every run produces one [`Trajectory`]: the request as step 0, one step
//! per tool call, and a final step with the summary or the error. With
//! `--trajectory-out` the trajectory is appended to a file as a single JSON
//! line.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ClientResult;

/// Action recorded for the request step.
pub const ACTION_USER_QUERY: &str = "user query";
/// Action recorded for each tool invocation.
pub const ACTION_TOOL_CALL: &str = "tool call";
/// Action recorded for the final summary.
pub const ACTION_FINAL_ANSWER: &str = "final answer";
/// Action recorded when the run stopped on an error.
pub const ACTION_ERROR: &str = "error";

/// A single entry of the trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryStep {
    pub step_number: u32,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_args: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl TrajectoryStep {
    fn message(step_number: u32, action: &str, message: impl Into<String>) -> Self {
        Self {
            step_number,
            action: action.to_string(),
            tool_name: None,
            tool_args: None,
            tool_result: None,
            message: Some(message.into()),
        }
    }
}

/// The ordered steps of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub user_query: String,
    pub steps: Vec<TrajectoryStep>,
    pub total_steps: u32,
    pub final_answer: Option<String>,
}

impl Trajectory {
    /// Starts a trajectory with the request as step 0.
    pub fn new(user_query: impl Into<String>) -> Self {
        let user_query = user_query.into();
        Self {
            steps: vec![TrajectoryStep::message(
                0,
                ACTION_USER_QUERY,
                user_query.clone(),
            )],
            user_query,
            total_steps: 0,
            final_answer: None,
        }
    }

    fn next_step(&self) -> u32 {
        self.steps.last().map_or(0, |s| s.step_number + 1)
    }

    /// Records a tool invocation. Errors are stored as `{"error": ...}`.
    pub fn record_tool(&mut self, tool_name: &str, tool_args: Value, result: Result<Value, String>) {
        let tool_result = match result {
            Ok(value) => value,
            Err(message) => json!({ "error": message }),
        };
        let step_number = self.next_step();
        self.steps.push(TrajectoryStep {
            step_number,
            action: ACTION_TOOL_CALL.to_string(),
            tool_name: Some(tool_name.to_string()),
            tool_args: Some(tool_args),
            tool_result: Some(tool_result),
            message: None,
        });
        self.total_steps = step_number;
    }

    /// Closes the trajectory with a summary.
    pub fn finish(&mut self, answer: impl Into<String>) {
        let answer = answer.into();
        let step_number = self.next_step();
        self.steps
            .push(TrajectoryStep::message(step_number, ACTION_FINAL_ANSWER, answer.clone()));
        self.total_steps = step_number;
        self.final_answer = Some(answer);
    }

    /// Closes the trajectory after a failed step.
    pub fn fail(&mut self, error: impl Into<String>) {
        let step_number = self.next_step();
        self.steps
            .push(TrajectoryStep::message(step_number, ACTION_ERROR, error));
        self.total_steps = step_number;
    }

    /// Returns true when the run ended with a summary.
    pub fn is_complete(&self) -> bool {
        self.final_answer.is_some()
    }

    /// Appends the trajectory to `path` as one JSON line.
    pub fn append_to(&self, path: &Path) -> ClientResult<()> {
        let line = serde_json::to_string(self)?;
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}
