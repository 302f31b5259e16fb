//! DMAIC phase agents.
//!
//! An agent is a named capability bound to one DMAIC phase. Agents are plain
//! data: whether a capability runs is decided by its enabled state, and a
//! disabled agent produces [`AgentOutcome::Unavailable`] instead of an error.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The five phases of a DMAIC improvement cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmaicPhase {
    Define,
    Measure,
    Analyze,
    Improve,
    Control,
}

impl DmaicPhase {
    pub const ALL: [Self; 5] = [
        Self::Define,
        Self::Measure,
        Self::Analyze,
        Self::Improve,
        Self::Control,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Define => "define",
            Self::Measure => "measure",
            Self::Analyze => "analyze",
            Self::Improve => "improve",
            Self::Control => "control",
        }
    }

    /// Capability name of the built-in agent for this phase.
    pub const fn default_capability(&self) -> &'static str {
        match self {
            Self::Define => "problem-definition",
            Self::Measure => "file-stability",
            Self::Analyze => "convergence-scoring",
            Self::Improve => "improvement-proposals",
            Self::Control => "change-detection",
        }
    }
}

impl fmt::Display for DmaicPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an agent will run when invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Enabled,
    Disabled,
}

/// Agent entry as it appears in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub phase: DmaicPhase,
    pub capability: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

/// Default roster: the measuring, analyzing and controlling phases are
/// backed by the tracker; defining and improving are left to humans.
pub fn default_roster() -> Vec<AgentConfig> {
    DmaicPhase::ALL
        .iter()
        .map(|phase| AgentConfig {
            phase: *phase,
            capability: phase.default_capability().to_string(),
            enabled: matches!(
                phase,
                DmaicPhase::Measure | DmaicPhase::Analyze | DmaicPhase::Control
            ),
        })
        .collect()
}

/// A capability bound to a DMAIC phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub phase: DmaicPhase,
    pub capability: String,
    pub state: AgentState,
}

impl Agent {
    pub fn enabled(phase: DmaicPhase, capability: impl Into<String>) -> Self {
        Self {
            phase,
            capability: capability.into(),
            state: AgentState::Enabled,
        }
    }

    pub fn disabled(phase: DmaicPhase, capability: impl Into<String>) -> Self {
        Self {
            phase,
            capability: capability.into(),
            state: AgentState::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state == AgentState::Enabled
    }

    /// Run `work` if the agent is enabled.
    pub fn invoke<T>(&self, work: impl FnOnce() -> T) -> AgentOutcome<T> {
        if self.is_enabled() {
            AgentOutcome::Completed(work())
        } else {
            self.unavailable()
        }
    }

    /// The outcome a disabled agent reports.
    pub fn unavailable<T>(&self) -> AgentOutcome<T> {
        AgentOutcome::Unavailable {
            phase: self.phase,
            capability: self.capability.clone(),
        }
    }
}

impl From<&AgentConfig> for Agent {
    fn from(config: &AgentConfig) -> Self {
        Self {
            phase: config.phase,
            capability: config.capability.clone(),
            state: if config.enabled {
                AgentState::Enabled
            } else {
                AgentState::Disabled
            },
        }
    }
}

/// Result of invoking an agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum AgentOutcome<T> {
    Completed(T),
    Unavailable {
        phase: DmaicPhase,
        capability: String,
    },
}

impl<T> AgentOutcome<T> {
    pub const fn completed(&self) -> Option<&T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Unavailable { .. } => None,
        }
    }

    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

/// The set of agents configured for a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentRoster {
    agents: Vec<Agent>,
}

impl AgentRoster {
    pub fn from_config(entries: &[AgentConfig]) -> Self {
        Self {
            agents: entries.iter().map(Agent::from).collect(),
        }
    }

    /// Agent for `phase`. Phases missing from the configuration resolve to a
    /// disabled agent with the default capability name.
    pub fn agent(&self, phase: DmaicPhase) -> Agent {
        self.agents
            .iter()
            .find(|agent| agent.phase == phase)
            .cloned()
            .unwrap_or_else(|| Agent::disabled(phase, phase.default_capability()))
    }

    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }
}

impl Default for AgentRoster {
    fn default() -> Self {
        Self::from_config(&default_roster())
    }
}
