//! Scenario replay for the `dout_sim` binary.
//!
//! A scenario configures channels, then runs a list of steps against a
//! [`ManualClock`]. Each step advances time, optionally changes power or
//! safe state, ticks the engine with its samples and finally issues the
//! application commands.
//!
//! ```toml
//! power = [true, true, true, true]
//!
//! [[outputs]]
//! channel = 2
//! diagnostic = true
//!
//! [[steps]]
//! set = [{ channel = 2, value = true }]
//!
//! [[steps]]
//! advance_ms = 1
//! repeat = 150
//! samples = [{ channel = 2, kind = "current", raw = 3500 }]
//! ```

use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use dout_common::channel::{ChannelId, PullConfig};
use dout_common::config::{ConfigError, EngineConfig};
use dout_common::consts::MAX_SHUTOFF_GROUPS;
use dout_common::error::DoutError;
use dout_common::state::ProtectionState;

use crate::clock::ManualClock;
use crate::engine::{OutputEngine, OutputInit};
use crate::feedback::FeedbackSample;
use crate::limits::VoltageLimits;
use crate::power::{PowerStatus, SafeStateScope};
use crate::safety_link::SafetyLinkConfig;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot read scenario: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scenario: {0}")]
    Parse(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("channel {channel} init failed: {source}")]
    Init { channel: ChannelId, source: DoutError },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSpec {
    pub channel: ChannelId,
    #[serde(default)]
    pub diagnostic: bool,
    #[serde(default)]
    pub safety_link: Option<SafetyLinkConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSpec {
    pub channel: ChannelId,
    #[serde(default)]
    pub pull: PullConfig,
    #[serde(default)]
    pub limits: Option<VoltageLimits>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetCommand {
    pub channel: ChannelId,
    pub value: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Step {
    /// Time advanced before each repetition [ms].
    #[serde(default)]
    pub advance_ms: u64,
    #[serde(default = "default_repeat")]
    pub repeat: u32,
    #[serde(default)]
    pub power: Option<[bool; MAX_SHUTOFF_GROUPS]>,
    #[serde(default)]
    pub enter_safe_state: Option<SafeStateScope>,
    #[serde(default)]
    pub leave_safe_state: Option<SafeStateScope>,
    #[serde(default)]
    pub samples: Vec<FeedbackSample>,
    #[serde(default)]
    pub set: Vec<SetCommand>,
    #[serde(default)]
    pub reset: Vec<ChannelId>,
}

fn default_repeat() -> u32 {
    1
}

fn default_power() -> [bool; MAX_SHUTOFF_GROUPS] {
    [true; MAX_SHUTOFF_GROUPS]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    #[serde(default = "default_power")]
    pub power: [bool; MAX_SHUTOFF_GROUPS],
    #[serde(default)]
    pub inputs: Vec<InputSpec>,
    #[serde(default)]
    pub outputs: Vec<OutputSpec>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Totals of a scenario run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: u64,
    pub trips: usize,
    pub reenables: usize,
    pub spi_frames: usize,
    pub sets_rejected: usize,
    pub resets_accepted: usize,
    pub resets_refused: usize,
    /// Protection state of every scenario output at the end.
    pub final_states: Vec<(ChannelId, ProtectionState)>,
}

impl Scenario {
    pub fn from_toml(content: &str) -> Result<Self, ScenarioError> {
        toml::from_str(content).map_err(|e| ScenarioError::Parse(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Replay against a fresh engine built from `config`.
    pub fn run(&self, config: EngineConfig) -> Result<RunSummary, ScenarioError> {
        let clock = ManualClock::new();
        let mut engine = OutputEngine::new(config, clock.clone())?;
        engine.apply_power_status(PowerStatus::from_groups(self.power));

        for input in &self.inputs {
            engine
                .init_input(input.channel, input.pull, input.limits)
                .map_err(|source| ScenarioError::Init {
                    channel: input.channel,
                    source,
                })?;
        }
        for output in &self.outputs {
            let init = OutputInit {
                diagnostic: output.diagnostic,
                safety_link: output.safety_link,
            };
            engine
                .init_output(output.channel, init)
                .map_err(|source| ScenarioError::Init {
                    channel: output.channel,
                    source,
                })?;
        }

        let mut summary = RunSummary::default();
        for step in &self.steps {
            for _ in 0..step.repeat {
                self.run_step(&mut engine, &clock, step, &mut summary);
            }
        }

        summary.cycles = engine.cycle_count();
        for output in &self.outputs {
            if let Ok(status) = engine.protection_status(output.channel) {
                summary.final_states.push((output.channel, status.state));
            }
        }
        info!(
            "Scenario done: {} cycles, {} trips, {} re-enables, {} resets",
            summary.cycles, summary.trips, summary.reenables, summary.resets_accepted
        );
        Ok(summary)
    }

    fn run_step(
        &self,
        engine: &mut OutputEngine<ManualClock>,
        clock: &ManualClock,
        step: &Step,
        summary: &mut RunSummary,
    ) {
        clock.advance_ms(step.advance_ms);
        if let Some(power) = step.power {
            engine.apply_power_status(PowerStatus::from_groups(power));
        }
        if let Some(scope) = step.enter_safe_state {
            engine.enter_safe_state(scope);
        }
        if let Some(scope) = step.leave_safe_state {
            engine.leave_safe_state(scope);
        }

        let report = engine.tick(&step.samples);
        summary.trips += report.trips.len();
        summary.reenables += report.reenabled.len();
        summary.spi_frames += usize::from(report.spi_frame.is_some());

        for cmd in &step.set {
            match engine.set(cmd.channel, cmd.value) {
                Ok(outcome) => debug!("t={}ms set {} -> {:?}", clock.now_ms(), cmd.channel, outcome),
                Err(e) => {
                    summary.sets_rejected += 1;
                    debug!("t={}ms set {} rejected: {e}", clock.now_ms(), cmd.channel);
                }
            }
        }
        for &channel in &step.reset {
            match engine.reset_protection(channel) {
                Ok(_) => summary.resets_accepted += 1,
                Err(_) => summary.resets_refused += 1,
            }
        }
    }
}
