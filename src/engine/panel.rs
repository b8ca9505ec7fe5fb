use super::events::UiEvent;
use crate::error::{SimError, SimResult};
use std::collections::{BTreeMap, VecDeque};
use std::str::FromStr;
use std::time::Duration;
use tracing::{trace, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl WidgetValue {
    /// `true`/`false` become booleans, anything numeric a number,
    /// the rest text.
    pub fn parse(raw: &str) -> WidgetValue {
        match raw {
            "true" => WidgetValue::Bool(true),
            "false" => WidgetValue::Bool(false),
            _ => raw
                .parse::<f64>()
                .map(WidgetValue::Number)
                .unwrap_or_else(|_| WidgetValue::Text(raw.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    Slider { min: f64, max: f64 },
    Checkbox,
    Button,
    Combo(Vec<String>),
    Text,
}

/// A named control declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetSpec {
    pub key: String,
    pub kind: WidgetKind,
    pub default: WidgetValue,
}

impl WidgetSpec {
    pub fn slider(key: &str, min: f64, max: f64, default: f64) -> Self {
        Self {
            key: key.to_string(),
            kind: WidgetKind::Slider { min, max },
            default: WidgetValue::Number(default.clamp(min, max)),
        }
    }

    pub fn checkbox(key: &str, default: bool) -> Self {
        Self {
            key: key.to_string(),
            kind: WidgetKind::Checkbox,
            default: WidgetValue::Bool(default),
        }
    }

    pub fn button(key: &str) -> Self {
        Self {
            key: key.to_string(),
            kind: WidgetKind::Button,
            default: WidgetValue::Bool(false),
        }
    }

    pub fn combo(key: &str, options: &[&str], default: &str) -> Self {
        Self {
            key: key.to_string(),
            kind: WidgetKind::Combo(options.iter().map(|o| o.to_string()).collect()),
            default: WidgetValue::Text(default.to_string()),
        }
    }

    pub fn text(key: &str, default: &str) -> Self {
        Self {
            key: key.to_string(),
            kind: WidgetKind::Text,
            default: WidgetValue::Text(default.to_string()),
        }
    }
}

/// Result of one input poll.
#[derive(Debug, Clone, PartialEq)]
pub enum Polled {
    Event(UiEvent),
    Timeout,
    Closed,
}

/// The widget toolkit as seen by the engine and the models.
pub trait WidgetPanel {
    fn declare(&mut self, spec: WidgetSpec);

    /// Returns at most one pending event, waiting up to `timeout`.
    fn read(&mut self, timeout: Duration) -> Polled;

    fn get(&self, key: &str) -> Option<&WidgetValue>;

    fn set(&mut self, key: &str, value: WidgetValue) -> SimResult<()>;

    fn set_visible(&mut self, key: &str, visible: bool) -> SimResult<()>;

    /// No further input will ever arrive.
    fn is_exhausted(&self) -> bool {
        false
    }

    fn get_bool(&self, key: &str) -> SimResult<bool> {
        match self.get(key) {
            Some(WidgetValue::Bool(b)) => Ok(*b),
            Some(other) => Err(SimError::Widget(format!("'{}' is not a checkbox: {:?}", key, other))),
            None => Err(SimError::Widget(format!("unknown widget '{}'", key))),
        }
    }

    fn get_number(&self, key: &str) -> SimResult<f64> {
        match self.get(key) {
            Some(WidgetValue::Number(n)) => Ok(*n),
            Some(WidgetValue::Text(t)) => t
                .trim()
                .parse()
                .map_err(|_| SimError::Widget(format!("'{}' holds non-numeric text '{}'", key, t))),
            Some(other) => Err(SimError::Widget(format!("'{}' is not numeric: {:?}", key, other))),
            None => Err(SimError::Widget(format!("unknown widget '{}'", key))),
        }
    }

    fn get_text(&self, key: &str) -> SimResult<String> {
        match self.get(key) {
            Some(WidgetValue::Text(t)) => Ok(t.clone()),
            Some(WidgetValue::Number(n)) => Ok(n.to_string()),
            Some(WidgetValue::Bool(b)) => Ok(b.to_string()),
            None => Err(SimError::Widget(format!("unknown widget '{}'", key))),
        }
    }
}

/// One entry of a scripted input sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Event(UiEvent),
    /// Report `n` empty polls.
    Pause(usize),
    /// Set a widget value, then report it as a widget event.
    Change(String, WidgetValue),
    /// Flip a checkbox, then report it as a widget event.
    Toggle(String),
    /// The window was closed.
    Close,
}

impl FromStr for ScriptStep {
    type Err = SimError;

    fn from_str(token: &str) -> SimResult<Self> {
        let token = token.trim();
        if token.is_empty() {
            return Err(SimError::Validation("empty script step".into()));
        }
        if token == "close" {
            return Ok(ScriptStep::Close);
        }
        if let Some(n) = token.strip_prefix("pause:") {
            let n = n
                .trim()
                .parse()
                .map_err(|_| SimError::Validation(format!("bad pause count in '{}'", token)))?;
            return Ok(ScriptStep::Pause(n));
        }
        if let Some(key) = token.strip_prefix("toggle:") {
            return Ok(ScriptStep::Toggle(key.trim().to_string()));
        }
        if let Some((key, value)) = token.split_once('=') {
            return Ok(ScriptStep::Change(
                key.trim().to_string(),
                WidgetValue::parse(value.trim()),
            ));
        }
        Ok(ScriptStep::Event(UiEvent::parse(token)))
    }
}

/// Fits `value` to what a widget of `kind` can hold. Sliders clamp into
/// their range, checkboxes take `0`/`1`, combos only take listed options.
fn coerce(key: &str, kind: &WidgetKind, value: WidgetValue) -> SimResult<WidgetValue> {
    let rejected = |v: &WidgetValue| {
        Err(SimError::Widget(format!("'{}' cannot hold {:?}", key, v)))
    };
    match (kind, value) {
        (WidgetKind::Slider { min, max }, WidgetValue::Number(n)) if !n.is_nan() => {
            Ok(WidgetValue::Number(n.clamp(*min, *max)))
        }
        (WidgetKind::Slider { .. }, v) => rejected(&v),
        (WidgetKind::Checkbox, WidgetValue::Bool(b)) => Ok(WidgetValue::Bool(b)),
        (WidgetKind::Checkbox, WidgetValue::Number(n)) if n == 0.0 || n == 1.0 => {
            Ok(WidgetValue::Bool(n == 1.0))
        }
        (WidgetKind::Checkbox, v) => rejected(&v),
        (WidgetKind::Combo(options), v) => {
            let text = match &v {
                WidgetValue::Text(t) => t.clone(),
                WidgetValue::Number(n) => n.to_string(),
                WidgetValue::Bool(b) => b.to_string(),
            };
            if options.contains(&text) {
                Ok(WidgetValue::Text(text))
            } else {
                rejected(&v)
            }
        }
        (WidgetKind::Text, WidgetValue::Number(n)) => Ok(WidgetValue::Text(n.to_string())),
        (WidgetKind::Text, WidgetValue::Bool(b)) => Ok(WidgetValue::Text(b.to_string())),
        (_, v) => Ok(v),
    }
}

#[derive(Debug, Clone)]
struct WidgetState {
    spec: WidgetSpec,
    value: WidgetValue,
    visible: bool,
}

/// Headless panel that replays a queue of script steps, one per poll.
/// Once the queue is empty every poll times out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPanel {
    widgets: BTreeMap<String, WidgetState>,
    script: VecDeque<ScriptStep>,
    closed: bool,
}

impl ScriptedPanel {
    pub fn new(steps: impl IntoIterator<Item = ScriptStep>) -> Self {
        Self {
            script: steps.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Parses a comma-separated script such as `setup, Rule_nbr=30, go`.
    pub fn from_script(script: &str) -> SimResult<Self> {
        let steps = script
            .split(',')
            .filter(|t| !t.trim().is_empty())
            .map(str::parse)
            .collect::<SimResult<Vec<ScriptStep>>>()?;
        Ok(Self::new(steps))
    }

    pub fn push(&mut self, step: ScriptStep) {
        self.script.push_back(step);
    }

    pub fn is_visible(&self, key: &str) -> Option<bool> {
        self.widgets.get(key).map(|w| w.visible)
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }

    /// Snapshot of all widget values.
    pub fn values(&self) -> BTreeMap<String, WidgetValue> {
        self.widgets
            .iter()
            .map(|(k, w)| (k.clone(), w.value.clone()))
            .collect()
    }

    fn apply_change(&mut self, key: &str, value: WidgetValue) {
        if let Err(e) = self.set(key, value) {
            warn!("Scripted change ignored: {}", e);
        }
    }
}

impl WidgetPanel for ScriptedPanel {
    fn declare(&mut self, spec: WidgetSpec) {
        let key = spec.key.clone();
        // Redeclaring keeps the current value so script changes survive setup.
        let value = self
            .widgets
            .get(&key)
            .map(|w| w.value.clone())
            .unwrap_or_else(|| spec.default.clone());
        self.widgets.insert(
            key,
            WidgetState {
                spec,
                value,
                visible: true,
            },
        );
    }

    fn read(&mut self, _timeout: Duration) -> Polled {
        if self.closed {
            return Polled::Closed;
        }
        let Some(step) = self.script.pop_front() else {
            return Polled::Timeout;
        };
        trace!("Script step {:?}", step);
        match step {
            ScriptStep::Event(event) => Polled::Event(event),
            ScriptStep::Pause(n) => {
                if n > 1 {
                    self.script.push_front(ScriptStep::Pause(n - 1));
                }
                Polled::Timeout
            }
            ScriptStep::Change(key, value) => {
                self.apply_change(&key, value);
                Polled::Event(UiEvent::Widget(key))
            }
            ScriptStep::Toggle(key) => {
                let flipped = !self.get_bool(&key).unwrap_or(false);
                self.apply_change(&key, WidgetValue::Bool(flipped));
                Polled::Event(UiEvent::Widget(key))
            }
            ScriptStep::Close => {
                self.closed = true;
                Polled::Closed
            }
        }
    }

    fn get(&self, key: &str) -> Option<&WidgetValue> {
        self.widgets.get(key).map(|w| &w.value)
    }

    fn set(&mut self, key: &str, value: WidgetValue) -> SimResult<()> {
        let widget = self
            .widgets
            .get_mut(key)
            .ok_or_else(|| SimError::Widget(format!("unknown widget '{}'", key)))?;
        widget.value = coerce(key, &widget.spec.kind, value)?;
        Ok(())
    }

    fn set_visible(&mut self, key: &str, visible: bool) -> SimResult<()> {
        let widget = self
            .widgets
            .get_mut(key)
            .ok_or_else(|| SimError::Widget(format!("unknown widget '{}'", key)))?;
        widget.visible = visible;
        Ok(())
    }

    fn is_exhausted(&self) -> bool {
        self.closed || self.script.is_empty()
    }
}
