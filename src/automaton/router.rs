use super::rule::{
    clamp_rule, decode_label, decode_switches, encode, switch_bit, SwitchVector, LABEL_KEY,
    POS_TO_SWITCH, RULE_KEY,
};
use crate::engine::panel::{WidgetPanel, WidgetSpec, WidgetValue};
use crate::error::SimResult;
use tracing::{debug, trace};

/// How a UI event relates to the rule number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleEvent {
    SliderChanged,
    /// Bit index of the switch that changed.
    SwitchChanged(usize),
    Other,
}

impl RuleEvent {
    pub fn classify(event: &str) -> RuleEvent {
        if event == RULE_KEY {
            RuleEvent::SliderChanged
        } else if let Some(bit) = switch_bit(event) {
            RuleEvent::SwitchChanged(bit)
        } else {
            RuleEvent::Other
        }
    }
}

/// Keeps the slider, the eight switches and the binary label showing the
/// same rule number. Every transition rewrites all three.
#[derive(Debug, Clone)]
pub struct RuleControls {
    rule: u8,
}

impl RuleControls {
    pub fn new(rule: u8) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> u8 {
        self.rule
    }

    /// Slider, label, then the switches from `"111"` down to `"000"`.
    pub fn widgets(&self) -> Vec<WidgetSpec> {
        let switches = decode_switches(self.rule);
        let mut specs = vec![
            WidgetSpec::slider(RULE_KEY, 0.0, 255.0, self.rule as f64),
            WidgetSpec::text(LABEL_KEY, &decode_label(self.rule)),
        ];
        specs.extend(
            POS_TO_SWITCH
                .iter()
                .zip(switches)
                .rev()
                .map(|(&(_, key), on)| WidgetSpec::checkbox(key, on)),
        );
        specs
    }

    /// Routes one event. Returns whether it concerned the rule.
    pub fn apply(&mut self, event: &str, panel: &mut dyn WidgetPanel) -> SimResult<bool> {
        match RuleEvent::classify(event) {
            RuleEvent::SliderChanged => {
                self.rule = clamp_rule(panel.get_number(RULE_KEY)?);
                debug!("Slider set rule {}", self.rule);
            }
            RuleEvent::SwitchChanged(bit) => {
                // The whole vector is read, not just the bit that changed.
                self.rule = encode(&Self::read_switches(panel)?);
                debug!("Switch {} set rule {}", bit, self.rule);
            }
            RuleEvent::Other => {
                trace!("'{}' is not a rule control", event);
                return Ok(false);
            }
        }
        self.publish(panel)?;
        Ok(true)
    }

    /// Reconciles the controls at setup. Switches that disagree with the
    /// current rule win; otherwise a differing slider does.
    pub fn settle(&mut self, panel: &mut dyn WidgetPanel) -> SimResult<()> {
        let from_switches = encode(&Self::read_switches(panel)?);
        let from_slider = clamp_rule(panel.get_number(RULE_KEY)?);
        if from_switches != self.rule {
            self.rule = from_switches;
        } else if from_slider != self.rule {
            self.rule = from_slider;
        }
        self.publish(panel)
    }

    /// Writes the current rule to all three controls.
    pub fn publish(&self, panel: &mut dyn WidgetPanel) -> SimResult<()> {
        panel.set(RULE_KEY, WidgetValue::Number(self.rule as f64))?;
        for (&(_, key), on) in POS_TO_SWITCH.iter().zip(decode_switches(self.rule)) {
            panel.set(key, WidgetValue::Bool(on))?;
        }
        panel.set(LABEL_KEY, WidgetValue::Text(decode_label(self.rule)))
    }

    pub fn read_switches(panel: &dyn WidgetPanel) -> SimResult<SwitchVector> {
        let mut switches = [false; 8];
        for (slot, &(_, key)) in switches.iter_mut().zip(POS_TO_SWITCH.iter()) {
            *slot = panel.get_bool(key)?;
        }
        Ok(switches)
    }

    /// True when slider, switches and label all show `self.rule`.
    pub fn is_consistent(&self, panel: &dyn WidgetPanel) -> SimResult<bool> {
        let slider = clamp_rule(panel.get_number(RULE_KEY)?);
        let switches = encode(&Self::read_switches(panel)?);
        let label = panel.get_text(LABEL_KEY)?;
        Ok(slider == self.rule && switches == self.rule && label == decode_label(self.rule))
    }
}
