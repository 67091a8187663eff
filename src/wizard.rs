//! Multi-step form wizard.
//!
//! Linear: one `.step` carries `current` at a time. Back is hidden on the
//! first step, Next on the last, and Submit is shown exactly when Next is
//! hidden. A step may require at least one checked input of a named group
//! (`data-require-checked`) before Next advances.

use thiserror::Error;

use crate::dom::{Document, DomOp, NodeId};
use crate::error::ComponentError;

pub const FORM_SELECTOR: &str = ".form-wizard";
const COMPONENT: &str = "wizard";
const SUBMITTING_LABEL: &str = "Submitting...";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WizardError {
    /// The current step's requirement is not met; the message is user-facing.
    #[error("{0}")]
    Incomplete(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StepRule {
    group: String,
    message: String,
}

#[derive(Debug, Clone)]
struct Step {
    node: NodeId,
    rule: Option<StepRule>,
}

#[derive(Debug, Clone)]
pub struct Wizard {
    form: NodeId,
    steps: Vec<Step>,
    prev: NodeId,
    next: NodeId,
    submit: NodeId,
    current: usize,
    submitted: bool,
}

fn require(doc: &Document, form: NodeId, selector: &str) -> Result<NodeId, ComponentError> {
    doc.query_within(form, selector)?
        .into_iter()
        .next()
        .ok_or_else(|| ComponentError::missing(COMPONENT, selector))
}

impl Wizard {
    pub fn mount(doc: &Document) -> Result<Self, ComponentError> {
        let form = doc
            .query_selector(FORM_SELECTOR)?
            .ok_or_else(|| ComponentError::missing(COMPONENT, FORM_SELECTOR))?;

        let steps: Vec<Step> = doc
            .query_within(form, ".step")?
            .into_iter()
            .map(|node| Step {
                node,
                rule: doc.attr(node, "data-require-checked").map(|group| StepRule {
                    group: group.to_string(),
                    message: doc
                        .attr(node, "data-require-message")
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("Please choose at least one {group}.")),
                }),
            })
            .collect();
        if steps.is_empty() {
            return Err(ComponentError::missing(COMPONENT, ".step"));
        }

        let wizard = Self {
            form,
            prev: require(doc, form, ".prev-btn")?,
            next: require(doc, form, ".next-btn")?,
            submit: require(doc, form, ".submit-btn")?,
            steps,
            current: 0,
            submitted: false,
        };
        tracing::debug!(steps = wizard.steps.len(), "Wizard mounted");
        Ok(wizard)
    }

    pub fn current_step(&self) -> usize {
        self.current
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    pub fn prev_button(&self) -> NodeId {
        self.prev
    }

    pub fn next_button(&self) -> NodeId {
        self.next
    }

    pub fn submit_button(&self) -> NodeId {
        self.submit
    }

    fn is_last(&self) -> bool {
        self.current + 1 == self.steps.len()
    }

    fn validate(&self, doc: &Document) -> Result<(), WizardError> {
        let Some(rule) = &self.steps[self.current].rule else {
            return Ok(());
        };
        let selector = format!("input[name=\"{}\"]", rule.group);
        let checked = doc
            .query_within(self.form, &selector)
            .map(|inputs| inputs.into_iter().any(|i| doc.has_attr(i, "checked")))
            .unwrap_or(false);
        if checked {
            Ok(())
        } else {
            Err(WizardError::Incomplete(rule.message.clone()))
        }
    }

    /// Advance one step if the current step validates.
    pub fn next(&mut self, doc: &Document) -> Result<Vec<DomOp>, WizardError> {
        self.validate(doc)?;
        if !self.is_last() {
            self.current += 1;
        }
        Ok(self.render())
    }

    pub fn prev(&mut self) -> Vec<DomOp> {
        self.current = self.current.saturating_sub(1);
        self.render()
    }

    /// Lock the submit button while the form goes out.
    pub fn submit(&mut self) -> Vec<DomOp> {
        self.submitted = true;
        tracing::info!("Wizard submitted");
        vec![
            DomOp::attr(self.submit, "disabled", Some(String::new())),
            DomOp::text(self.submit, SUBMITTING_LABEL),
        ]
    }

    pub fn render(&self) -> Vec<DomOp> {
        let hidden = |on: bool| on.then(String::new);
        let mut ops: Vec<DomOp> = self
            .steps
            .iter()
            .enumerate()
            .map(|(i, step)| DomOp::class(step.node, "current", i == self.current))
            .collect();
        let next_hidden = self.is_last();
        ops.push(DomOp::attr(self.prev, "hidden", hidden(self.current == 0)));
        ops.push(DomOp::attr(self.next, "hidden", hidden(next_hidden)));
        ops.push(DomOp::attr(self.submit, "hidden", hidden(!next_hidden)));
        ops
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::commit;
    use pretty_assertions::assert_eq;

    fn page() -> Document {
        Document::from_toml(
            r#"
[[children]]
tag = "form"
class = "form-wizard"

[[children.children]]
tag = "div"
class = "step"
attrs = { "data-require-checked" = "role", "data-require-message" = "Pick a role." }

[[children.children.children]]
tag = "input"
attrs = { type = "radio", name = "role", value = "student" }

[[children.children]]
tag = "div"
class = "step"
attrs = { "data-require-checked" = "interests" }

[[children.children.children]]
tag = "input"
attrs = { type = "checkbox", name = "interests", value = "math" }

[[children.children]]
tag = "div"
class = "step"

[[children.children]]
tag = "button"
class = "prev-btn"

[[children.children]]
tag = "button"
class = "next-btn"

[[children.children]]
tag = "button"
class = "submit-btn"
text = "Submit"
"#,
        )
        .unwrap()
    }

    fn mounted() -> (Document, Wizard) {
        let mut doc = page();
        let wizard = Wizard::mount(&doc).unwrap();
        commit(&mut doc, wizard.render());
        (doc, wizard)
    }

    fn hidden(doc: &Document, node: NodeId) -> bool {
        doc.has_attr(node, "hidden")
    }

    #[test]
    fn test_initial_render() {
        let (doc, wizard) = mounted();
        let steps = doc.query_selector_all(".step").unwrap();
        assert!(doc.has_class(steps[0], "current"));
        assert!(!doc.has_class(steps[1], "current"));
        assert!(hidden(&doc, wizard.prev_button()));
        assert!(!hidden(&doc, wizard.next_button()));
        assert!(hidden(&doc, wizard.submit_button()));
    }

    #[test]
    fn test_next_blocked_until_checked() {
        let (mut doc, mut wizard) = mounted();
        assert_eq!(
            wizard.next(&doc),
            Err(WizardError::Incomplete("Pick a role.".into()))
        );
        assert_eq!(wizard.current_step(), 0);

        let radio = doc.query_selector("input[name=role]").unwrap().unwrap();
        doc.set_attr(radio, "checked", "");
        let ops = wizard.next(&doc).unwrap();
        commit(&mut doc, ops);
        assert_eq!(wizard.current_step(), 1);
        assert!(!hidden(&doc, wizard.prev_button()));
    }

    #[test]
    fn test_default_message() {
        let (mut doc, mut wizard) = mounted();
        let radio = doc.query_selector("input[name=role]").unwrap().unwrap();
        doc.set_attr(radio, "checked", "");
        wizard.next(&doc).unwrap();
        assert_eq!(
            wizard.next(&doc),
            Err(WizardError::Incomplete(
                "Please choose at least one interests.".into()
            ))
        );
    }

    #[test]
    fn test_last_step_shows_submit() {
        let (mut doc, mut wizard) = mounted();
        for input in doc.query_selector_all("input").unwrap() {
            doc.set_attr(input, "checked", "");
        }
        wizard.next(&doc).unwrap();
        let ops = wizard.next(&doc).unwrap();
        commit(&mut doc, ops);
        assert_eq!(wizard.current_step(), 2);
        assert!(hidden(&doc, wizard.next_button()));
        assert!(!hidden(&doc, wizard.submit_button()));

        // Next on the last step stays put.
        wizard.next(&doc).unwrap();
        assert_eq!(wizard.current_step(), 2);
    }

    #[test]
    fn test_prev_stops_at_first() {
        let (_doc, mut wizard) = mounted();
        wizard.prev();
        assert_eq!(wizard.current_step(), 0);
    }

    #[test]
    fn test_submit_locks_button() {
        let (mut doc, mut wizard) = mounted();
        commit(&mut doc, wizard.submit());
        assert!(doc.has_attr(wizard.submit_button(), "disabled"));
        assert_eq!(doc.text(wizard.submit_button()), "Submitting...");
        assert!(wizard.is_submitted());
    }

    #[test]
    fn test_missing_buttons() {
        let doc = Document::from_toml(
            "[[children]]\ntag = \"form\"\nclass = \"form-wizard\"\n\n[[children.children]]\ntag = \"div\"\nclass = \"step\"\n",
        )
        .unwrap();
        assert!(matches!(
            Wizard::mount(&doc),
            Err(ComponentError::MissingElement { .. })
        ));
    }
}
