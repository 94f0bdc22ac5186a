//! Typed action tree.
//!
//! Schemas arrive as loosely-typed JSON. Each action object is converted into
//! an [`Action`] right before it runs: the operation itself becomes an [`Op`]
//! variant and the optional `delay` / `onSuccess` / `onError` fields are
//! lifted out. Conversion never fails; an object that cannot be understood
//! becomes [`Op::Invalid`], which the interpreter treats as a failed action
//! (so `onError` still fires).

use serde_json::{Map, Value};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Op
// ---------------------------------------------------------------------------

/// One leaf side effect.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// `{log|message}` short-circuit, or `action: "log"`.
    Log(String),
    Click {
        target: String,
    },
    Remove {
        target: String,
    },
    Hide {
        target: String,
    },
    Style {
        target: String,
        declarations: Vec<(String, String)>,
    },
    RemoveClass {
        target: String,
        class_name: String,
    },
    ClearCookie {
        name: String,
    },
    ClearAllCookies,
    AddGlobalStyle {
        selector: String,
        declarations: Vec<(String, String)>,
    },
    RemoveGlobalStyle {
        selector: String,
    },
    Reload,
    /// Unknown action name or missing required field.
    Invalid(String),
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::Log(_) => "log",
            Op::Click { .. } => "click",
            Op::Remove { .. } => "remove",
            Op::Hide { .. } => "hide",
            Op::Style { .. } => "style",
            Op::RemoveClass { .. } => "removeClass",
            Op::ClearCookie { .. } => "clearCookie",
            Op::ClearAllCookies => "clearAllCookies",
            Op::AddGlobalStyle { .. } => "addGlobalStyle",
            Op::RemoveGlobalStyle { .. } => "removeGlobalStyle",
            Op::Reload => "reload",
            Op::Invalid(_) => "invalid",
        }
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// An [`Op`] plus its scheduling and chaining fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    pub op: Op,
    pub delay: Option<Duration>,
    pub on_success: Option<Box<Action>>,
    pub on_error: Option<Box<Action>>,
}

impl Action {
    pub fn new(op: Op) -> Self {
        Self {
            op,
            delay: None,
            on_success: None,
            on_error: None,
        }
    }

    /// Build an action from one JSON action object.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Action::new(Op::Invalid(format!(
                "action must be an object, got {}",
                kind_of(value)
            )));
        };

        Action {
            op: op_from_object(obj),
            delay: delay_field(obj),
            on_success: chained(obj, "onSuccess"),
            on_error: chained(obj, "onError"),
        }
    }
}

fn chained(obj: &Map<String, Value>, key: &str) -> Option<Box<Action>> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(v) => Some(Box::new(Action::from_value(v))),
    }
}

/// Longest delay an action may request; larger values are clamped.
pub const MAX_DELAY: Duration = Duration::from_secs(60);

fn delay_field(obj: &Map<String, Value>) -> Option<Duration> {
    let ms = match obj.get("delay")? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    if ms == 0 {
        return None;
    }
    let delay = Duration::from_millis(ms);
    if delay > MAX_DELAY {
        tracing::debug!(delay_ms = ms, "clamping action delay");
        return Some(MAX_DELAY);
    }
    Some(delay)
}

fn op_from_object(obj: &Map<String, Value>) -> Op {
    // A bare log/message wins over everything else on the object.
    if let Some(text) = text_field(obj, "log").or_else(|| text_field(obj, "message")) {
        return Op::Log(text);
    }

    let Some(name) = obj.get("action").and_then(Value::as_str) else {
        return Op::Invalid("missing `action` field".into());
    };
    let target = text_field(obj, "target");

    match name {
        "log" => Op::Log(target.unwrap_or_default()),
        "reload" => Op::Reload,
        "click" => with_target(name, target, |target| Op::Click { target }),
        "remove" => with_target(name, target, |target| Op::Remove { target }),
        "hide" => with_target(name, target, |target| Op::Hide { target }),
        "style" => with_target(name, target, |target| Op::Style {
            target,
            declarations: declarations(obj),
        }),
        "removeClass" | "remove-class" => match text_field(obj, "className") {
            Some(class_name) => with_target(name, target, |target| Op::RemoveClass {
                target,
                class_name,
            }),
            None => Op::Invalid(format!("`{name}` requires a className")),
        },
        "clearCookie" | "clear-cookies" | "delete-cookies" => match target {
            Some(t) if t == "*" => Op::ClearAllCookies,
            Some(name) => Op::ClearCookie { name },
            None => Op::Invalid(format!("`{name}` requires a target cookie name")),
        },
        "clearAllCookies" => Op::ClearAllCookies,
        "addGlobalStyle" => {
            let decls = declarations(obj);
            if decls.is_empty() {
                return Op::Invalid("`addGlobalStyle` requires styles".into());
            }
            with_target(name, target, |selector| Op::AddGlobalStyle {
                selector,
                declarations: decls,
            })
        }
        "removeGlobalStyle" => {
            with_target(name, target, |selector| Op::RemoveGlobalStyle { selector })
        }
        other => Op::Invalid(format!("unknown action type: {other}")),
    }
}

fn with_target(name: &str, target: Option<String>, build: impl FnOnce(String) -> Op) -> Op {
    match target {
        Some(t) => build(t),
        None => Op::Invalid(format!("`{name}` requires a target")),
    }
}

/// Either a single `property`/`value` pair or the `styles` mapping.
fn declarations(obj: &Map<String, Value>) -> Vec<(String, String)> {
    if let (Some(property), Some(value)) = (text_field(obj, "property"), text_field(obj, "value"))
    {
        return vec![(property, value)];
    }
    obj.get("styles")
        .and_then(Value::as_object)
        .map(|styles| {
            styles
                .iter()
                .filter_map(|(prop, v)| scalar_text(v).map(|v| (prop.clone(), v)))
                .collect()
        })
        .unwrap_or_default()
}

fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(scalar_text).filter(|s| !s.is_empty())
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".into()),
        _ => None,
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn remove_with_target() {
        let a = Action::from_value(&json!({"action": "remove", "target": "#banner"}));
        assert_eq!(
            a.op,
            Op::Remove {
                target: "#banner".into()
            }
        );
        assert_eq!(a.delay, None);
    }

    #[test]
    fn log_field_short_circuits_action() {
        let a = Action::from_value(&json!({"action": "remove", "target": "p", "log": "hi"}));
        assert_eq!(a.op, Op::Log("hi".into()));
    }

    #[test]
    fn message_field_is_a_log() {
        let a = Action::from_value(&json!({"message": "handled"}));
        assert_eq!(a.op, Op::Log("handled".into()));
    }

    #[test]
    fn delay_accepts_numbers_and_numeric_strings() {
        let a = Action::from_value(&json!({"action": "reload", "delay": 250}));
        assert_eq!(a.delay, Some(Duration::from_millis(250)));
        let b = Action::from_value(&json!({"action": "reload", "delay": "40"}));
        assert_eq!(b.delay, Some(Duration::from_millis(40)));
        let c = Action::from_value(&json!({"action": "reload", "delay": 0}));
        assert_eq!(c.delay, None);
    }

    #[test]
    fn oversized_delay_is_clamped() {
        let a = Action::from_value(&json!({"action": "reload", "delay": 1e300}));
        assert_eq!(a.delay, Some(MAX_DELAY));
        let b = Action::from_value(&json!({"action": "reload", "delay": u64::MAX}));
        assert_eq!(b.delay, Some(MAX_DELAY));
        let c = Action::from_value(&json!({"action": "reload", "delay": "99999999999"}));
        assert_eq!(c.delay, Some(MAX_DELAY));
    }

    #[test]
    fn chains_recurse() {
        let a = Action::from_value(&json!({
            "action": "click",
            "target": "#accept",
            "onSuccess": {"action": "remove", "target": "#overlay",
                          "onError": {"log": "overlay gone already"}},
        }));
        let next = a.on_success.expect("onSuccess");
        assert_eq!(
            next.op,
            Op::Remove {
                target: "#overlay".into()
            }
        );
        assert_eq!(
            next.on_error.expect("onError").op,
            Op::Log("overlay gone already".into())
        );
        assert!(a.on_error.is_none());
    }

    #[test]
    fn style_prefers_property_value_pair() {
        let a = Action::from_value(&json!({
            "action": "style", "target": "body",
            "property": "overflow", "value": "auto",
            "styles": {"color": "red"}
        }));
        assert_eq!(
            a.op,
            Op::Style {
                target: "body".into(),
                declarations: vec![("overflow".into(), "auto".into())],
            }
        );
    }

    #[test]
    fn style_falls_back_to_styles_map() {
        let a = Action::from_value(&json!({
            "action": "style", "target": "body",
            "styles": {"overflow": "auto", "opacity": 1}
        }));
        let Op::Style { declarations, .. } = a.op else {
            panic!("expected Style")
        };
        assert_eq!(declarations.len(), 2);
        assert!(declarations.contains(&("opacity".into(), "1".into())));
    }

    #[test]
    fn cookie_aliases() {
        let one = Action::from_value(&json!({"action": "delete-cookies", "target": "_ga"}));
        assert_eq!(one.op, Op::ClearCookie { name: "_ga".into() });
        let all = Action::from_value(&json!({"action": "clear-cookies", "target": "*"}));
        assert_eq!(all.op, Op::ClearAllCookies);
        let all = Action::from_value(&json!({"action": "clearAllCookies"}));
        assert_eq!(all.op, Op::ClearAllCookies);
    }

    #[test]
    fn remove_class_alias_requires_class_name() {
        let ok = Action::from_value(
            &json!({"action": "remove-class", "target": "body", "className": "no-scroll"}),
        );
        assert_eq!(
            ok.op,
            Op::RemoveClass {
                target: "body".into(),
                class_name: "no-scroll".into()
            }
        );
        let bad = Action::from_value(&json!({"action": "removeClass", "target": "body"}));
        assert!(matches!(bad.op, Op::Invalid(_)));
    }

    #[test]
    fn unknown_and_malformed_become_invalid() {
        assert!(matches!(
            Action::from_value(&json!({"action": "teleport"})).op,
            Op::Invalid(_)
        ));
        assert!(matches!(
            Action::from_value(&json!({"action": "remove"})).op,
            Op::Invalid(_)
        ));
        assert!(matches!(Action::from_value(&json!(42)).op, Op::Invalid(_)));
        assert!(matches!(
            Action::from_value(&json!({"target": "#x"})).op,
            Op::Invalid(_)
        ));
    }

    #[test]
    fn invalid_action_keeps_its_on_error() {
        let a = Action::from_value(&json!({"action": "teleport", "onError": {"log": "nope"}}));
        assert!(matches!(a.op, Op::Invalid(_)));
        assert_eq!(a.on_error.unwrap().op, Op::Log("nope".into()));
    }
}
