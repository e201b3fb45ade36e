//! Maps DAP `variablesReference` handles to CDP remote objects and
//! materializes them into the named/indexed/internal buckets the `variables`
//! request expects.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::cdp::client::{self, CdpClient, CdpError};
use crate::cdp::messages::{
    CallArgument, CallFunctionOnParams, EvaluateOnCallFrameParams, EvaluateParams,
    GetPropertiesParams, InternalPropertyDescriptor, PropertyDescriptor, RemoteObject,
};
use crate::dap::{Variable, VariablePresentationHint};

/// Large arrays get carved into sub-containers of at most this many
/// elements so a client's `variables` paging UI isn't handed a single
/// 100,000-entry bucket.
const ARRAY_CHUNK_THRESHOLD: usize = 100;

#[derive(Debug, Clone)]
pub enum VariableHandle {
    /// A scope's variables: `object_id` is the scope's own `RemoteObject`
    /// id from the pause's `scopeChain`, listed via `Runtime.getProperties`
    /// the same as a plain object. `call_frame_id` is kept alongside so
    /// `setVariable`/watch expressions against this scope can still target
    /// the right call frame.
    Scope { object_id: String, call_frame_id: String },
    /// An arbitrary object's own properties, via `Runtime.getProperties`.
    Object { object_id: String },
    /// A synthesized slice of a larger container, e.g. array indices
    /// `[start, end)` of a parent object id.
    Interval { object_id: String, start: usize, end: usize },
}

#[derive(Debug, Default)]
pub struct VariableStore {
    handles: RefCell<HashMap<i64, VariableHandle>>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handle under a reference allocated by the caller (via
    /// `AdapterContext::next_variables_reference`) and returns that
    /// reference back for convenience.
    pub fn register(&self, reference: i64, handle: VariableHandle) -> i64 {
        self.handles.borrow_mut().insert(reference, handle);
        reference
    }

    /// Drops every registered handle. Called when a Thread resumes, since
    /// `variablesReference` values are only valid while paused.
    pub fn clear(&self) {
        self.handles.borrow_mut().clear();
    }

    pub fn handle(&self, reference: i64) -> Option<VariableHandle> {
        self.handles.borrow().get(&reference).cloned()
    }

    /// Resolves one `variables` request. `allocate_reference` mints a new
    /// `variablesReference` for any nested object/array/interval found.
    pub async fn variables(
        &self,
        client: &dyn CdpClient,
        session: Option<&crate::cdp::messages::SessionId>,
        reference: i64,
        mut allocate_reference: impl FnMut() -> i64,
    ) -> Result<Vec<Variable>, CdpError> {
        let Some(handle) = self.handle(reference) else {
            return Ok(Vec::new());
        };

        match handle {
            VariableHandle::Scope { object_id, .. } | VariableHandle::Object { object_id } => {
                let result = client::send(
                    client,
                    session,
                    GetPropertiesParams {
                        object_id: object_id.clone(),
                        own_properties: true,
                        generate_preview: true,
                    },
                )
                .await?;
                let mut variables = self.render_properties(&result.result, &mut allocate_reference);
                variables.extend(self.render_internal_properties(&result.internal_properties, &mut allocate_reference));
                Ok(variables)
            }
            VariableHandle::Interval { object_id, start, end } => {
                let result = client::send(
                    client,
                    session,
                    GetPropertiesParams {
                        object_id: object_id.clone(),
                        own_properties: true,
                        generate_preview: true,
                    },
                )
                .await?;
                let slice: Vec<PropertyDescriptor> = result
                    .result
                    .into_iter()
                    .filter(|p| {
                        p.name
                            .parse::<usize>()
                            .map(|idx| idx >= start && idx < end)
                            .unwrap_or(false)
                    })
                    .collect();
                Ok(self.render_properties(&slice, &mut allocate_reference))
            }
        }
    }

    fn render_properties(
        &self,
        props: &[PropertyDescriptor],
        allocate_reference: &mut impl FnMut() -> i64,
    ) -> Vec<Variable> {
        let array_like = props
            .iter()
            .filter(|p| p.name.parse::<usize>().is_ok())
            .count();

        if array_like > ARRAY_CHUNK_THRESHOLD {
            return self.render_array_chunks(props, array_like, allocate_reference);
        }

        props
            .iter()
            .filter(|p| p.is_own.unwrap_or(true))
            .map(|p| self.render_property(p, allocate_reference))
            .collect()
    }

    /// Internal properties (`[[Prototype]]`, `[[PromiseStatus]]`, and the
    /// like) are not enumerable own properties, so CDP reports them
    /// separately from `GetPropertiesResult::result`; rendered last and
    /// flagged `kind: "internal"` so a client can fold them under its own
    /// "Internal" grouping instead of mixing them into regular fields.
    fn render_internal_properties(
        &self,
        props: &[InternalPropertyDescriptor],
        allocate_reference: &mut impl FnMut() -> i64,
    ) -> Vec<Variable> {
        props
            .iter()
            .map(|p| {
                let value = p.value.clone().unwrap_or_default();
                let reference = if value.object_id.is_some() {
                    let r = allocate_reference();
                    self.register(
                        r,
                        VariableHandle::Object {
                            object_id: value.object_id.clone().unwrap(),
                        },
                    );
                    r
                } else {
                    0
                };
                Variable {
                    name: p.name.clone(),
                    value: render_remote_object_summary(&value),
                    type_: Some(value.type_.clone()),
                    presentation_hint: Some(VariablePresentationHint {
                        kind: Some("internal".to_string()),
                        attributes: None,
                        visibility: None,
                    }),
                    evaluate_name: None,
                    variables_reference: reference,
                    named_variables: None,
                    indexed_variables: None,
                    memory_reference: None,
                }
            })
            .collect()
    }

    fn render_array_chunks(
        &self,
        props: &[PropertyDescriptor],
        count: usize,
        allocate_reference: &mut impl FnMut() -> i64,
    ) -> Vec<Variable> {
        let Some(object_id) = props
            .iter()
            .find_map(|p| p.value.as_ref().and_then(|v| v.object_id.clone()))
        else {
            return props
                .iter()
                .map(|p| self.render_property(p, allocate_reference))
                .collect();
        };

        let mut out = Vec::new();
        let mut start = 0usize;
        while start < count {
            let end = (start + ARRAY_CHUNK_THRESHOLD).min(count);
            let reference = allocate_reference();
            self.register(
                reference,
                VariableHandle::Interval {
                    object_id: object_id.clone(),
                    start,
                    end,
                },
            );
            out.push(Variable {
                name: format!("[{start}...{})", end),
                value: String::new(),
                type_: None,
                presentation_hint: None,
                evaluate_name: None,
                variables_reference: reference,
                named_variables: None,
                indexed_variables: Some((end - start) as i64),
                memory_reference: None,
            });
            start = end;
        }
        out
    }

    fn render_property(
        &self,
        prop: &PropertyDescriptor,
        allocate_reference: &mut impl FnMut() -> i64,
    ) -> Variable {
        let value = prop
            .value
            .clone()
            .or_else(|| prop.get.clone())
            .unwrap_or_default();
        let reference = if value.object_id.is_some() {
            let r = allocate_reference();
            self.register(
                r,
                VariableHandle::Object {
                    object_id: value.object_id.clone().unwrap(),
                },
            );
            r
        } else {
            0
        };

        Variable {
            name: prop.name.clone(),
            value: render_remote_object_summary(&value),
            type_: Some(value.type_.clone()),
            presentation_hint: Some(VariablePresentationHint {
                kind: None,
                attributes: if prop.writable == Some(false) {
                    Some(vec!["readOnly".to_string()])
                } else {
                    None
                },
                visibility: None,
            }),
            evaluate_name: None,
            variables_reference: reference,
            named_variables: None,
            indexed_variables: None,
            memory_reference: None,
        }
    }

    /// Evaluates `expression` as an assignment target's new value, then
    /// assigns it onto the parent handle's object via a setter function
    /// invoked through `Runtime.callFunctionOn`. On evaluation failure the
    /// runtime's own error description is returned verbatim as an `Err`.
    pub async fn set_variable(
        &self,
        client: &dyn CdpClient,
        session: Option<&crate::cdp::messages::SessionId>,
        parent_reference: i64,
        name: &str,
        expression: &str,
        context_id: Option<i64>,
    ) -> Result<RemoteObject, String> {
        let handle = self
            .handle(parent_reference)
            .ok_or_else(|| "unknown variable container".to_string())?;

        let evaluated = client::send(
            client,
            session,
            EvaluateParams {
                expression: expression.to_string(),
                context_id,
                return_by_value: Some(false),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| e.to_string())?;

        if let Some(exc) = evaluated.exception_details {
            return Err(exc.text);
        }

        let (object_id, argument) = match &handle {
            VariableHandle::Scope { object_id, .. } | VariableHandle::Object { object_id } => {
                (object_id.clone(), evaluated.result.clone())
            }
            VariableHandle::Interval { object_id, .. } => (object_id.clone(), evaluated.result.clone()),
        };

        let assign_fn = "function(prop, value) { this[prop] = value; return this[prop]; }";
        let call_arg = CallArgument {
            value: None,
            object_id: argument.object_id.clone(),
        };
        let name_arg = CallArgument {
            value: Some(serde_json::Value::String(name.to_string())),
            object_id: None,
        };

        let result = client::send(
            client,
            session,
            CallFunctionOnParams {
                function_declaration: assign_fn.to_string(),
                object_id: Some(object_id),
                arguments: vec![name_arg, call_arg],
                silent: false,
                generate_preview: true,
                return_by_value: Some(false),
            },
        )
        .await
        .map_err(|e| e.to_string())?;

        if let Some(exc) = result.exception_details {
            return Err(exc.text);
        }

        Ok(result.result)
    }

    /// Evaluation entry point shared by `evaluate`/hover/watch/repl: while
    /// paused, evaluates against a call frame; otherwise against the
    /// global execution context.
    pub async fn evaluate(
        &self,
        client: &dyn CdpClient,
        session: Option<&crate::cdp::messages::SessionId>,
        expression: &str,
        call_frame_id: Option<&str>,
        context_id: Option<i64>,
    ) -> Result<RemoteObject, CdpError> {
        if let Some(call_frame_id) = call_frame_id {
            let result = client::send(
                client,
                session,
                EvaluateOnCallFrameParams {
                    call_frame_id: call_frame_id.to_string(),
                    expression: expression.to_string(),
                    silent: true,
                    generate_preview: true,
                    throw_on_side_effect: false,
                    return_by_value: Some(false),
                },
            )
            .await?;
            return Ok(result.result);
        }

        let result = client::send(
            client,
            session,
            EvaluateParams {
                expression: expression.to_string(),
                context_id,
                generate_preview: true,
                return_by_value: Some(false),
                ..Default::default()
            },
        )
        .await?;
        Ok(result.result)
    }
}

/// Renders a short, human-readable summary the way a console would, used
/// both for `variables` leaf values and for forwarding
/// `Runtime.consoleAPICalled` arguments as DAP `output` text.
pub fn render_remote_object_summary(obj: &RemoteObject) -> String {
    if let Some(value) = &obj.value {
        return match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
    }
    if let Some(description) = &obj.description {
        return description.clone();
    }
    if let Some(subtype) = &obj.subtype {
        return format!("{} {{{}}}", obj.type_, subtype);
    }
    format!("{{{}}}", obj.type_)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn string_remote_object(s: &str) -> RemoteObject {
        RemoteObject {
            type_: "string".to_string(),
            value: Some(serde_json::Value::String(s.to_string())),
            ..Default::default()
        }
    }

    #[test]
    fn renders_primitive_value_directly() {
        assert_eq!(render_remote_object_summary(&string_remote_object("hi")), "hi");
    }

    #[test]
    fn renders_description_when_no_value() {
        let obj = RemoteObject {
            type_: "object".to_string(),
            description: Some("Error: boom".to_string()),
            ..Default::default()
        };
        assert_eq!(render_remote_object_summary(&obj), "Error: boom");
    }

    #[test]
    fn handles_roundtrip_through_the_store() {
        let store = VariableStore::new();
        let reference = store.register(1, VariableHandle::Object { object_id: "oid".into() });
        assert_eq!(reference, 1);
        assert!(matches!(store.handle(1), Some(VariableHandle::Object { .. })));
        store.clear();
        assert!(store.handle(1).is_none());
    }

    #[test]
    fn internal_properties_render_as_a_separate_internal_bucket() {
        let store = VariableStore::new();
        let mut next_reference = 10i64;
        let internal = [InternalPropertyDescriptor {
            name: "[[Prototype]]".to_string(),
            value: Some(RemoteObject {
                type_: "object".to_string(),
                class_name: Some("Object".to_string()),
                description: Some("Object".to_string()),
                object_id: Some("proto1".to_string()),
                ..Default::default()
            }),
        }];
        let rendered = store.render_internal_properties(&internal, &mut || {
            next_reference += 1;
            next_reference
        });

        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].name, "[[Prototype]]");
        assert_eq!(rendered[0].value, "Object");
        assert_eq!(
            rendered[0].presentation_hint.as_ref().unwrap().kind.as_deref(),
            Some("internal")
        );
        assert_ne!(rendered[0].variables_reference, 0);
        assert!(matches!(store.handle(rendered[0].variables_reference), Some(VariableHandle::Object { .. })));
    }

    #[test]
    fn internal_property_with_no_object_id_gets_no_reference() {
        let store = VariableStore::new();
        let internal = [InternalPropertyDescriptor {
            name: "[[PromiseStatus]]".to_string(),
            value: Some(RemoteObject {
                type_: "string".to_string(),
                value: Some(serde_json::Value::String("pending".to_string())),
                ..Default::default()
            }),
        }];
        let rendered = store.render_internal_properties(&internal, &mut || 1);
        assert_eq!(rendered[0].value, "pending");
        assert_eq!(rendered[0].variables_reference, 0);
    }
}
