//! JSON rendering: one document per load balancer, made of the raw resource
//! payloads tagged with `type` and nested through `children`.

use crate::resource::{AmphoraReport, LbReport, ListenerReport, MemberReport, PoolReport};
use serde_json::{json, Map, Value};

pub fn render_lb(report: &LbReport) -> String {
    let mut root = node_from(&report.lb.attrs, "loadbalancer");

    let children = children_of(&mut root);
    if report.listeners.is_empty() {
        children.push(empty_node("listener"));
    }
    for listener in &report.listeners {
        children.push(listener_node(listener));
    }

    pretty(&Value::Object(root))
}

pub fn render_amphorae(report: &AmphoraReport) -> String {
    let mut root = node_from(&report.lb.attrs, "loadbalancer");

    let children = children_of(&mut root);
    for entry in &report.amphorae {
        let mut node = node_from(&entry.amphora.attrs, "amphora");
        node.insert(
            "image_name".to_string(),
            entry
                .image_name
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        );
        node.insert(
            "server_details".to_string(),
            match &entry.server {
                Some(server) => json!({
                    "id": server.item.id,
                    "flavor": server.item.flavor_name(),
                    "compute_host": server.item.compute_host,
                }),
                None => Value::Null,
            },
        );
        children.push(Value::Object(node));
    }

    pretty(&Value::Object(root))
}

pub fn render_message(message: &str) -> String {
    pretty(&json!({ "message": message }))
}

fn listener_node(report: &ListenerReport) -> Value {
    let Some(listener) = &report.listener else {
        return empty_node("listener");
    };

    let mut node = node_from(&listener.attrs, "listener");
    let children = children_of(&mut node);
    match &report.pool {
        Some(pool) => children.push(pool_node(pool)),
        None => children.push(empty_node("pool")),
    }

    Value::Object(node)
}

fn pool_node(report: &PoolReport) -> Value {
    let mut node = node_from(&report.pool.attrs, "pool");
    let children = children_of(&mut node);

    match &report.health_monitor {
        Some(monitor) => children.push(node_value(&monitor.attrs, "health_monitor")),
        None => children.push(empty_node("health_monitor")),
    }

    // Member children are omitted entirely when fetching was disabled
    if let Some(members) = &report.members {
        if members.is_empty() {
            children.push(empty_node("member"));
        }
        for member in members {
            children.push(member_node(member));
        }
    }

    Value::Object(node)
}

fn member_node(report: &MemberReport) -> Value {
    match &report.member {
        Some(member) => node_value(&member.attrs, "member"),
        None => empty_node("member"),
    }
}

/// Copy the raw payload into an object tagged with `type` and an empty
/// `children` list.
fn node_from(attrs: &Value, node_type: &str) -> Map<String, Value> {
    let mut node = match attrs {
        Value::Object(map) => map.clone(),
        _ => Map::new(),
    };
    node.insert("type".to_string(), Value::String(node_type.to_string()));
    // A payload-provided `children` attribute would collide with the report
    // nesting; the report owns this key
    node.insert("children".to_string(), Value::Array(vec![]));
    node
}

fn node_value(attrs: &Value, node_type: &str) -> Value {
    Value::Object(node_from(attrs, node_type))
}

/// Placeholder `{"<name>": null}` for a resource that is absent or not found.
fn empty_node(name: &str) -> Value {
    json!({ name: Value::Null })
}

fn children_of(node: &mut Map<String, Value>) -> &mut Vec<Value> {
    node.get_mut("children")
        .and_then(|v| v.as_array_mut())
        .expect("children array inserted by node_from")
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}
