//! Builds the styled report tree rendered by the plain and rich formatters.

use super::{status_style, Line, Node, Style};
use crate::resource::{
    AmphoraEntry, AmphoraReport, LbReport, ListenerReport, MemberReport, PoolReport, Raw,
};
use serde_json::Value;

/// Build the listener/pool/member tree for one load balancer.
pub fn lb_tree(report: &LbReport, details: bool) -> Node {
    let mut root = Node::new(lb_line(&report.lb.item));
    if details {
        add_detail_nodes(&mut root, &report.lb.attrs);
    }

    if report.listeners.is_empty() {
        root.add(missing("Listener"));
    }
    for listener in &report.listeners {
        add_listener(&mut root, listener, details);
    }

    root
}

/// Build the amphora tree for one load balancer.
pub fn amphora_tree(report: &AmphoraReport, details: bool) -> Node {
    let mut root = Node::new(lb_line(&report.lb.item));
    if details {
        add_detail_nodes(&mut root, &report.lb.attrs);
    }

    for entry in &report.amphorae {
        add_amphora(&mut root, entry, details);
    }

    root
}

fn lb_line(lb: &crate::resource::LoadBalancer) -> Line {
    let mut line = Line::default();
    line.push("LB:", Style::Default);
    line.push(format!(" {}", lb.id), Style::BrightYellow);
    line.push(" vip:", Style::Default);
    line.push(
        lb.vip_address.clone().unwrap_or_else(|| "N/A".to_string()),
        Style::BrightCyan,
    );
    push_statuses(&mut line, &lb.provisioning_status, &lb.operating_status);
    line.push(" tags:", Style::Default);
    line.push(format!("{:?}", lb.tags), Style::Magenta);
    line
}

fn add_listener(root: &mut Node, report: &ListenerReport, details: bool) {
    let Some(listener) = &report.listener else {
        root.add(missing("Listener"));
        return;
    };

    let l = &listener.item;
    let mut line = Line::default();
    line.push("Listener:", Style::BoldGreen);
    line.push(format!(" {}", l.id), Style::BoldWhite);
    line.push(
        format!(" ({})", l.name.as_deref().unwrap_or("")),
        Style::BoldBlue,
    );
    line.push(" port:", Style::Default);
    line.push(format!("{}/{}", l.protocol, l.protocol_port), Style::Cyan);
    push_statuses(&mut line, &l.provisioning_status, &l.operating_status);

    let node = root.add(Node::new(line));
    if details {
        add_detail_nodes(node, &listener.attrs);
    }

    match &report.pool {
        Some(pool) => add_pool(node, pool, details),
        None => {
            node.add(missing("Pool"));
        }
    }
}

fn add_pool(parent: &mut Node, report: &PoolReport, details: bool) {
    let p = &report.pool.item;
    let mut line = Line::default();
    line.push("Pool:", Style::BoldGreen);
    line.push(format!(" {}", p.id), Style::BoldWhite);
    line.push(" protocol:", Style::Default);
    line.push(p.protocol.clone(), Style::Magenta);
    line.push(" algorithm:", Style::Default);
    line.push(p.lb_algorithm.clone(), Style::Magenta);
    push_statuses(&mut line, &p.provisioning_status, &p.operating_status);
    line.push(" number_members:", Style::Default);
    line.push(p.members.len().to_string(), Style::Cyan);

    let node = parent.add(Node::new(line));
    if details {
        add_detail_nodes(node, &report.pool.attrs);
    }

    match &report.health_monitor {
        Some(monitor) => add_health_monitor(node, monitor, details),
        None => {
            node.add(missing("Health Monitor"));
        }
    }

    // None here means member fetching was disabled, not an empty pool
    if let Some(members) = &report.members {
        if members.is_empty() {
            node.add(missing("Member"));
        }
        for member in members {
            add_member(node, member, details);
        }
    }
}

fn add_health_monitor(root: &mut Node, monitor: &Raw<crate::resource::HealthMonitor>, details: bool) {
    let hm = &monitor.item;
    let mut line = Line::default();
    line.push("Health Monitor:", Style::BoldGreen);
    line.push(format!(" {}", hm.id), Style::BoldWhite);
    line.push(" type:", Style::Default);
    line.push(hm.monitor_type.clone(), Style::Magenta);
    line.push(" http_method:", Style::Default);
    line.push(opt(&hm.http_method), Style::Magenta);
    line.push(" http_codes:", Style::Default);
    line.push(opt(&hm.expected_codes), Style::Magenta);
    line.push(" url_path:", Style::Default);
    line.push(opt(&hm.url_path), Style::Magenta);
    push_statuses(&mut line, &hm.provisioning_status, &hm.operating_status);

    let node = root.add(Node::new(line));
    if details {
        add_detail_nodes(node, &monitor.attrs);
    }
}

fn add_member(root: &mut Node, report: &MemberReport, details: bool) {
    let Some(member) = &report.member else {
        root.add(missing("Member"));
        return;
    };

    let m = &member.item;
    let mut line = Line::default();
    line.push("Member:", Style::BoldGreen);
    line.push(format!(" {}", m.id), Style::BoldWhite);
    line.push(" IP:", Style::Default);
    line.push(m.address.clone(), Style::Magenta);
    line.push(" port:", Style::Default);
    line.push(m.protocol_port.to_string(), Style::Magenta);
    line.push(" weight:", Style::Default);
    line.push(m.weight.to_string(), Style::Magenta);
    line.push(" backup:", Style::Default);
    line.push(m.backup.to_string(), Style::Magenta);
    push_statuses(&mut line, &m.provisioning_status, &m.operating_status);

    let node = root.add(Node::new(line));
    if details {
        add_detail_nodes(node, &member.attrs);
    }
}

fn add_amphora(root: &mut Node, entry: &AmphoraEntry, details: bool) {
    let a = &entry.amphora.item;
    let (server_id, flavor_name, compute_host) = match &entry.server {
        Some(server) => (
            server.item.id.clone(),
            server.item.flavor_name().to_string(),
            server
                .item
                .compute_host
                .clone()
                .unwrap_or_else(|| "N/A".to_string()),
        ),
        None => ("N/A".to_string(), "N/A".to_string(), "N/A".to_string()),
    };

    let mut line = Line::default();
    line.push("amphora: ", Style::BoldGreen);
    line.push(format!("{} ", a.id), Style::BoldWhite);
    line.push(
        format!("{} {}", opt(&a.role), opt(&a.status)),
        Style::Default,
    );
    line.push(" lb_network_ip:", Style::Default);
    line.push(opt(&a.lb_network_ip), Style::Green);
    line.push(" img:", Style::Default);
    line.push(
        entry.image_name.clone().unwrap_or_else(|| "N/A".to_string()),
        Style::Magenta,
    );
    line.push(" server:", Style::Default);
    line.push(server_id, Style::Magenta);
    line.push(" vm_flavor:", Style::Default);
    line.push(flavor_name, Style::Magenta);
    line.push(" compute host:(", Style::Default);
    line.push(compute_host, Style::Magenta);
    line.push(")", Style::Default);

    let node = root.add(Node::new(line));
    if details {
        add_detail_nodes(node, &entry.amphora.attrs);
    }
}

fn push_statuses(line: &mut Line, provisioning: &str, operating: &str) {
    line.push(" prov_status:", Style::Default);
    line.push(provisioning.to_string(), status_style(provisioning));
    line.push(" oper_status:", Style::Default);
    line.push(operating.to_string(), status_style(operating));
}

fn opt(value: &Option<String>) -> String {
    value.clone().unwrap_or_else(|| "None".to_string())
}

/// Placeholder node for a resource that is absent or was not found.
fn missing(label: &str) -> Node {
    let mut line = Line::default();
    line.push(format!("{}:", label), Style::BoldGreen);
    line.push(" None", Style::Default);
    Node::new(line)
}

/// Append one `attr: value` child per raw attribute, sorted by name.
fn add_detail_nodes(node: &mut Node, attrs: &Value) {
    let Value::Object(map) = attrs else {
        return;
    };

    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    for key in keys {
        let value = &map[key];
        node.add(Node::new(Line::plain(format!(
            "{}: {}",
            key,
            detail_value(value)
        ))));
    }
}

fn detail_value(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
