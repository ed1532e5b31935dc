//! Mapping from Docker API models to engine types

use bollard::models::{ContainerInspectResponse, EventMessage, EventMessageTypeEnum};
use havok_core::{ContainerDetails, ContainerEvent, EventStatus, PortBinding};
use std::collections::BTreeMap;

/// Turn a Docker event into a container lifecycle event.
///
/// Events for other object types, or without an actor id, are dropped.
pub fn event_from_message(message: EventMessage) -> Option<ContainerEvent> {
    if let Some(typ) = message.typ {
        if typ != EventMessageTypeEnum::CONTAINER {
            return None;
        }
    }

    let id = message.actor.and_then(|actor| actor.id)?;
    let action = message.action.unwrap_or_default();
    Some(ContainerEvent::new(id, EventStatus::parse(&action)))
}

/// Collect the fields the engine needs from an inspect response
pub fn details_from_inspect(id: &str, response: ContainerInspectResponse) -> ContainerDetails {
    let name = response
        .name
        .unwrap_or_default()
        .trim_start_matches('/')
        .to_string();

    let (hostname, domainname) = response
        .config
        .map(|c| (c.hostname.unwrap_or_default(), c.domainname.unwrap_or_default()))
        .unwrap_or_default();

    let ports: BTreeMap<String, Vec<PortBinding>> = response
        .network_settings
        .and_then(|n| n.ports)
        .unwrap_or_default()
        .into_iter()
        .map(|(port, bindings)| {
            let bindings = bindings
                .unwrap_or_default()
                .into_iter()
                .filter_map(|b| {
                    b.host_port.map(|host_port| PortBinding {
                        host_ip: b.host_ip,
                        host_port,
                    })
                })
                .collect();
            (port, bindings)
        })
        .collect();

    ContainerDetails {
        id: response.id.unwrap_or_else(|| id.to_string()),
        name,
        hostname,
        domainname,
        ports,
    }
}
