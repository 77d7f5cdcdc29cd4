// Connection registry: live connections in arrival order, each with the
// identity it announced (if any).

use lobby_common::protocol::ws::ServerMessage;
use lobby_common::types::UserIdentity;
use tokio::sync::mpsc;

use super::ConnId;

/// One open client connection.
///
/// The registry holds the outbound sender only for addressing; the socket
/// task owns the transport itself.
#[derive(Debug)]
pub struct Connection {
    pub id: ConnId,
    pub sender: mpsc::UnboundedSender<ServerMessage>,
    pub identity: Option<UserIdentity>,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: Vec<Connection>,
}

impl ConnectionRegistry {
    /// Track a newly opened connection. Duplicate ids are ignored.
    pub fn attach(&mut self, id: ConnId, sender: mpsc::UnboundedSender<ServerMessage>) {
        if self.find(id).is_none() {
            self.connections.push(Connection { id, sender, identity: None });
        }
    }

    /// Bind an identity to a connection. The first successful binding is
    /// authoritative; repeated bindings and unknown connections return false.
    pub fn register(&mut self, id: ConnId, identity: UserIdentity) -> bool {
        match self.find_mut(id) {
            Some(connection) if connection.identity.is_none() => {
                connection.identity = Some(identity);
                true
            }
            _ => false,
        }
    }

    pub fn identity_of(&self, id: ConnId) -> Option<&UserIdentity> {
        self.find(id).and_then(|connection| connection.identity.as_ref())
    }

    pub fn sender_of(&self, id: ConnId) -> Option<&mpsc::UnboundedSender<ServerMessage>> {
        self.find(id).map(|connection| &connection.sender)
    }

    /// Drop a connection, returning the identity that was bound to it so the
    /// caller can clean up dependent state. Unknown connections are a no-op.
    pub fn detach(&mut self, id: ConnId) -> Option<UserIdentity> {
        let index = self.connections.iter().position(|connection| connection.id == id)?;
        self.connections.remove(index).identity
    }

    /// Open connections in arrival order, used for broadcast fan-out.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Connections that have completed their identity announcement.
    pub fn identified_count(&self) -> usize {
        self.connections.iter().filter(|connection| connection.identity.is_some()).count()
    }

    fn find(&self, id: ConnId) -> Option<&Connection> {
        self.connections.iter().find(|connection| connection.id == id)
    }

    fn find_mut(&mut self, id: ConnId) -> Option<&mut Connection> {
        self.connections.iter_mut().find(|connection| connection.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(id: &str, name: &str) -> UserIdentity {
        UserIdentity {
            id: id.to_string(),
            name: name.to_string(),
            avatar: None,
            display_roles: Vec::new(),
        }
    }

    fn attach_one(registry: &mut ConnectionRegistry) -> ConnId {
        let id = ConnId::new();
        let (sender, _receiver) = mpsc::unbounded_channel();
        registry.attach(id, sender);
        id
    }

    #[test]
    fn connections_keep_arrival_order() {
        let mut registry = ConnectionRegistry::default();
        let first = attach_one(&mut registry);
        let second = attach_one(&mut registry);
        let third = attach_one(&mut registry);

        let order: Vec<ConnId> =
            registry.connections().iter().map(|connection| connection.id).collect();
        assert_eq!(order, vec![first, second, third]);
    }

    #[test]
    fn first_registration_wins() {
        let mut registry = ConnectionRegistry::default();
        let conn = attach_one(&mut registry);

        assert!(registry.register(conn, identity("u1", "Alice")));
        assert!(!registry.register(conn, identity("u9", "Impostor")));

        let bound = registry.identity_of(conn).expect("identity should be bound");
        assert_eq!(bound.id, "u1");
        assert_eq!(bound.name, "Alice");
    }

    #[test]
    fn register_unknown_connection_is_rejected() {
        let mut registry = ConnectionRegistry::default();
        assert!(!registry.register(ConnId::new(), identity("u1", "Alice")));
    }

    #[test]
    fn detach_returns_bound_identity() {
        let mut registry = ConnectionRegistry::default();
        let conn = attach_one(&mut registry);
        registry.register(conn, identity("u1", "Alice"));

        let detached = registry.detach(conn).expect("detach should return the identity");
        assert_eq!(detached.id, "u1");
        assert!(registry.is_empty());
    }

    #[test]
    fn detach_before_hello_returns_none() {
        let mut registry = ConnectionRegistry::default();
        let conn = attach_one(&mut registry);
        assert_eq!(registry.detach(conn), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn detach_unknown_connection_is_a_no_op() {
        let mut registry = ConnectionRegistry::default();
        attach_one(&mut registry);
        assert_eq!(registry.detach(ConnId::new()), None);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn attach_is_idempotent_per_connection() {
        let mut registry = ConnectionRegistry::default();
        let conn = ConnId::new();
        let (sender, _receiver) = mpsc::unbounded_channel();
        registry.attach(conn, sender.clone());
        registry.attach(conn, sender);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn identified_count_ignores_pre_hello_connections() {
        let mut registry = ConnectionRegistry::default();
        let conn = attach_one(&mut registry);
        attach_one(&mut registry);
        registry.register(conn, identity("u1", "Alice"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.identified_count(), 1);
    }
}
