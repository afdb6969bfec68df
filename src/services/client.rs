//! Client service
//!
//! Clients are the payers of the checks. Names are not unique; identity
//! numbers and e-mail/phone shape are validated by the model.

use log::info;

use crate::audit::EntityType;
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{Client, ClientId, ClientKind};
use crate::storage::Storage;

/// Default number of results for [`ClientService::search`]
pub const SEARCH_LIMIT: usize = 10;

/// Optional client fields, used by both create and update
#[derive(Debug, Clone, Default)]
pub struct ClientFields {
    pub name: Option<String>,
    pub kind: Option<ClientKind>,
    pub id_number: Option<String>,
    pub vat_number: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl ClientFields {
    fn apply(self, client: &mut Client) {
        if let Some(name) = self.name {
            client.name = name.trim().to_string();
        }
        if let Some(kind) = self.kind {
            client.kind = kind;
        }
        if let Some(v) = self.id_number {
            client.id_number = v.trim().to_string();
        }
        if let Some(v) = self.vat_number {
            client.vat_number = v.trim().to_string();
        }
        if let Some(v) = self.address {
            client.address = v.trim().to_string();
        }
        if let Some(v) = self.phone {
            client.phone = v.trim().to_string();
        }
        if let Some(v) = self.email {
            client.email = v.trim().to_string();
        }
    }
}

/// Service for client management
pub struct ClientService<'a> {
    storage: &'a Storage,
}

impl<'a> ClientService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new client
    pub fn create(&self, name: &str, kind: ClientKind, fields: ClientFields) -> CheckdeskResult<Client> {
        let mut client = Client::new(name, kind);
        fields.apply(&mut client);

        self.storage.clients().insert(&client)?;
        self.storage.log_create(
            EntityType::Client,
            client.id.to_string(),
            Some(client.name.clone()),
            &client,
        )?;
        info!("event=client_create status=ok id={}", client.id);

        Ok(client)
    }

    pub fn update(&self, id: ClientId, fields: ClientFields) -> CheckdeskResult<Client> {
        let mut client = self.get_required(id)?;
        let before = client.clone();
        fields.apply(&mut client);

        self.storage.clients().update(&client)?;
        self.storage.log_update(
            EntityType::Client,
            client.id.to_string(),
            Some(client.name.clone()),
            &before,
            &client,
        )?;

        Ok(client)
    }

    /// Deactivate a client that no check references
    pub fn deactivate(&self, id: ClientId) -> CheckdeskResult<Client> {
        let mut client = self.get_required(id)?;
        let referenced = self.storage.clients().check_count(id)?;
        if referenced > 0 {
            return Err(CheckdeskError::Validation(format!(
                "Client '{}' is referenced by {} check(s) and cannot be removed",
                client.name, referenced
            )));
        }
        if !client.active {
            return Ok(client);
        }

        let before = client.clone();
        client.active = false;
        self.storage.clients().update(&client)?;
        self.storage.log_update(
            EntityType::Client,
            client.id.to_string(),
            Some(client.name.clone()),
            &before,
            &client,
        )?;
        info!("event=client_deactivate status=ok id={}", client.id);

        Ok(client)
    }

    pub fn get(&self, id: ClientId) -> CheckdeskResult<Option<Client>> {
        self.storage.clients().get(id)
    }

    fn get_required(&self, id: ClientId) -> CheckdeskResult<Client> {
        self.storage
            .clients()
            .get(id)?
            .ok_or_else(|| CheckdeskError::client_not_found(id.to_string()))
    }

    pub fn list(&self, kind: Option<ClientKind>, include_inactive: bool) -> CheckdeskResult<Vec<Client>> {
        self.storage.clients().list(kind, include_inactive)
    }

    /// Active clients whose name or identity number contains `term`
    pub fn search(&self, term: &str) -> CheckdeskResult<Vec<Client>> {
        self.storage.clients().search(term, SEARCH_LIMIT)
    }

    /// Find a client by exact name or id
    pub fn find(&self, identifier: &str) -> CheckdeskResult<Option<Client>> {
        if let Some(client) = self.storage.clients().find_by_name(identifier)? {
            return Ok(Some(client));
        }
        match self.storage.clients().resolve(identifier)? {
            Some(id) => self.storage.clients().get(id),
            None => Ok(None),
        }
    }

    pub fn find_required(&self, identifier: &str) -> CheckdeskResult<Client> {
        self.find(identifier)?
            .ok_or_else(|| CheckdeskError::client_not_found(identifier))
    }

    /// Return the client named `name`, creating an individual client if none
    pub fn find_or_create(&self, name: &str, fields: ClientFields) -> CheckdeskResult<Client> {
        if let Some(client) = self.storage.clients().find_by_name(name)? {
            return Ok(client);
        }
        let kind = fields.kind.unwrap_or_default();
        self.create(name, kind, fields)
    }
}
