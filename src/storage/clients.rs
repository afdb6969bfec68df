//! Client repository

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{Client, ClientId, ClientKind};

use super::{bool_to_int, map_constraint, parse_column, resolve_id_prefix};

const CLIENT_SELECT_SQL: &str = "SELECT
    id, kind, name, id_number, vat_number, address, phone, email, active, created_at
FROM clients";

fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: row.get(0)?,
        kind: parse_column(row, 1, ClientKind::parse)?,
        name: row.get(2)?,
        id_number: row.get(3)?,
        vat_number: row.get(4)?,
        address: row.get(5)?,
        phone: row.get(6)?,
        email: row.get(7)?,
        active: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// SQLite-backed client repository
pub struct ClientRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ClientRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert(&self, client: &Client) -> CheckdeskResult<()> {
        client
            .validate()
            .map_err(|e| CheckdeskError::Validation(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO clients (
                    id, kind, name, id_number, vat_number, address, phone, email, active, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    client.id,
                    client.kind.as_str(),
                    client.name,
                    client.id_number,
                    client.vat_number,
                    client.address,
                    client.phone,
                    client.email,
                    bool_to_int(client.active),
                    client.created_at,
                ],
            )
            .map_err(|e| map_constraint(e, "Client", &client.name))?;
        Ok(())
    }

    pub fn update(&self, client: &Client) -> CheckdeskResult<()> {
        client
            .validate()
            .map_err(|e| CheckdeskError::Validation(e.to_string()))?;

        let changed = self
            .conn
            .execute(
                "UPDATE clients
                 SET kind = ?1, name = ?2, id_number = ?3, vat_number = ?4,
                     address = ?5, phone = ?6, email = ?7, active = ?8
                 WHERE id = ?9",
                params![
                    client.kind.as_str(),
                    client.name,
                    client.id_number,
                    client.vat_number,
                    client.address,
                    client.phone,
                    client.email,
                    bool_to_int(client.active),
                    client.id,
                ],
            )
            .map_err(|e| map_constraint(e, "Client", &client.name))?;

        if changed == 0 {
            return Err(CheckdeskError::client_not_found(client.id.to_string()));
        }
        Ok(())
    }

    pub fn get(&self, id: ClientId) -> CheckdeskResult<Option<Client>> {
        let client = self
            .conn
            .query_row(
                &format!("{CLIENT_SELECT_SQL} WHERE id = ?1"),
                [id],
                client_from_row,
            )
            .optional()?;
        Ok(client)
    }

    /// Clients ordered by name, optionally of one kind
    pub fn list(&self, kind: Option<ClientKind>, include_inactive: bool) -> CheckdeskResult<Vec<Client>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CLIENT_SELECT_SQL}
             WHERE (?1 IS NULL OR kind = ?1)
               AND (?2 = 1 OR active = 1)
             ORDER BY name COLLATE NOCASE"
        ))?;
        let clients = stmt
            .query_map(
                params![kind.map(|k| k.as_str()), bool_to_int(include_inactive)],
                client_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(clients)
    }

    /// Exact case-insensitive name match; the oldest client wins on ties
    pub fn find_by_name(&self, name: &str) -> CheckdeskResult<Option<Client>> {
        let client = self
            .conn
            .query_row(
                &format!(
                    "{CLIENT_SELECT_SQL} WHERE name = ?1 COLLATE NOCASE ORDER BY created_at LIMIT 1"
                ),
                [name.trim()],
                client_from_row,
            )
            .optional()?;
        Ok(client)
    }

    /// Substring search on name and identity number
    pub fn search(&self, term: &str, limit: usize) -> CheckdeskResult<Vec<Client>> {
        let pattern = format!("%{}%", escape_like(term.trim()));
        let mut stmt = self.conn.prepare(&format!(
            "{CLIENT_SELECT_SQL}
             WHERE active = 1
               AND (name LIKE ?1 ESCAPE '\\' OR id_number LIKE ?1 ESCAPE '\\')
             ORDER BY name COLLATE NOCASE
             LIMIT ?2"
        ))?;
        let clients = stmt
            .query_map(params![pattern, limit as i64], client_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(clients)
    }

    pub fn resolve(&self, input: &str) -> CheckdeskResult<Option<ClientId>> {
        resolve_id_prefix(self.conn, "clients", ClientId::strip_display_prefix(input))
    }

    pub fn check_count(&self, id: ClientId) -> CheckdeskResult<u64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM checks WHERE client_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// Escape LIKE wildcards in user input
pub(crate) fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
