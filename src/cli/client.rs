//! Client CLI commands

use clap::{Args, Subcommand};

use crate::display::{format_client_details, format_client_list};
use crate::error::{CheckdeskError, CheckdeskResult};
use crate::models::{ClientKind, Permission};
use crate::services::client::ClientFields;
use crate::services::ClientService;

use super::CliContext;

/// Identity and contact fields
#[derive(Args, Default)]
pub struct ClientArgs {
    /// National ID (CIN) or company registration number
    #[arg(long)]
    pub id_number: Option<String>,
    /// VAT / ICE number
    #[arg(long)]
    pub vat_number: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
}

impl ClientArgs {
    fn into_fields(self, name: Option<String>, kind: Option<ClientKind>) -> ClientFields {
        ClientFields {
            name,
            kind,
            id_number: self.id_number,
            vat_number: self.vat_number,
            address: self.address,
            phone: self.phone,
            email: self.email,
        }
    }
}

/// Client subcommands
#[derive(Subcommand)]
pub enum ClientCommands {
    /// Register a client
    Create {
        name: String,
        /// individual or company
        #[arg(short, long, default_value = "individual")]
        kind: String,
        #[command(flatten)]
        fields: ClientArgs,
    },
    /// List clients
    List {
        /// Only this kind (individual or company)
        #[arg(short, long)]
        kind: Option<String>,
        /// Include inactive clients
        #[arg(short, long)]
        all: bool,
    },
    /// Search clients by name or ID number
    Search { term: String },
    /// Show client details
    Show {
        /// Client name or ID
        client: String,
    },
    /// Edit a client
    Edit {
        client: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        kind: Option<String>,
        #[command(flatten)]
        fields: ClientArgs,
    },
    /// Deactivate a client no check refers to
    #[command(alias = "remove")]
    Deactivate { client: String },
}

fn parse_kind(kind: &str) -> CheckdeskResult<ClientKind> {
    ClientKind::parse(kind).ok_or_else(|| {
        CheckdeskError::Validation(format!(
            "Invalid client kind: '{}'. Valid kinds: individual, company",
            kind
        ))
    })
}

pub fn handle_client_command(ctx: &CliContext, cmd: ClientCommands) -> CheckdeskResult<()> {
    let service = ClientService::new(&ctx.storage);

    match cmd {
        ClientCommands::Create { name, kind, fields } => {
            ctx.require(Permission::ClientCreate)?;
            let kind = parse_kind(&kind)?;
            let client = service.create(&name, kind, fields.into_fields(None, None))?;
            println!("Created client: {}", client.name);
            println!("  Kind: {}", client.kind);
            println!("  ID: {}", client.id);
        }

        ClientCommands::List { kind, all } => {
            ctx.require(Permission::ClientRead)?;
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            println!("{}", format_client_list(&service.list(kind, all)?));
        }

        ClientCommands::Search { term } => {
            ctx.require(Permission::ClientRead)?;
            println!("{}", format_client_list(&service.search(&term)?));
        }

        ClientCommands::Show { client } => {
            ctx.require(Permission::ClientRead)?;
            let client = service.find_required(&client)?;
            let check_count = ctx.storage.clients().check_count(client.id)?;
            print!("{}", format_client_details(&client, check_count));
        }

        ClientCommands::Edit {
            client,
            name,
            kind,
            fields,
        } => {
            ctx.require(Permission::ClientUpdate)?;
            let found = service.find_required(&client)?;
            let kind = kind.as_deref().map(parse_kind).transpose()?;
            let updated = service.update(found.id, fields.into_fields(name, kind))?;
            println!("Updated client: {}", updated.name);
        }

        ClientCommands::Deactivate { client } => {
            ctx.require(Permission::ClientDelete)?;
            let found = service.find_required(&client)?;
            let client = service.deactivate(found.id)?;
            println!("Deactivated client: {}", client.name);
        }
    }

    Ok(())
}
