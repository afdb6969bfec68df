//! Client display formatting

use tabled::Tabled;

use crate::models::Client;

use super::report::{or_dash, render};

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "ID Number")]
    id_number: String,
    #[tabled(rename = "Phone")]
    phone: String,
    #[tabled(rename = "Email")]
    email: String,
}

pub fn format_client_list(clients: &[Client]) -> String {
    if clients.is_empty() {
        return "No clients found.".to_string();
    }

    let rows = clients
        .iter()
        .map(|client| ClientRow {
            id: client.id.to_string(),
            name: if client.active {
                client.name.clone()
            } else {
                format!("{} (inactive)", client.name)
            },
            kind: client.kind.to_string(),
            id_number: or_dash(&client.id_number).to_string(),
            phone: or_dash(&client.phone).to_string(),
            email: or_dash(&client.email).to_string(),
        })
        .collect();
    render(rows, &[])
}

pub fn format_client_details(client: &Client, check_count: u64) -> String {
    let mut output = String::new();
    output.push_str(&format!("Client: {}\n", client.name));
    output.push_str(&format!("  ID:         {}\n", client.id));
    output.push_str(&format!("  Kind:       {}\n", client.kind));
    output.push_str(&format!("  ID number:  {}\n", or_dash(&client.id_number)));
    output.push_str(&format!("  VAT number: {}\n", or_dash(&client.vat_number)));
    output.push_str(&format!("  Address:    {}\n", or_dash(&client.address)));
    output.push_str(&format!("  Phone:      {}\n", or_dash(&client.phone)));
    output.push_str(&format!("  Email:      {}\n", or_dash(&client.email)));
    output.push_str(&format!(
        "  Status:     {}\n",
        if client.active { "Active" } else { "Inactive" }
    ));
    output.push_str(&format!("  Checks:     {}\n", check_count));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ClientKind;

    #[test]
    fn test_client_list_and_details() {
        let mut client = Client::new("Atlas SARL", ClientKind::Company);
        client.phone = "0522000000".into();

        let list = format_client_list(&[client.clone()]);
        assert!(list.contains("Atlas SARL"));
        assert!(list.contains("0522000000"));

        let details = format_client_details(&client, 4);
        assert!(details.contains("Checks:     4"));
        assert!(details.contains("VAT number: -"));
    }
}
