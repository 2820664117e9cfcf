//! Store inspection and provisioning commands.

use std::sync::Arc;

use keygate_api::config::BootstrapClient;
use keygate_api::services::bootstrap::{ensure_bootstrap_client, open_store};
use keygate_core::models::auth::Identity;
use keygate_core::store::CredentialStore;

use crate::Result;
use crate::cli::StoreArgs;

async fn open(args: &StoreArgs) -> Result<Arc<dyn CredentialStore>> {
    log::debug!("opening store {}", args.database_url);
    Ok(open_store(Some(&args.database_url), 1).await?)
}

fn role_list(identity: &Identity) -> String {
    let names = identity.role_names();
    if names.is_empty() {
        "None".to_string()
    } else {
        names.join(",")
    }
}

pub async fn bootstrap_client(args: &StoreArgs, client: BootstrapClient) -> Result<()> {
    let store = open(args).await?;
    let identity = ensure_bootstrap_client(store.as_ref(), &client).await?;
    println!("client {} holds {}", identity.client_id, role_list(&identity));
    Ok(())
}

pub async fn users(args: &StoreArgs) -> Result<()> {
    let identities = open(args).await?.list_identities().await?;
    if identities.is_empty() {
        println!("No users found.");
        return Ok(());
    }
    println!(
        "{:<15} {:<25} {:<15} {:<6} {:<20} Created",
        "Username", "Email", "Client ID", "Active", "Roles"
    );
    for identity in &identities {
        println!(
            "{:<15} {:<25} {:<15} {:<6} {:<20} {}",
            identity.username,
            identity.email,
            identity.client_id,
            identity.is_active,
            role_list(identity),
            identity.created_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }
    Ok(())
}

pub async fn roles(args: &StoreArgs) -> Result<()> {
    for role in open(args).await?.list_roles().await? {
        let permissions: Vec<&str> = role.permissions.iter().map(|p| p.name.as_str()).collect();
        println!("{}: {}", role.name, permissions.join(", "));
    }
    Ok(())
}

pub async fn permissions(args: &StoreArgs) -> Result<()> {
    println!("{:<15} {:<10} {:<10} Description", "Name", "Resource", "Action");
    for p in open(args).await?.list_permissions().await? {
        println!(
            "{:<15} {:<10} {:<10} {}",
            p.name,
            p.resource,
            p.action,
            p.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub async fn user_perms(args: &StoreArgs, username: Option<&str>) -> Result<()> {
    let identities = open(args).await?.list_identities().await?;
    let mut printed = false;
    for identity in identities
        .iter()
        .filter(|i| username.is_none_or(|u| i.username == u))
    {
        let mut grants: Vec<(&str, &str)> = identity
            .roles
            .iter()
            .flat_map(|role| {
                role.permissions
                    .iter()
                    .map(move |p| (p.name.as_str(), role.name.as_str()))
            })
            .collect();
        if grants.is_empty() {
            continue;
        }
        grants.sort_unstable();
        println!("User: {}", identity.username);
        for (permission, role) in grants {
            println!("  - {permission} (via {role} role)");
        }
        printed = true;
    }
    if !printed {
        match username {
            Some(u) => println!("No permissions found for user {u}."),
            None => println!("No permissions found."),
        }
    }
    Ok(())
}
