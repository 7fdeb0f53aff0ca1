//! Evaluate menu access for one user against the JSON snapshot directory.
//!
//! ```text
//! menugate-inspect tree <user>
//! menugate-inspect accessible <user>
//! menugate-inspect permissions <user> [menu]
//! menugate-inspect check <user> <menu> <capability>
//! menugate-inspect explain <user> <menu> <capability>
//! menugate-inspect search <user> [title] [--target <path>]
//! ```

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde_json::json;

use menugate_auth::{Capability, MenuAuthorizationService};
use menugate_core::UserId;
use menugate_infra::{JsonSnapshotStore, SnapshotConfig};
use menugate_menu::MenuQuery;
use menugate_observability::LogConfig;

const USAGE: &str = "usage: menugate-inspect <tree|accessible|permissions|check|explain|search> <user> [menu|title] [capability|--target <path>]";

fn main() -> Result<()> {
    menugate_observability::init(&LogConfig::from_env());

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [command, user, rest @ ..] = args.as_slice() else {
        bail!(USAGE);
    };
    let user: UserId = user.parse().context("invalid user id")?;

    let config = SnapshotConfig::from_env();
    tracing::info!(dir = %config.dir.display(), %command, user_id = %user, "inspecting");

    let store = Arc::new(JsonSnapshotStore::from_config(&config));
    let service = MenuAuthorizationService::new(store.clone(), store.clone(), store);

    let output = match (command.as_str(), rest) {
        ("tree", []) => serde_json::to_value(service.full_tree_with_permissions(&user)?.to_tree())?,
        ("accessible", []) => serde_json::to_value(service.accessible_tree(&user)?.to_tree())?,
        ("permissions", []) => {
            let ctx = service.context(&user)?;
            let rows: Vec<_> = ctx
                .permissions()
                .iter()
                .filter(|(menu_id, _)| ctx.forest().contains(menu_id.as_str()))
                .map(|(menu_id, permission)| json!({ "menuId": menu_id, "permission": permission }))
                .collect();
            json!(rows)
        }
        ("permissions", [menu]) => json!({
            "menuId": menu,
            "permission": service.permissions_for(&user, menu)?,
        }),
        ("check", [menu, capability]) => {
            let capability: Capability = capability.parse()?;
            json!({
                "menuId": menu,
                "capability": capability,
                "granted": service.has_access(&user, menu, capability)?,
            })
        }
        ("explain", [menu, capability]) => {
            let capability: Capability = capability.parse()?;
            serde_json::to_value(service.explain_access(&user, menu, capability)?)?
        }
        ("search", criteria) => {
            let query = search_query(criteria)?;
            serde_json::to_value(service.search_with_permissions(&user, &query)?.to_tree())?
        }
        _ => bail!(USAGE),
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// `[title] [--target <path>]`, in that order.
fn search_query(criteria: &[String]) -> Result<MenuQuery> {
    let (title, target) = match criteria {
        [] => (None, None),
        [flag, path] if flag == "--target" => (None, Some(path)),
        [title] if title != "--target" => (Some(title), None),
        [title, flag, path] if flag == "--target" => (Some(title), Some(path)),
        _ => bail!(USAGE),
    };
    Ok(MenuQuery {
        title: title.cloned(),
        target: target.cloned(),
    })
}
