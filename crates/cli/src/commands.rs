//! Subcommand dispatch onto the keyword library
//!
//! Every command produces a JSON value; `main` writes it to stdout.

use std::io::Write;

use graphkit_domain::{GraphError, NewCalendarEvent, PermissionBundle, Result};
use graphkit_infra::MsGraph;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::cli::{Command, NewEventArgs};
use crate::pending;

/// Configure the client from the loaded settings when the library could not
/// do it on its own (public clients have no secret).
pub async fn ensure_configured(graph: &mut MsGraph) -> Result<()> {
    if graph.is_configured() {
        return Ok(());
    }

    let auth = graph.config().auth.clone();
    if let Some(client_id) = auth.client_id {
        let secret = auth.client_secret.unwrap_or_default();
        graph
            .configure_msgraph_client(&client_id, &secret, None, Some(&auth.redirect_uri))
            .await?;
    } else {
        debug!("no client id available, running unconfigured");
    }
    Ok(())
}

pub async fn execute(command: Command, graph: &mut MsGraph) -> Result<Value> {
    match command {
        Command::Configure { refresh_token } => {
            let auth = graph.config().auth.clone();
            let client_id = auth.client_id.ok_or_else(|| {
                GraphError::Config("a client id is required (--client-id or GRAPHKIT_CLIENT_ID)".into())
            })?;
            let secret = auth.client_secret.unwrap_or_default();
            let refreshed = graph
                .configure_msgraph_client(
                    &client_id,
                    &secret,
                    refresh_token.as_deref(),
                    Some(&auth.redirect_uri),
                )
                .await?;
            Ok(json!({ "configured": true, "refresh_token": refreshed }))
        }
        Command::AuthUrl { scope } => {
            let url = authorization_url(graph, scope).await?;
            if let Some(challenge) = graph.pending_login().await? {
                pending::save(&pending::pending_path(&graph.config().storage), &challenge).await?;
            }
            Ok(json!({ "url": url }))
        }
        Command::Authorize { redirect_url } => {
            if graph.is_configured() {
                let path = pending::pending_path(&graph.config().storage);
                if let Some(challenge) = pending::take(&path).await? {
                    graph.resume_login(challenge).await?;
                }
            }
            let refresh_token = graph.authorize_and_get_token(&redirect_url).await?;
            Ok(json!({ "authenticated": true, "refresh_token": refresh_token }))
        }
        Command::Login { scope } => {
            let url = authorization_url(graph, scope).await?;
            let redirect_url = prompt_redirect(&url).await?;
            let refresh_token = graph.authorize_and_get_token(&redirect_url).await?;
            Ok(json!({ "authenticated": true, "refresh_token": refresh_token }))
        }
        Command::Refresh { token } => {
            let refresh_token = graph.refresh_oauth_token(token.as_deref()).await?;
            Ok(json!({ "refresh_token": refresh_token }))
        }
        Command::Me => to_json(&graph.get_me().await?),
        Command::Users { query, resource } => {
            to_json(&graph.search_for_users(&query, resource.as_deref()).await?)
        }
        Command::Ls { folder } => to_json(&graph.list_files_in_onedrive_folder(&folder).await?),
        Command::Download { path, to, name } => {
            let written = graph.download_file_from_onedrive(&path, &to, name.as_deref()).await?;
            Ok(json!({ "path": written.display().to_string() }))
        }
        Command::Upload { file, folder } => {
            to_json(&graph.upload_file_to_onedrive(&file, &folder).await?)
        }
        Command::Find { query } => to_json(&graph.find_onedrive_file(&query).await?),
        Command::Site { hostname, path } => {
            to_json(&graph.get_sharepoint_site(&hostname, path.as_deref()).await?)
        }
        Command::Sites { query } => to_json(&graph.search_for_sharepoint_sites(&query).await?),
        Command::Lists { site_id } => to_json(&graph.get_sharepoint_site_lists(&site_id).await?),
        Command::ListItems { site_id, list_id } => {
            to_json(&graph.get_sharepoint_list_items(&site_id, &list_id).await?)
        }
        Command::SiteFiles { site_id, folder } => {
            to_json(&graph.list_files_in_sharepoint_site_drive(&site_id, &folder).await?)
        }
        Command::Events { start, end } => {
            to_json(&graph.list_calendar_events(start, end).await?)
        }
        Command::CreateEvent(args) => {
            to_json(&graph.create_calendar_event(&new_event(args)).await?)
        }
        Command::DeleteEvent { id } => {
            graph.delete_calendar_event(&id).await?;
            Ok(json!({ "deleted": id }))
        }
        Command::Logout => {
            graph.logout().await?;
            Ok(json!({ "logged_out": true }))
        }
    }
}

async fn authorization_url(graph: &mut MsGraph, scope: PermissionBundle) -> Result<String> {
    graph.generate_oauth_authorization_url(None, None, None, scope).await
}

/// Show the authorization URL on stderr and read the redirect URL from stdin.
async fn prompt_redirect(url: &str) -> Result<String> {
    {
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "Open this URL in a browser and sign in:\n\n{url}\n")
            .and_then(|()| write!(stderr, "Paste the URL you were redirected to: "))
            .and_then(|()| stderr.flush())
            .map_err(prompt_error)?;
    }

    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await.map_err(prompt_error)?;

    let redirect_url = line.trim();
    if redirect_url.is_empty() {
        return Err(GraphError::InvalidInput("no redirect URL entered".into()));
    }
    Ok(redirect_url.to_string())
}

fn prompt_error(err: std::io::Error) -> GraphError {
    GraphError::Internal(format!("terminal I/O failed: {err}"))
}

fn new_event(args: NewEventArgs) -> NewCalendarEvent {
    let mut event = NewCalendarEvent::new(args.subject, args.start, args.end).online(args.online);
    if let Some(body) = args.body {
        event = event.with_body(body);
    }
    if let Some(location) = args.location {
        event = event.with_location(location);
    }
    args.attendees.into_iter().fold(event, NewCalendarEvent::with_attendee)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    serde_json::to_value(value)
        .map_err(|err| GraphError::Internal(format!("failed to serialize output: {err}")))
}
