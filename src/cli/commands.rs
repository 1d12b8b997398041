use crate::app::{AppContext, Result, SmartmarkError, ValidationError};
use crate::view::{BookmarkView, ViewMode};

fn require_login(view: &BookmarkView) -> Result<()> {
    match view.mode() {
        ViewMode::Authenticated { .. } => Ok(()),
        _ => Err(ValidationError::NotLoggedIn.into()),
    }
}

pub async fn login(ctx: &AppContext) -> Result<()> {
    let mut view = ctx.mount_view().await;

    let current = match view.mode() {
        ViewMode::Authenticated { identity, .. } => Some(identity.display_email().to_string()),
        _ => None,
    };
    if let Some(email) = current {
        println!("Already logged in as {}", email);
        view.unmount();
        return Ok(());
    }

    println!(
        "Opening your browser to sign in with {}...",
        view.options().provider.display_name()
    );
    let signed_in = view.login().await;
    view.process_pending_events().await;

    let result = match (signed_in, view.mode()) {
        (Err(e), _) => Err(e),
        (Ok(()), ViewMode::Authenticated { identity, .. }) => {
            println!("Logged in as {}", identity.display_email());
            Ok(())
        }
        (Ok(()), _) => Err(SmartmarkError::Auth("sign-in did not produce a session".into())),
    };
    view.unmount();
    result
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    let mut view = ctx.mount_view().await;
    view.logout().await;
    println!("Logged out");
    view.unmount();
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    let view = ctx.mount_view().await;
    match view.mode() {
        ViewMode::Authenticated { identity, .. } => {
            println!("{} ({})", identity.display_email(), identity.id)
        }
        _ => println!("Not logged in"),
    }
    view.unmount();
    Ok(())
}

pub async fn list(ctx: &AppContext) -> Result<()> {
    let view = ctx.mount_view().await;
    require_login(&view)?;

    let bookmarks = &view.state().bookmarks;
    if bookmarks.is_empty() {
        println!("No bookmarks yet");
    }
    for bookmark in bookmarks {
        println!(
            "{}  {}  {}",
            bookmark.id,
            bookmark.created_at.format("%Y-%m-%d %H:%M"),
            bookmark.url
        );
    }
    view.unmount();
    Ok(())
}

pub async fn add(ctx: &AppContext, url: &str) -> Result<()> {
    let mut view = ctx.mount_view().await;
    view.set_input(url);

    let result = view
        .add_bookmark()
        .await
        .map_err(|alert| SmartmarkError::Other(alert.to_string()));
    if result.is_ok() {
        println!("Added {}", url.trim());
    }
    view.unmount();
    result
}

pub async fn delete(ctx: &AppContext, id: &str) -> Result<()> {
    let mut view = ctx.mount_view().await;
    let result = delete_from(&mut view, id).await;
    if result.is_ok() {
        println!("Deleted {}", id);
    }
    view.unmount();
    result
}

/// The view only logs store failures, so success is judged by the list
/// before and after the call.
async fn delete_from(view: &mut BookmarkView, id: &str) -> Result<()> {
    require_login(view)?;
    if !view.state().bookmarks.iter().any(|b| b.id == id) {
        return Err(SmartmarkError::Other(format!("Bookmark {} not found", id)));
    }

    view.delete_bookmark(id).await;
    if view.state().bookmarks.iter().any(|b| b.id == id) {
        return Err(SmartmarkError::Other(format!("Failed to delete bookmark {}", id)));
    }
    Ok(())
}
